//! Alert events and locations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which alert is being dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    /// Distress call, goes to every contact, may carry location
    Sos,
    /// Repeated wrong PIN, goes to opted-in contacts only, never carries location
    Intruder,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AlertKind::Sos => "SOS",
            AlertKind::Intruder => "INTRUDER",
        };
        write!(f, "{}", name)
    }
}

/// A coordinate fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// One dispatch, never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub timestamp: DateTime<Utc>,
    pub location: Option<Location>,
}

impl AlertEvent {
    pub fn sos(timestamp: DateTime<Utc>, location: Option<Location>) -> Self {
        Self {
            kind: AlertKind::Sos,
            timestamp,
            location,
        }
    }

    /// Intruder events never hold a location
    pub fn intruder(timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: AlertKind::Intruder,
            timestamp,
            location: None,
        }
    }
}
