//! Alert text construction
//!
//! Pure and deterministic: the timestamp is an input, never read here.
//! Intruder alerts carry neither location nor time.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::types::Location;
use crate::{DEFAULT_MAP_HOST, DEFAULT_UTC_OFFSET_MINUTES};

const SOS_BASE: &str = "🚨 EMERGENCY - I need help NOW!";
const SOS_FOOTER: &str = "⚠️ This is an automatic message from the Guardian app";
const SOS_NO_LOCATION: &str = "⚠️ I couldn't get my location, but I need help!";
const INTRUDER_ALERT: &str = "🚨 SECURITY ALERT - Someone entered the wrong PIN on my Guardian app \
    repeatedly. My phone may be in someone else's hands. Please check on me.";

/// Builds alert message text
#[derive(Debug, Clone)]
pub struct AlertPayloadBuilder {
    map_host: String,
    offset: FixedOffset,
}

impl Default for AlertPayloadBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAP_HOST, DEFAULT_UTC_OFFSET_MINUTES)
    }
}

impl AlertPayloadBuilder {
    /// Offsets outside ±24h fall back to UTC
    pub fn new(map_host: impl Into<String>, utc_offset_minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix());
        Self {
            map_host: map_host.into(),
            offset,
        }
    }

    /// `https://<map-host>/?q=<lat>,<lng>`
    pub fn map_link(&self, location: &Location) -> String {
        format!("https://{}/?q={},{}", self.map_host, location.lat, location.lng)
    }

    /// `dd/mm/yyyy, HH:MM:SS` in the configured offset
    pub fn local_timestamp(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset)
            .format("%d/%m/%Y, %H:%M:%S")
            .to_string()
    }

    /// Distress message, with location clause or the unavailable clause
    pub fn build_sos(&self, location: Option<&Location>, sent_at: DateTime<Utc>) -> String {
        let mut message = String::from(SOS_BASE);
        match location {
            Some(loc) => {
                message.push_str(&format!("\n\n📍 I'm here: {}", self.map_link(loc)));
                message.push_str(&format!("\n⏰ Sent at: {}", self.local_timestamp(sent_at)));
                message.push_str("\n\n");
                message.push_str(SOS_FOOTER);
            }
            None => {
                message.push_str("\n\n");
                message.push_str(SOS_NO_LOCATION);
            }
        }
        message
    }

    /// Fixed warning sentence
    pub fn build_intruder_alert(&self) -> String {
        INTRUDER_ALERT.to_string()
    }
}
