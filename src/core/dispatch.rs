//! DispatchPipeline: best-effort alert fan-out
//!
//! Order of operations for SOS:
//! 1. contacts (empty → stop, location never requested)
//! 2. location, bounded by a timeout, optional
//! 3. payload
//! 4. sequential delivery with a pause between recipients
//!
//! One recipient failing never stops the others.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::core::clock::Clock;
use crate::core::contacts::ContactDirectory;
use crate::core::location::LocationProvider;
use crate::core::payload::AlertPayloadBuilder;
use crate::core::transport::{deliver, LinkBuilder, LinkOpener};
use crate::types::{AlertEvent, Contact, DispatchOutcome, DispatchReason, Location};
use crate::{
    DEFAULT_COUNTRY_CODE, DEFAULT_DEEP_LINK_SCHEME, DEFAULT_MAP_HOST, DEFAULT_UTC_OFFSET_MINUTES,
    DEFAULT_WEB_HOST, LOCATION_TIMEOUT_MS, PACING_MS,
};

/// Transport, timing and text settings for dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub location_timeout_ms: u64,
    /// Pause between recipients; 0 in tests
    pub pacing_ms: u64,
    pub country_code: String,
    pub deep_link_scheme: String,
    pub web_host: String,
    pub map_host: String,
    pub utc_offset_minutes: i32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            location_timeout_ms: LOCATION_TIMEOUT_MS,
            pacing_ms: PACING_MS,
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            deep_link_scheme: DEFAULT_DEEP_LINK_SCHEME.to_string(),
            web_host: DEFAULT_WEB_HOST.to_string(),
            map_host: DEFAULT_MAP_HOST.to_string(),
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
        }
    }
}

impl DispatchConfig {
    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location_timeout_ms)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn link_builder(&self) -> LinkBuilder {
        LinkBuilder {
            scheme: self.deep_link_scheme.clone(),
            web_host: self.web_host.clone(),
            country_code: self.country_code.clone(),
        }
    }

    pub fn payload_builder(&self) -> AlertPayloadBuilder {
        AlertPayloadBuilder::new(self.map_host.clone(), self.utc_offset_minutes)
    }
}

/// Alert dispatcher; reads contacts, never writes them
pub struct DispatchPipeline {
    contacts: Arc<ContactDirectory>,
    location: Arc<dyn LocationProvider>,
    opener: Arc<dyn LinkOpener>,
    clock: Arc<dyn Clock>,
    links: LinkBuilder,
    payloads: AlertPayloadBuilder,
    location_timeout: Duration,
    pacing: Duration,
}

impl DispatchPipeline {
    pub fn new(
        contacts: Arc<ContactDirectory>,
        location: Arc<dyn LocationProvider>,
        opener: Arc<dyn LinkOpener>,
        clock: Arc<dyn Clock>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            contacts,
            location,
            opener,
            clock,
            links: config.link_builder(),
            payloads: config.payload_builder(),
            location_timeout: config.location_timeout(),
            pacing: config.pacing(),
        }
    }

    /// SOS to every contact, with location when available
    pub async fn send_emergency_alert(&self) -> DispatchOutcome {
        tracing::warn!("emergency alert activated");

        let contacts = match self.contacts.list().await {
            Ok(contacts) => contacts,
            Err(e) => {
                tracing::error!(error = %e, "could not read contacts for SOS");
                return DispatchOutcome::failure(DispatchReason::D300_STORAGE_FAILURE);
            }
        };
        if contacts.is_empty() {
            tracing::warn!("no emergency contacts configured");
            return DispatchOutcome::failure(DispatchReason::D201_NO_CONTACTS);
        }

        let location = self.fetch_location().await;
        let event = AlertEvent::sos(self.clock.now(), location);
        let message = self.payloads.build_sos(event.location.as_ref(), event.timestamp);

        let outcome = self.deliver_all(&contacts, &message).await;
        tracing::info!(
            kind = %event.kind,
            recipients = outcome.results.len(),
            delivered = outcome.delivered_count(),
            has_location = event.location.is_some(),
            "emergency alert dispatched"
        );
        outcome
    }

    /// Intruder warning to opted-in contacts; no location lookup
    pub async fn send_intruder_alert(&self) -> DispatchOutcome {
        tracing::warn!("intruder alert activated");

        let recipients = match self.contacts.intruder_recipients().await {
            Ok(recipients) => recipients,
            Err(e) => {
                tracing::error!(error = %e, "could not read contacts for intruder alert");
                return DispatchOutcome::failure(DispatchReason::D300_STORAGE_FAILURE);
            }
        };
        if recipients.is_empty() {
            tracing::warn!("no contacts opted into intruder alerts");
            return DispatchOutcome::failure(DispatchReason::D202_NO_INTRUDER_RECIPIENTS);
        }

        let event = AlertEvent::intruder(self.clock.now());
        let message = self.payloads.build_intruder_alert();

        let outcome = self.deliver_all(&recipients, &message).await;
        tracing::info!(
            kind = %event.kind,
            recipients = outcome.results.len(),
            delivered = outcome.delivered_count(),
            "intruder alert dispatched"
        );
        outcome
    }

    /// Location or `None`; denial, error and timeout all degrade the same way
    async fn fetch_location(&self) -> Option<Location> {
        match tokio::time::timeout(self.location_timeout, self.location.current_location()).await {
            Ok(Ok(loc)) => {
                tracing::debug!(lat = loc.lat, lng = loc.lng, "location acquired");
                Some(loc)
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "location unavailable, sending without it");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.location_timeout.as_millis() as u64,
                    "location timed out, sending without it"
                );
                None
            }
        }
    }

    /// Sequential on purpose: the pause must sit between recipients
    async fn deliver_all(&self, recipients: &[Contact], message: &str) -> DispatchOutcome {
        let mut results = Vec::with_capacity(recipients.len());
        for (i, contact) in recipients.iter().enumerate() {
            if i > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
            results.push(deliver(self.opener.as_ref(), &self.links, contact, message).await);
        }
        DispatchOutcome::dispatched(results)
    }
}
