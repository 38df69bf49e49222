//! Integration tests for the dispatch pipeline
//!
//! Contacts → location → payload → paced delivery, against in-memory fakes

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use guardian::core::{
    ContactDirectory, CredentialStore, DispatchConfig, DispatchPipeline, FixedLocation,
    LinkOpener, LocationError, LocationProvider, ManualClock, MemoryStore, NoLocation,
    StoreError, TransportError,
};
use guardian::types::{DispatchReason, Location, NewContact, TransportKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Location fake that counts calls
struct CountingLocation {
    calls: AtomicUsize,
    fix: Option<Location>,
}

impl CountingLocation {
    fn new(fix: Option<Location>) -> Self {
        Self { calls: AtomicUsize::new(0), fix }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationProvider for CountingLocation {
    async fn current_location(&self) -> Result<Location, LocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fix.ok_or(LocationError::PermissionDenied)
    }
}

/// Opener fake recording every URL with the (tokio) time it was opened
struct RecordingOpener {
    scheme_available: bool,
    /// Phone fragments whose open call fails
    failing: Vec<String>,
    opened: Mutex<Vec<(String, Instant)>>,
}

impl RecordingOpener {
    fn new(scheme_available: bool) -> Self {
        Self { scheme_available, failing: Vec::new(), opened: Mutex::new(Vec::new()) }
    }

    fn failing_for(mut self, phone_digits: &str) -> Self {
        self.failing.push(phone_digits.to_string());
        self
    }

    fn opened(&self) -> Vec<(String, Instant)> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl LinkOpener for RecordingOpener {
    async fn can_open(&self, url: &str) -> bool {
        self.scheme_available || url.starts_with("https://")
    }

    async fn open(&self, url: &str) -> Result<(), TransportError> {
        self.opened.lock().unwrap().push((url.to_string(), Instant::now()));
        if self.failing.iter().any(|p| url.contains(p.as_str())) {
            return Err(TransportError::OpenFailed(url.to_string()));
        }
        Ok(())
    }
}

/// Store whose every call fails
struct BrokenStore;

#[async_trait]
impl CredentialStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("keychain locked".to_string()))
    }
    async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("keychain locked".to_string()))
    }
    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("keychain locked".to_string()))
    }
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 17, 30, 5).unwrap()))
}

async fn directory_with(contacts: &[(&str, &str, bool)]) -> Arc<ContactDirectory> {
    let directory = Arc::new(ContactDirectory::new(Arc::new(MemoryStore::new()), clock()));
    for (name, phone, intruder) in contacts {
        directory.add(NewContact::new(*name, *phone), *intruder).await.unwrap();
    }
    directory
}

fn config(pacing_ms: u64) -> DispatchConfig {
    DispatchConfig { pacing_ms, ..DispatchConfig::default() }
}

#[tokio::test]
async fn test_sos_with_no_contacts_never_asks_for_location() {
    let location = Arc::new(CountingLocation::new(Some(Location::new(1.0, 2.0))));
    let opener = Arc::new(RecordingOpener::new(true));
    let pipeline = DispatchPipeline::new(
        directory_with(&[]).await,
        location.clone(),
        opener.clone(),
        clock(),
        &config(0),
    );

    let outcome = pipeline.send_emergency_alert().await;

    assert!(!outcome.success);
    assert_eq!(outcome.reason, DispatchReason::D201_NO_CONTACTS);
    assert!(outcome.results.is_empty());
    assert_eq!(location.calls(), 0);
    assert!(opener.opened().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_sos_delivers_in_order_with_pacing() {
    let location = Arc::new(CountingLocation::new(Some(Location::new(1.0, 2.0))));
    let opener = Arc::new(RecordingOpener::new(true));
    let directory =
        directory_with(&[("A", "51 1111-1111", true), ("B", "51 2222-2222", false)]).await;
    let ids: Vec<String> = directory.list().await.unwrap().into_iter().map(|c| c.id).collect();

    let pipeline = DispatchPipeline::new(
        directory,
        location.clone(),
        opener.clone(),
        clock(),
        &config(1_000),
    );
    let outcome = pipeline.send_emergency_alert().await;

    assert!(outcome.success);
    assert_eq!(location.calls(), 1);
    assert_eq!(
        outcome.results.iter().map(|r| r.contact_id.clone()).collect::<Vec<_>>(),
        ids
    );

    let opened = opener.opened();
    assert_eq!(opened.len(), 2);
    assert!(opened[0].0.contains("phone=555111111111"));
    assert!(opened[1].0.contains("phone=555122222222"));
    assert!(opened[1].1.duration_since(opened[0].1) >= Duration::from_secs(1));
    assert!(opened[0].0.contains(&*urlencoding::encode("https://maps.google.com/?q=1,2")));
}

#[tokio::test]
async fn test_sos_location_denied_still_succeeds() {
    let location = Arc::new(CountingLocation::new(None));
    let opener = Arc::new(RecordingOpener::new(true));
    let pipeline = DispatchPipeline::new(
        directory_with(&[("A", "511", true)]).await,
        location.clone(),
        opener.clone(),
        clock(),
        &config(0),
    );

    let outcome = pipeline.send_emergency_alert().await;
    assert!(outcome.success);
    assert_eq!(location.calls(), 1);
    assert!(!opener.opened()[0].0.contains("maps.google.com"));
}

#[tokio::test]
async fn test_failed_recipient_does_not_abort_batch() {
    let opener = Arc::new(RecordingOpener::new(true).failing_for("55511"));
    let pipeline = DispatchPipeline::new(
        directory_with(&[("A", "511", true), ("B", "522", true), ("C", "533", true)]).await,
        Arc::new(NoLocation),
        opener.clone(),
        clock(),
        &config(0),
    );

    let outcome = pipeline.send_emergency_alert().await;

    assert!(outcome.success);
    assert_eq!(outcome.results.len(), 3);
    assert_eq!(
        outcome.results.iter().map(|r| r.delivered).collect::<Vec<_>>(),
        vec![false, true, true]
    );
    assert_eq!(outcome.delivered_count(), 2);
    assert_eq!(outcome.message, "Alert opened for 3 contact(s).");
}

#[tokio::test]
async fn test_web_fallback_when_app_missing() {
    let opener = Arc::new(RecordingOpener::new(false));
    let pipeline = DispatchPipeline::new(
        directory_with(&[("A", "(51) 98533-0121", true)]).await,
        Arc::new(NoLocation),
        opener.clone(),
        clock(),
        &config(0),
    );

    let outcome = pipeline.send_intruder_alert().await;

    assert_eq!(outcome.results[0].transport_used, TransportKind::Fallback);
    assert!(opener.opened()[0].0.starts_with("https://wa.me/5551985330121?text="));
}

#[tokio::test]
async fn test_intruder_opted_out_only_sends_nothing() {
    let location = Arc::new(CountingLocation::new(Some(Location::new(1.0, 2.0))));
    let opener = Arc::new(RecordingOpener::new(true));
    let pipeline = DispatchPipeline::new(
        directory_with(&[("A", "511", false)]).await,
        location.clone(),
        opener.clone(),
        clock(),
        &config(0),
    );

    let outcome = pipeline.send_intruder_alert().await;

    assert!(!outcome.success);
    assert_eq!(outcome.reason, DispatchReason::D202_NO_INTRUDER_RECIPIENTS);
    assert!(opener.opened().is_empty());
    assert_eq!(location.calls(), 0);
}

#[tokio::test]
async fn test_intruder_opted_in_sends_once_without_location() {
    let location = Arc::new(CountingLocation::new(Some(Location::new(1.0, 2.0))));
    let opener = Arc::new(RecordingOpener::new(true));
    let pipeline = DispatchPipeline::new(
        directory_with(&[("A", "511", true)]).await,
        location.clone(),
        opener.clone(),
        clock(),
        &config(0),
    );

    let outcome = pipeline.send_intruder_alert().await;

    assert!(outcome.success);
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(location.calls(), 0);
    let opened = opener.opened();
    assert_eq!(opened.len(), 1);
    assert!(!opened[0].0.contains("maps"));
}

#[tokio::test]
async fn test_storage_failure_is_reported_not_raised() {
    let location = Arc::new(CountingLocation::new(Some(Location::new(1.0, 2.0))));
    let directory = Arc::new(ContactDirectory::new(Arc::new(BrokenStore), clock()));
    let pipeline = DispatchPipeline::new(
        directory,
        location.clone(),
        Arc::new(RecordingOpener::new(true)),
        clock(),
        &config(0),
    );

    let outcome = pipeline.send_emergency_alert().await;
    assert!(!outcome.success);
    assert_eq!(outcome.reason, DispatchReason::D300_STORAGE_FAILURE);
    assert_eq!(location.calls(), 0);

    let outcome = pipeline.send_intruder_alert().await;
    assert_eq!(outcome.reason, DispatchReason::D300_STORAGE_FAILURE);
}

#[tokio::test]
async fn test_dispatch_does_not_touch_contacts() {
    let directory = directory_with(&[("A", "511", true), ("B", "522", false)]).await;
    let before = directory.list().await.unwrap();

    let pipeline = DispatchPipeline::new(
        directory.clone(),
        Arc::new(FixedLocation(Location::new(3.0, 4.0))),
        Arc::new(RecordingOpener::new(true)),
        clock(),
        &config(0),
    );
    pipeline.send_emergency_alert().await;
    pipeline.send_intruder_alert().await;

    assert_eq!(directory.list().await.unwrap(), before);
}
