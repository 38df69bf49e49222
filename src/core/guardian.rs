//! Guardian: wires the guard to the pipeline
//!
//! A login that reaches the failure threshold sends the intruder alert.
//! The pipeline itself knows nothing about authentication.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::auth::AuthGuard;
use crate::core::clock::Clock;
use crate::core::config::GuardianConfig;
use crate::core::contacts::ContactDirectory;
use crate::core::dispatch::DispatchPipeline;
use crate::core::location::LocationProvider;
use crate::core::store::CredentialStore;
use crate::core::transport::LinkOpener;
use crate::types::{AuthOutcome, DispatchOutcome};

/// Login result plus the alert it triggered, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub auth: AuthOutcome,
    pub intruder_alert: Option<DispatchOutcome>,
}

pub struct Guardian {
    auth: Arc<AuthGuard>,
    contacts: Arc<ContactDirectory>,
    dispatch: Arc<DispatchPipeline>,
}

impl Guardian {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        location: Arc<dyn LocationProvider>,
        opener: Arc<dyn LinkOpener>,
        clock: Arc<dyn Clock>,
        config: &GuardianConfig,
    ) -> Self {
        let auth = Arc::new(AuthGuard::new(store.clone(), clock.clone(), config.auth.clone()));
        let contacts = Arc::new(ContactDirectory::new(store, clock.clone()));
        let dispatch = Arc::new(DispatchPipeline::new(
            contacts.clone(),
            location,
            opener,
            clock,
            &config.dispatch,
        ));
        Self {
            auth,
            contacts,
            dispatch,
        }
    }

    pub fn auth(&self) -> &AuthGuard {
        &self.auth
    }

    pub fn contacts(&self) -> &ContactDirectory {
        &self.contacts
    }

    pub fn dispatch(&self) -> &DispatchPipeline {
        &self.dispatch
    }

    /// Verify the PIN; on threshold breach, alert opted-in contacts
    pub async fn login(&self, pin: &str) -> LoginResult {
        let auth = self.auth.verify(pin).await;
        let intruder_alert = if auth.intruder_detected {
            Some(self.dispatch.send_intruder_alert().await)
        } else {
            None
        };
        LoginResult {
            auth,
            intruder_alert,
        }
    }

    pub async fn send_emergency_alert(&self) -> DispatchOutcome {
        self.dispatch.send_emergency_alert().await
    }

    pub async fn send_intruder_alert(&self) -> DispatchOutcome {
        self.dispatch.send_intruder_alert().await
    }
}
