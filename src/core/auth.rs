//! AuthGuard: PIN verification with a windowed failed-attempt counter
//!
//! State transitions (counter):
//! - fresh → counting(1): wrong PIN
//! - counting(n) → counting(n+1): wrong PIN within the window
//! - counting(n) → fresh: correct PIN
//! - counting(n) → fresh: read after the window elapsed (checked on read)
//!
//! Reaching the threshold only flags `intruder_detected`. The account is
//! never locked.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::clock::Clock;
use crate::core::store::{CredentialStore, StoreError};
use crate::types::{
    decode_record, encode_record, is_valid_pin, AuthOutcome, AuthReason, Credential,
    FailureState, NewUser, RecordError,
};
use crate::{
    FAILED_ATTEMPTS_KEY, FAILURE_WINDOW_MS, LAST_FAILED_ATTEMPT_TIME_KEY, MAX_FAILED_ATTEMPTS,
    PIN_KEY, USER_KEY,
};

const SHA256_PREFIX: &str = "sha256:";

/// How the PIN is written to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinStorage {
    /// Compatible with existing installations; the PIN is readable by
    /// anyone who can read the store
    #[default]
    Plaintext,
    /// `sha256:<hex>`
    Sha256,
}

/// Threshold, window and PIN storage policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthPolicy {
    pub threshold: u32,
    pub window_ms: u64,
    pub pin_storage: PinStorage,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            threshold: MAX_FAILED_ATTEMPTS,
            window_ms: FAILURE_WINDOW_MS,
            pin_storage: PinStorage::Plaintext,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("no registered user")]
    UserNotFound,

    #[error("a user is already registered")]
    AlreadyRegistered,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("unreadable credential record: {0}")]
    Record(#[from] RecordError),

    #[error("unreadable failure counter {key}: {value:?}")]
    CorruptCounter { key: &'static str, value: String },
}

/// PIN guard over an injected secret store
pub struct AuthGuard {
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    policy: AuthPolicy,
    /// Serializes read-increment-write of the failure counter
    lock: Mutex<()>,
}

impl AuthGuard {
    pub fn new(store: Arc<dyn CredentialStore>, clock: Arc<dyn Clock>, policy: AuthPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
            lock: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> &AuthPolicy {
        &self.policy
    }

    /// Check a PIN, updating the failure counter
    ///
    /// Storage problems end in a failed outcome with a generic message.
    pub async fn verify(&self, pin: &str) -> AuthOutcome {
        let _guard = self.lock.lock().await;
        match self.verify_locked(pin).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "authentication failed on storage");
                AuthOutcome::storage_failure()
            }
        }
    }

    async fn verify_locked(&self, pin: &str) -> Result<AuthOutcome, AuthError> {
        let saved = self.store.get(PIN_KEY).await?;

        if let Some(saved) = saved.as_deref() {
            if pin_matches(saved, pin) {
                self.clear_failures_locked().await?;
                tracing::info!("PIN accepted");
                return Ok(AuthOutcome::accepted());
            }
        }

        let reason = if saved.is_some() {
            AuthReason::A101_PIN_REJECTED
        } else {
            AuthReason::A103_NO_PIN_REGISTERED
        };
        let attempts = self.record_failure_locked().await?;
        let outcome = AuthOutcome::rejected(attempts, self.policy.threshold, reason);

        if outcome.intruder_detected {
            tracing::warn!(
                attempts,
                threshold = self.policy.threshold,
                "intruder threshold reached"
            );
        } else {
            tracing::info!(
                attempts,
                threshold = self.policy.threshold,
                reason = reason.code(),
                "PIN rejected"
            );
        }
        Ok(outcome)
    }

    /// Failed attempts in the current window; clears expired state
    pub async fn failed_attempts(&self) -> Result<u32, AuthError> {
        let _guard = self.lock.lock().await;
        self.current_count_locked().await
    }

    /// Forget all failed attempts
    pub async fn reset_failed_attempts(&self) -> Result<(), AuthError> {
        let _guard = self.lock.lock().await;
        self.clear_failures_locked().await
    }

    async fn read_failure_state(&self) -> Result<FailureState, AuthError> {
        let count = match self.store.get(FAILED_ATTEMPTS_KEY).await? {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| AuthError::CorruptCounter {
                key: FAILED_ATTEMPTS_KEY,
                value: raw,
            })?,
            None => 0,
        };
        let last_failure_ms = match self.store.get(LAST_FAILED_ATTEMPT_TIME_KEY).await? {
            Some(raw) => Some(raw.trim().parse::<i64>().map_err(|_| {
                AuthError::CorruptCounter {
                    key: LAST_FAILED_ATTEMPT_TIME_KEY,
                    value: raw,
                }
            })?),
            None => None,
        };
        Ok(FailureState { count, last_failure_ms })
    }

    async fn current_count_locked(&self) -> Result<u32, AuthError> {
        let state = self.read_failure_state().await?;
        if state.is_expired(self.clock.now_ms(), self.policy.window_ms) {
            tracing::debug!(stale_count = state.count, "failure window elapsed, counter reset");
            self.clear_failures_locked().await?;
            return Ok(0);
        }
        Ok(state.count)
    }

    async fn record_failure_locked(&self) -> Result<u32, AuthError> {
        let attempts = self.current_count_locked().await?.saturating_add(1);
        self.store
            .set(FAILED_ATTEMPTS_KEY, &attempts.to_string())
            .await?;
        self.store
            .set(LAST_FAILED_ATTEMPT_TIME_KEY, &self.clock.now_ms().to_string())
            .await?;
        Ok(attempts)
    }

    async fn clear_failures_locked(&self) -> Result<(), AuthError> {
        self.store.delete(FAILED_ATTEMPTS_KEY).await?;
        self.store.delete(LAST_FAILED_ATTEMPT_TIME_KEY).await?;
        Ok(())
    }

    // =========================================================================
    // Credential lifecycle
    // =========================================================================

    pub async fn user_exists(&self) -> Result<bool, AuthError> {
        Ok(self.store.get(USER_KEY).await?.is_some())
    }

    /// Create the installation's single credential
    ///
    /// Fails with `AlreadyRegistered` while a user exists; `clear_all_data`
    /// must run first. Failure state left from before registration is dropped.
    pub async fn register_user(&self, user: NewUser) -> Result<Credential, AuthError> {
        if let Some(problem) = user.validation_error() {
            return Err(AuthError::InvalidInput(problem));
        }

        let stored_pin = encode_pin(self.policy.pin_storage, &user.pin);
        let credential = Credential {
            name: user.name.trim().to_string(),
            email: user.email.trim().to_string(),
            phone: user.phone.trim().to_string(),
            pin: stored_pin.clone(),
            created_at: self.clock.now(),
        };

        let _guard = self.lock.lock().await;
        if self.store.get(USER_KEY).await?.is_some() {
            tracing::warn!("registration refused, a user already exists");
            return Err(AuthError::AlreadyRegistered);
        }
        self.clear_failures_locked().await?;
        self.store.set(USER_KEY, &encode_record(&credential)?).await?;
        self.store.set(PIN_KEY, &stored_pin).await?;
        tracing::info!(name = %credential.name, "user registered");
        Ok(credential)
    }

    pub async fn user_data(&self) -> Result<Option<Credential>, AuthError> {
        match self.store.get(USER_KEY).await? {
            Some(raw) => Ok(Some(decode_record(&raw)?)),
            None => Ok(None),
        }
    }

    /// Replace the PIN of the registered user
    pub async fn update_pin(&self, new_pin: &str) -> Result<(), AuthError> {
        if !is_valid_pin(new_pin) {
            return Err(AuthError::InvalidInput("PIN must be exactly 4 digits"));
        }

        let _guard = self.lock.lock().await;
        let mut credential = self.user_data().await?.ok_or(AuthError::UserNotFound)?;
        let stored_pin = encode_pin(self.policy.pin_storage, new_pin);
        credential.pin = stored_pin.clone();

        self.store.set(USER_KEY, &encode_record(&credential)?).await?;
        self.store.set(PIN_KEY, &stored_pin).await?;
        tracing::info!("PIN updated");
        Ok(())
    }

    /// Registered credential whose email matches, ignoring case
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, AuthError> {
        let wanted = email.trim().to_lowercase();
        Ok(self
            .user_data()
            .await?
            .filter(|c| c.email.to_lowercase() == wanted))
    }

    /// Remove credential, PIN and failure counter together
    pub async fn clear_all_data(&self) -> Result<(), AuthError> {
        let _guard = self.lock.lock().await;
        self.store.delete(USER_KEY).await?;
        self.store.delete(PIN_KEY).await?;
        self.clear_failures_locked().await?;
        tracing::info!("all credential data removed");
        Ok(())
    }
}

/// Encode a PIN for storage under the given policy
pub fn encode_pin(storage: PinStorage, pin: &str) -> String {
    match storage {
        PinStorage::Plaintext => pin.to_string(),
        PinStorage::Sha256 => format!("{}{}", SHA256_PREFIX, sha256_hex(pin)),
    }
}

/// Compare a candidate against a stored PIN of either format
pub fn pin_matches(stored: &str, candidate: &str) -> bool {
    match stored.strip_prefix(SHA256_PREFIX) {
        Some(hex) => sha256_hex(candidate) == hex,
        None => stored == candidate,
    }
}

fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect()
}

// =============================================================================
// TESTS
// =============================================================================
