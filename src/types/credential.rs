//! Credential and failure-counter records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PIN_LENGTH;

/// The single registered user of this installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Stored PIN, plaintext or `sha256:<hex>` depending on policy
    pub pin: String,
    pub created_at: DateTime<Utc>,
}

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub pin: String,
}

impl NewUser {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        pin: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            pin: pin.into(),
        }
    }

    /// First validation problem, if any
    pub fn validation_error(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some("name is required");
        }
        if self.email.trim().is_empty() {
            return Some("email is required");
        }
        if !self.email.contains('@') {
            return Some("email is not valid");
        }
        if self.phone.trim().is_empty() {
            return Some("phone is required");
        }
        if !is_valid_pin(&self.pin) {
            return Some("PIN must be exactly 4 digits");
        }
        None
    }
}

/// PIN format check: exactly `PIN_LENGTH` ASCII digits
pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit())
}

/// Failed login counter as read from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FailureState {
    pub count: u32,
    /// Epoch milliseconds of the last failure
    pub last_failure_ms: Option<i64>,
}

impl FailureState {
    /// Has the window since the last failure elapsed at `now_ms`?
    ///
    /// Strictly greater: a failure exactly one window old still counts.
    pub fn is_expired(&self, now_ms: i64, window_ms: u64) -> bool {
        let window_ms = i64::try_from(window_ms).unwrap_or(i64::MAX);
        match self.last_failure_ms {
            Some(last) => now_ms.saturating_sub(last) > window_ms,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_format() {
        assert!(is_valid_pin("1234"));
        assert!(is_valid_pin("0000"));
        assert!(!is_valid_pin("123"));
        assert!(!is_valid_pin("12345"));
        assert!(!is_valid_pin("12a4"));
        assert!(!is_valid_pin("١٢٣٤")); // non-ASCII digits
    }

    #[test]
    fn test_new_user_validation() {
        let ok = NewUser::new("Ana", "ana@example.com", "51 99999-0000", "1234");
        assert_eq!(ok.validation_error(), None);

        let no_name = NewUser::new("  ", "ana@example.com", "51", "1234");
        assert_eq!(no_name.validation_error(), Some("name is required"));

        let bad_email = NewUser::new("Ana", "ana.example.com", "51", "1234");
        assert_eq!(bad_email.validation_error(), Some("email is not valid"));

        let bad_pin = NewUser::new("Ana", "ana@example.com", "51", "12");
        assert_eq!(bad_pin.validation_error(), Some("PIN must be exactly 4 digits"));
    }

    #[test]
    fn test_window_expiry_is_strict() {
        let state = FailureState { count: 1, last_failure_ms: Some(1_000) };
        assert!(!state.is_expired(1_000 + 300_000, 300_000));
        assert!(state.is_expired(1_000 + 300_001, 300_000));
        assert!(!FailureState::default().is_expired(i64::MAX, 300_000));
    }

    #[test]
    fn test_huge_window_never_expires() {
        let state = FailureState { count: 1, last_failure_ms: Some(1_000) };
        assert!(!state.is_expired(i64::MAX, u64::MAX));
        assert!(!state.is_expired(1_000 + 300_001, i64::MAX as u64 + 1));
    }
}
