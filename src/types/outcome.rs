//! Result objects returned to the UI layer

use serde::{Deserialize, Serialize};
use crate::types::{AuthReason, DispatchReason};

/// Result of one PIN verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthOutcome {
    pub success: bool,
    /// Threshold reached; the caller should send an intruder alert
    pub intruder_detected: bool,
    /// Failed attempts counted in the current window (0 after success)
    pub attempts_used: u32,
    pub message: String,
    pub reason: AuthReason,
}

impl AuthOutcome {
    /// PIN accepted
    pub fn accepted() -> Self {
        Self {
            success: true,
            intruder_detected: false,
            attempts_used: 0,
            message: "Login successful.".to_string(),
            reason: AuthReason::A100_PIN_ACCEPTED,
        }
    }

    /// PIN rejected; `attempts` is the post-increment count
    pub fn rejected(attempts: u32, threshold: u32, reason: AuthReason) -> Self {
        if attempts >= threshold {
            Self {
                success: false,
                intruder_detected: true,
                attempts_used: attempts,
                message: "Incorrect PIN. Security alert activated.".to_string(),
                reason: AuthReason::A102_INTRUDER_DETECTED,
            }
        } else {
            Self {
                success: false,
                intruder_detected: false,
                attempts_used: attempts,
                message: format!("Incorrect PIN. Attempt {} of {}.", attempts, threshold),
                reason,
            }
        }
    }

    /// Storage failed mid-verification
    pub fn storage_failure() -> Self {
        Self {
            success: false,
            intruder_detected: false,
            attempts_used: 0,
            message: "Authentication error.".to_string(),
            reason: AuthReason::A200_STORAGE_FAILURE,
        }
    }
}

/// Which transport carried a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// App-scheme deep link
    Primary,
    /// Web link
    Fallback,
}

/// Per-recipient delivery record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    pub contact_id: String,
    pub transport_used: TransportKind,
    pub delivered: bool,
}

/// Result of a dispatch call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub success: bool,
    pub message: String,
    /// One entry per attempted recipient, in insertion order
    pub results: Vec<DeliveryResult>,
    pub reason: DispatchReason,
}

impl DispatchOutcome {
    /// Loop completed; individual failures stay inside `results`
    pub fn dispatched(results: Vec<DeliveryResult>) -> Self {
        Self {
            success: true,
            message: format!("Alert opened for {} contact(s).", results.len()),
            results,
            reason: DispatchReason::D100_DISPATCHED,
        }
    }

    /// Short-circuit with no side effects
    pub fn failure(reason: DispatchReason) -> Self {
        let message = match reason {
            DispatchReason::D201_NO_CONTACTS => "Add emergency contacts first!",
            DispatchReason::D202_NO_INTRUDER_RECIPIENTS => {
                "No contacts are set to receive intruder alerts."
            }
            _ => "Error activating alert.",
        };
        Self {
            success: false,
            message: message.to_string(),
            results: Vec::new(),
            reason,
        }
    }

    /// Recipients whose link actually opened
    pub fn delivered_count(&self) -> usize {
        self.results.iter().filter(|r| r.delivered).count()
    }
}
