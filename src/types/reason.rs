//! Reason codes attached to auth and dispatch outcomes

use serde::{Deserialize, Serialize};

/// Why a PIN verification ended the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum AuthReason {
    // =========================================================================
    // A100: Verification
    // =========================================================================
    /// PIN matched, failure counter cleared
    A100_PIN_ACCEPTED,
    /// PIN did not match, below threshold
    A101_PIN_REJECTED,
    /// PIN did not match, threshold reached
    A102_INTRUDER_DETECTED,
    /// No PIN registered on this installation
    A103_NO_PIN_REGISTERED,

    // =========================================================================
    // A200: Storage
    // =========================================================================
    /// Secret store read or write failed
    A200_STORAGE_FAILURE,
}

impl AuthReason {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::A100_PIN_ACCEPTED => "A100_PIN_ACCEPTED",
            Self::A101_PIN_REJECTED => "A101_PIN_REJECTED",
            Self::A102_INTRUDER_DETECTED => "A102_INTRUDER_DETECTED",
            Self::A103_NO_PIN_REGISTERED => "A103_NO_PIN_REGISTERED",
            Self::A200_STORAGE_FAILURE => "A200_STORAGE_FAILURE",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::A100_PIN_ACCEPTED => "PIN accepted",
            Self::A101_PIN_REJECTED => "PIN rejected",
            Self::A102_INTRUDER_DETECTED => "Failure threshold reached",
            Self::A103_NO_PIN_REGISTERED => "No PIN registered",
            Self::A200_STORAGE_FAILURE => "Secret store failure",
        }
    }
}

impl std::fmt::Display for AuthReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}

/// Why a dispatch ended the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum DispatchReason {
    /// Loop ran over every recipient
    D100_DISPATCHED,
    /// Contact directory is empty
    D201_NO_CONTACTS,
    /// Nobody opted into intruder alerts
    D202_NO_INTRUDER_RECIPIENTS,
    /// Contact directory could not be read
    D300_STORAGE_FAILURE,
}

impl DispatchReason {
    /// Get code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::D100_DISPATCHED => "D100_DISPATCHED",
            Self::D201_NO_CONTACTS => "D201_NO_CONTACTS",
            Self::D202_NO_INTRUDER_RECIPIENTS => "D202_NO_INTRUDER_RECIPIENTS",
            Self::D300_STORAGE_FAILURE => "D300_STORAGE_FAILURE",
        }
    }

    /// Get description
    pub fn description(&self) -> &'static str {
        match self {
            Self::D100_DISPATCHED => "Alert handed to every recipient",
            Self::D201_NO_CONTACTS => "No emergency contacts configured",
            Self::D202_NO_INTRUDER_RECIPIENTS => "No contact opted into intruder alerts",
            Self::D300_STORAGE_FAILURE => "Contact directory unreadable",
        }
    }

    /// Is this a success code?
    pub fn is_success(&self) -> bool {
        matches!(self, Self::D100_DISPATCHED)
    }
}

impl std::fmt::Display for DispatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
