//! Emergency contact records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A trusted person who receives alerts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Unique, stable identifier (`contact_<epoch-ms>`)
    pub id: String,
    pub name: String,
    /// Phone as entered; normalized only when a link is built
    pub phone: String,
    pub added_at: DateTime<Utc>,
    /// Opt-in for intruder alerts. Records written before the flag existed
    /// decode as opted in.
    #[serde(default = "default_receive_intruder_alert")]
    pub receive_intruder_alert: bool,
}

fn default_receive_intruder_alert() -> bool {
    true
}

impl Contact {
    /// Eligible for intruder alerts: only when opted in
    pub fn receives_intruder_alert(&self) -> bool {
        self.receive_intruder_alert
    }
}

/// Input for adding a contact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub phone: String,
}

impl NewContact {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_contact_defaults_to_opted_in() {
        let json = r#"{
            "id": "contact_1700000000000",
            "name": "Mãe",
            "phone": "51985330121",
            "addedAt": "2024-01-01T12:00:00.000Z"
        }"#;
        let contact: Contact = serde_json::from_str(json).unwrap();
        assert!(contact.receive_intruder_alert);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let json = r#"{
            "id": "c1", "name": "A", "phone": "1",
            "addedAt": "2024-01-01T12:00:00Z",
            "receiveIntruderAlert": false,
            "avatar": "x.png"
        }"#;
        let contact: Contact = serde_json::from_str(json).unwrap();
        assert!(!contact.receives_intruder_alert());
    }
}
