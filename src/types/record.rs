//! Versioned record envelope for values kept in the secret store
//!
//! Written as `{"version": N, "data": ...}`. Reads also accept the bare
//! payload written by older builds, which had no envelope.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::RECORD_VERSION;

#[derive(Debug, Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

/// Why a stored record could not be decoded
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record version {found} is newer than supported {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Encode a payload at the current record version
pub fn encode_record<T: Serialize>(data: &T) -> Result<String, RecordError> {
    Ok(serde_json::to_string(&EnvelopeRef {
        version: RECORD_VERSION,
        data,
    })?)
}

/// Decode an enveloped or legacy bare record
pub fn decode_record<T: DeserializeOwned>(raw: &str) -> Result<T, RecordError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;

    let is_envelope = value
        .as_object()
        .map(|o| o.contains_key("version") && o.contains_key("data"))
        .unwrap_or(false);

    if !is_envelope {
        return Ok(serde_json::from_value(value)?);
    }

    let envelope: Envelope<T> = serde_json::from_value(value)?;
    if envelope.version > RECORD_VERSION {
        return Err(RecordError::UnsupportedVersion {
            found: envelope.version,
            supported: RECORD_VERSION,
        });
    }
    Ok(envelope.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Contact;

    #[test]
    fn test_envelope_written_with_version() {
        let raw = encode_record(&vec![1u32, 2, 3]).unwrap();
        assert_eq!(raw, r#"{"version":1,"data":[1,2,3]}"#);
        let back: Vec<u32> = decode_record(&raw).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn test_legacy_bare_array_decodes() {
        let raw = r#"[{"id":"contact_1","name":"A","phone":"51 9999","addedAt":"2024-05-01T10:00:00.000Z"}]"#;
        let contacts: Vec<Contact> = decode_record(raw).unwrap();
        assert_eq!(contacts.len(), 1);
        assert!(contacts[0].receive_intruder_alert);
    }

    #[test]
    fn test_future_version_rejected() {
        let raw = r#"{"version":99,"data":[]}"#;
        let err = decode_record::<Vec<Contact>>(raw).unwrap_err();
        assert!(matches!(err, RecordError::UnsupportedVersion { found: 99, .. }));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            decode_record::<Vec<Contact>>("not json"),
            Err(RecordError::Malformed(_))
        ));
    }
}
