//! Core types for Guardian

mod alert;
mod contact;
mod credential;
mod outcome;
mod reason;
mod record;

pub use alert::{AlertEvent, AlertKind, Location};
pub use contact::{Contact, NewContact};
pub use credential::{is_valid_pin, Credential, FailureState, NewUser};
pub use outcome::{AuthOutcome, DeliveryResult, DispatchOutcome, TransportKind};
pub use reason::{AuthReason, DispatchReason};
pub use record::{decode_record, encode_record, RecordError};
