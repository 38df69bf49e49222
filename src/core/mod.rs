//! Core modules for Guardian

pub mod store;
pub mod clock;
pub mod location;
pub mod transport;
pub mod payload;
pub mod auth;
pub mod contacts;
pub mod dispatch;
pub mod config;
pub mod guardian;
pub mod api;

pub use store::{CredentialStore, FileStore, MemoryStore, StoreError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use location::{FixedLocation, LocationError, LocationProvider, NoLocation};
pub use transport::{deliver, LinkBuilder, LinkOpener, LogOpener, TransportError};
pub use payload::AlertPayloadBuilder;
pub use auth::{encode_pin, pin_matches, AuthError, AuthGuard, AuthPolicy, PinStorage};
pub use contacts::{ContactDirectory, ContactError};
pub use dispatch::{DispatchConfig, DispatchPipeline};
pub use config::{ConfigError, GuardianConfig};
pub use guardian::{Guardian, LoginResult};
pub use api::{create_router, run_server};
