//! Location collaborator
//!
//! Location is an enrichment: callers bound the call with a timeout and
//! carry on with `None` on any error.

use async_trait::async_trait;
use crate::types::Location;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable: {0}")]
    Unavailable(String),
}

/// Best-effort current position
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_location(&self) -> Result<Location, LocationError>;
}

/// No positioning hardware or permission
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn current_location(&self) -> Result<Location, LocationError> {
        Err(LocationError::Unavailable("no location source configured".to_string()))
    }
}

/// Always reports the same fix
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Location);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_location(&self) -> Result<Location, LocationError> {
        Ok(self.0)
    }
}
