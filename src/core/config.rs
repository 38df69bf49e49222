//! Guardian configuration
//!
//! Optional JSON file; every field has a default so partial files work:
//!
//! ```json
//! { "auth": { "threshold": 3, "pin_storage": "sha256" },
//!   "dispatch": { "pacing_ms": 1500, "country_code": "1" } }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::auth::AuthPolicy;
use crate::core::dispatch::DispatchConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardianConfig {
    pub auth: AuthPolicy,
    pub dispatch: DispatchConfig,
}

impl GuardianConfig {
    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.threshold == 0 {
            return Err(ConfigError::Invalid("auth.threshold must be at least 1"));
        }
        if self.dispatch.country_code.is_empty()
            || !self.dispatch.country_code.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ConfigError::Invalid("dispatch.country_code must be digits"));
        }
        if self.dispatch.deep_link_scheme.is_empty()
            || self.dispatch.web_host.is_empty()
            || self.dispatch.map_host.is_empty()
        {
            return Err(ConfigError::Invalid("dispatch transport hosts must be set"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::PinStorage;

    #[test]
    fn test_defaults() {
        let config = GuardianConfig::default();
        assert_eq!(config.auth.threshold, crate::MAX_FAILED_ATTEMPTS);
        assert_eq!(config.dispatch.pacing_ms, crate::PACING_MS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guardian.json");
        std::fs::write(
            &path,
            r#"{"auth": {"threshold": 3, "pin_storage": "sha256"}, "dispatch": {"pacing_ms": 0}}"#,
        )
        .unwrap();

        let config = GuardianConfig::load(&path).unwrap();
        assert_eq!(config.auth.threshold, 3);
        assert_eq!(config.auth.pin_storage, PinStorage::Sha256);
        assert_eq!(config.auth.window_ms, crate::FAILURE_WINDOW_MS);
        assert_eq!(config.dispatch.pacing_ms, 0);
        assert_eq!(config.dispatch.web_host, "wa.me");
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guardian.json");
        std::fs::write(&path, r#"{"auth": {"threshold": 0}}"#).unwrap();
        assert!(matches!(GuardianConfig::load(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_empty_hosts_rejected() {
        for field in ["deep_link_scheme", "web_host", "map_host"] {
            let mut config = GuardianConfig::default();
            match field {
                "deep_link_scheme" => config.dispatch.deep_link_scheme.clear(),
                "web_host" => config.dispatch.web_host.clear(),
                _ => config.dispatch.map_host.clear(),
            }
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "empty {} accepted",
                field
            );
        }
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            GuardianConfig::load("/nonexistent/guardian.json"),
            Err(ConfigError::Read { .. })
        ));
    }
}
