//! Guardian: PIN guard with intruder escalation and emergency alert dispatch
//!
//! Two pieces of the personal-safety app live here:
//! AuthGuard (PIN + windowed failure counter) and DispatchPipeline
//! (best-effort SOS / intruder fan-out to emergency contacts).

pub mod core;
pub mod types;

// =============================================================================
// AUTH POLICY [C]
// =============================================================================

/// Consecutive wrong PINs (within the window) that raise an intruder alert
pub const MAX_FAILED_ATTEMPTS: u32 = 2;

/// Failed attempts older than this no longer count (milliseconds)
/// 5 minutes
pub const FAILURE_WINDOW_MS: u64 = 5 * 60 * 1000;

/// Exact PIN length accepted at registration and PIN update
pub const PIN_LENGTH: usize = 4;

// =============================================================================
// DISPATCH [C]
// =============================================================================

/// Upper bound for the location fix before dispatch continues without it
pub const LOCATION_TIMEOUT_MS: u64 = 10_000;

/// Pause between two recipients, keeps the messaging app from rate limiting
pub const PACING_MS: u64 = 1_000;

/// Country code prefixed to contact phone numbers that lack it
pub const DEFAULT_COUNTRY_CODE: &str = "55";

/// Primary transport deep-link scheme
pub const DEFAULT_DEEP_LINK_SCHEME: &str = "whatsapp";

/// Fallback transport web host
pub const DEFAULT_WEB_HOST: &str = "wa.me";

/// Host used for the map link inside SOS messages
pub const DEFAULT_MAP_HOST: &str = "maps.google.com";

/// Local time offset for SOS timestamps (minutes east of UTC), UTC-03:00
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -180;

// =============================================================================
// STORAGE KEYS
// =============================================================================

pub const USER_KEY: &str = "guardian_user_data";
pub const PIN_KEY: &str = "guardian_user_pin";
pub const FAILED_ATTEMPTS_KEY: &str = "guardian_failed_login_attempts";
pub const LAST_FAILED_ATTEMPT_TIME_KEY: &str = "guardian_last_failed_attempt_time";
pub const CONTACTS_KEY: &str = "emergency_contacts";

/// Current version of the record envelope written to the store
pub const RECORD_VERSION: u32 = 1;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
