//! Message transports: app deep link with a web-link fallback
//!
//! Nothing here talks to a phone network. A message is "sent" by building a
//! link and handing it to the platform's URL handler (`LinkOpener`).

use async_trait::async_trait;
use std::sync::Mutex;

use crate::types::{Contact, DeliveryResult, TransportKind};
use crate::{DEFAULT_COUNTRY_CODE, DEFAULT_DEEP_LINK_SCHEME, DEFAULT_WEB_HOST};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("no handler for {0}")]
    NoHandler(String),

    #[error("failed to open link: {0}")]
    OpenFailed(String),
}

/// Platform URL handler
#[async_trait]
pub trait LinkOpener: Send + Sync {
    /// Is there an installed handler for this URL's scheme?
    async fn can_open(&self, url: &str) -> bool;

    async fn open(&self, url: &str) -> Result<(), TransportError>;
}

/// Builds primary and fallback links for a recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    pub scheme: String,
    pub web_host: String,
    pub country_code: String,
}

impl Default for LinkBuilder {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_DEEP_LINK_SCHEME.to_string(),
            web_host: DEFAULT_WEB_HOST.to_string(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
        }
    }
}

impl LinkBuilder {
    /// Digits only, country code prefixed when missing
    pub fn normalize_phone(&self, phone: &str) -> String {
        let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.starts_with(&self.country_code) {
            digits
        } else {
            format!("{}{}", self.country_code, digits)
        }
    }

    /// `<scheme>://send?phone=<digits>&text=<encoded>`
    pub fn primary_link(&self, phone: &str, message: &str) -> String {
        format!(
            "{}://send?phone={}&text={}",
            self.scheme,
            self.normalize_phone(phone),
            urlencoding::encode(message)
        )
    }

    /// `https://<web-host>/<digits>?text=<encoded>`
    pub fn fallback_link(&self, phone: &str, message: &str) -> String {
        format!(
            "https://{}/{}?text={}",
            self.web_host,
            self.normalize_phone(phone),
            urlencoding::encode(message)
        )
    }
}

/// Deliver one message to one contact, falling back to the web link when
/// the app scheme has no handler. Never fails: the outcome is recorded.
pub async fn deliver(
    opener: &dyn LinkOpener,
    links: &LinkBuilder,
    contact: &Contact,
    message: &str,
) -> DeliveryResult {
    let primary = links.primary_link(&contact.phone, message);

    let (transport_used, url) = if opener.can_open(&primary).await {
        (TransportKind::Primary, primary)
    } else {
        tracing::debug!(contact_id = %contact.id, "deep link unavailable, using web fallback");
        (TransportKind::Fallback, links.fallback_link(&contact.phone, message))
    };

    let delivered = match opener.open(&url).await {
        Ok(()) => {
            tracing::info!(
                contact_id = %contact.id,
                transport = ?transport_used,
                "alert link opened"
            );
            true
        }
        Err(e) => {
            tracing::warn!(
                contact_id = %contact.id,
                transport = ?transport_used,
                error = %e,
                "alert link failed"
            );
            false
        }
    };

    DeliveryResult {
        contact_id: contact.id.clone(),
        transport_used,
        delivered,
    }
}

/// Opener that only records and logs links
///
/// Used by the CLI and HTTP server, where there is no platform URL handler.
/// A long-running server should use `without_history`: nothing drains the
/// recorded links there.
#[derive(Debug, Default)]
pub struct LogOpener {
    /// Report the app scheme as installed
    scheme_available: bool,
    /// Keep opened links for `opened` / `take_opened`
    keep_history: bool,
    opened: Mutex<Vec<String>>,
}

impl LogOpener {
    pub fn new(scheme_available: bool) -> Self {
        Self {
            scheme_available,
            keep_history: true,
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Log links without keeping them
    pub fn without_history(mut self) -> Self {
        self.keep_history = false;
        self
    }

    /// Links opened so far, in order
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Drain the recorded links
    pub fn take_opened(&self) -> Vec<String> {
        std::mem::take(&mut *self.opened.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

#[async_trait]
impl LinkOpener for LogOpener {
    async fn can_open(&self, url: &str) -> bool {
        self.scheme_available || url.starts_with("https://")
    }

    async fn open(&self, url: &str) -> Result<(), TransportError> {
        if !self.can_open(url).await {
            return Err(TransportError::NoHandler(url.to_string()));
        }
        tracing::debug!(url, "opening link");
        if self.keep_history {
            self.opened
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(url.to_string());
        }
        Ok(())
    }
}
