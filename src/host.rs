//! Mirror host configuration and download URL construction.
//!
//! A [`HostDescriptor`] describes one download mirror: a URL template with
//! an `{id}` placeholder, the number of attempts allowed per identifier,
//! and an optional per-attempt timeout. Descriptors are validated once at
//! configuration time and read-only afterwards.

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Placeholder substituted with the beatmap-set identifier.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Configuration errors caught when building a host descriptor.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The URL template has no `{id}` placeholder to substitute.
    #[error("host template {template:?} does not contain an {{id}} placeholder")]
    MissingPlaceholder {
        /// The offending template.
        template: String,
    },

    /// A host must be allowed at least one attempt per identifier.
    #[error("host template {template:?} configured with zero attempts")]
    ZeroAttempts {
        /// The offending template.
        template: String,
    },
}

/// Immutable configuration for one download mirror.
#[derive(Debug, Clone)]
pub struct HostDescriptor {
    template: String,
    label: String,
    max_attempts: u32,
    timeout: Option<Duration>,
}

impl HostDescriptor {
    /// Creates a descriptor, validating the template up front.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingPlaceholder`] when the template lacks
    /// `{id}`, or [`ConfigError::ZeroAttempts`] when `max_attempts` is 0.
    pub fn new(
        template: impl Into<String>,
        max_attempts: u32,
        timeout: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        let template = template.into();
        if !template.contains(ID_PLACEHOLDER) {
            return Err(ConfigError::MissingPlaceholder { template });
        }
        if max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts { template });
        }
        let label = host_label(&template);
        Ok(Self {
            template,
            label,
            max_attempts,
            timeout,
        })
    }

    /// Builds the concrete download URL for one identifier.
    #[must_use]
    pub fn resolve(&self, id: &str) -> String {
        self.template.replace(ID_PLACEHOLDER, id)
    }

    /// Short host name used in failure notices (URL authority when parseable).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Maximum attempts per identifier against this host.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Per-attempt timeout; `None` means no read deadline.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// The standard mirror chain: beatconnect first, catboy as fallback.
///
/// # Errors
///
/// Returns [`ConfigError`] if a built-in template is malformed, which
/// would indicate a programming error rather than user input.
pub fn default_mirrors() -> Result<Vec<HostDescriptor>, ConfigError> {
    Ok(vec![
        HostDescriptor::new("https://beatconnect.io/b/{id}", 3, None)?,
        HostDescriptor::new("https://catboy.best/d/{id}", 5, Some(Duration::from_secs(30)))?,
    ])
}

fn host_label(template: &str) -> String {
    Url::parse(&template.replace(ID_PLACEHOLDER, "0"))
        .ok()
        .and_then(|url| url.host_str().map(std::string::ToString::to_string))
        .unwrap_or_else(|| template.to_string())
}
