//! Workload configuration.

use std::time::Duration;

use edge_sdk::edge_cache::{CacheDirective, RouteCachePolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration compiled into the component.
const EMBEDDED: &str = include_str!("../variations.toml");

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The TOML could not be parsed.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A cookie, parameter or header name is empty.
    #[error("{0} must not be empty")]
    EmptyName(&'static str),

    /// A path does not start with `/`.
    #[error("{field} must start with '/': {path:?}")]
    InvalidPath {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        path: String,
    },

    /// Submissions would be rewritten onto themselves.
    #[error("submission_path and canonical_path are both {0:?}")]
    PathConflict(String),
}

/// Guess submission and bucketing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuessConfig {
    /// The number guesses are compared against.
    pub answer: i64,
    /// Path forms submit to.
    pub submission_path: String,
    /// Path the page is rendered on.
    pub canonical_path: String,
    /// Query parameter carrying the guess, then the bucket tag.
    pub param: String,
}

impl Default for GuessConfig {
    fn default() -> Self {
        Self {
            answer: 11034,
            submission_path: "/guess".to_string(),
            canonical_path: "/".to_string(),
            param: "value".to_string(),
        }
    }
}

/// First-visit cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie name.
    pub name: String,
    /// Value written on every render; reading it back means a repeat visit.
    pub value: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "visited".to_string(),
            value: "true".to_string(),
        }
    }
}

/// Geolocation signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    /// Request header the edge cache sees the country through.
    pub header: String,
    /// Shown when the country cannot be resolved.
    pub fallback: String,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            header: "X-Country".to_string(),
            fallback: "unknown".to_string(),
        }
    }
}

/// Cache lifetimes for the rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// `s-maxage` at the shared tier.
    pub shared_max_age_secs: u64,
    /// `max-age` at the end-user agent.
    pub client_max_age_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            shared_max_age_secs: 31_536_000,
            client_max_age_secs: 0,
        }
    }
}

impl CacheConfig {
    /// Long-lived at the shared tier, revalidated by the client.
    pub fn policy(&self) -> RouteCachePolicy {
        RouteCachePolicy::edge_cached(Duration::from_secs(self.shared_max_age_secs)).with_browser(
            CacheDirective::public()
                .with_max_age(Duration::from_secs(self.client_max_age_secs))
                .must_revalidate(),
        )
    }
}

/// Full workload configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariationConfig {
    /// Guess bucketing.
    pub guess: GuessConfig,
    /// First-visit cookie.
    pub cookie: CookieConfig,
    /// Geolocation.
    pub geo: GeoConfig,
    /// Cache lifetimes.
    pub cache: CacheConfig,
}

impl VariationConfig {
    /// The configuration compiled into the component.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(EMBEDDED)
    }

    /// The raw embedded TOML.
    pub fn embedded_source() -> &'static str {
        EMBEDDED
    }

    /// Parse and validate TOML. Missing fields take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("guess.param", &self.guess.param),
            ("cookie.name", &self.cookie.name),
            ("geo.header", &self.geo.header),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyName(field));
            }
        }

        for (field, path) in [
            ("guess.submission_path", &self.guess.submission_path),
            ("guess.canonical_path", &self.guess.canonical_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidPath {
                    field,
                    path: path.clone(),
                });
            }
        }

        if self.guess.submission_path == self.guess.canonical_path {
            return Err(ConfigError::PathConflict(self.guess.submission_path.clone()));
        }

        Ok(())
    }
}
