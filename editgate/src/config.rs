//! Component configuration.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. Variables prefixed with `EDITGATE_` override YAML values; for
//! nested values, use double underscores. For example,
//! `EDITGATE_SESSION__SENTINEL=everything` sets the `session.sentinel` field.
//!
//! All fields have working defaults: an unconfigured component uses the
//! built-in fallback manifest with no remote authority, a two hour session
//! duration, and a session record file in the working directory.
//!
//! ```no_run
//! use editgate::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load("editgate.yaml")?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::Error;
use crate::manifest::Manifest;

/// Root configuration for the authentication component.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Credential manifest retrieval
    pub manifest: ManifestConfig,
    /// Session lifecycle policy
    pub session: SessionConfig,
    /// Persisted session record location
    pub storage: StorageConfig,
}

/// Where the credential manifest comes from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    /// Remote manifest document location. When unset, no network retrieval
    /// is attempted and the fallback manifest is the sole authority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    /// Per-request timeout for manifest retrieval
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Manifest used when the authority is unreachable or none is configured.
    /// Injected here rather than inlined in logic so deployments can swap or
    /// disable the built-in credentials.
    pub fallback: Manifest,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            url: None,
            request_timeout: Duration::from_secs(30),
            fallback: Manifest::builtin(),
        }
    }
}

/// Session lifecycle policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// How long a minted session remains valid
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    /// Capability tag granting unrestricted access regardless of the other
    /// tags a role lists
    pub sentinel: String,
    /// Role id → human-readable label shown by the presentation layer.
    /// Roles absent here are labelled with the role id itself.
    pub display_names: IndexMap<String, String>,
}

impl SessionConfig {
    /// Resolve the display name for a role.
    pub fn display_name_for(&self, role: &str) -> String {
        self.display_names.get(role).cloned().unwrap_or_else(|| role.to_string())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(2 * 60 * 60), // 2 hours
            sentinel: "all".to_string(),
            display_names: IndexMap::from([
                ("creator".to_string(), "Creator".to_string()),
                ("manager".to_string(), "Manager".to_string()),
            ]),
        }
    }
}

/// Where the single persisted session record lives.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Path of the session record file
    pub record_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            record_path: PathBuf::from("editgate-session.json"),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(path: &str) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(path).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(path: &str) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(path))
            // Environment variables can still override specific values
            .merge(Env::prefixed("EDITGATE_").split("__"))
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.session.duration.as_secs() < 300 {
            // Less than 5 minutes
            return Err(Error::Config {
                reason: "session duration is too short (minimum 5 minutes)".to_string(),
            });
        }

        if self.session.duration.as_secs() > 86400 * 30 {
            // More than 30 days
            return Err(Error::Config {
                reason: "session duration is too long (maximum 30 days)".to_string(),
            });
        }

        if self.session.sentinel.is_empty() {
            return Err(Error::Config {
                reason: "sentinel capability tag cannot be empty".to_string(),
            });
        }

        // The fallback manifest must keep the component operable offline.
        if self.manifest.fallback.passwords.is_empty() {
            return Err(Error::Config {
                reason: "fallback manifest must define at least one role".to_string(),
            });
        }

        if self.manifest.fallback.passwords.values().any(|fp| fp.is_empty()) {
            return Err(Error::Config {
                reason: "fallback manifest contains an empty fingerprint".to_string(),
            });
        }

        Ok(())
    }
}
