//! Configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! [store]
//! base_url = "https://tenant.api.example.com/v3"
//! token = "..."
//! timeout_secs = 30
//!
//! [entities.role]
//! extra_ignore = ["/legacyMembershipInfo"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use govsync_document::{DocumentError, EntityKind};
use govsync_patch::IgnoreSet;
use govsync_pointer::ValidationError;

use crate::entity::EntityProfile;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field}: {message}")]
    Invalid { field: &'static str, message: String },

    #[error("unknown entity table [entities.{name}]: {source}")]
    UnknownKind {
        name: String,
        #[source]
        source: DocumentError,
    },

    #[error("invalid ignore pattern for {kind}: {source}")]
    IgnorePattern {
        kind: EntityKind,
        #[source]
        source: ValidationError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub base_url: String,
    /// Bearer token, sent as-is. Obtaining it is the caller's business.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::Invalid {
                field: "store.base_url",
                message: "must not be empty".into(),
            });
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                field: "store.base_url",
                message: format!("unsupported scheme in {}", self.base_url),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "store.timeout_secs",
                message: "must be greater than zero".into(),
            });
        }
        if self.token.as_deref() == Some("") {
            return Err(ConfigError::Invalid {
                field: "store.token",
                message: "must not be empty when set".into(),
            });
        }
        Ok(())
    }
}

/// Per-kind adjustments layered over the built-in profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityOverrides {
    #[serde(default)]
    pub extra_ignore: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovsyncConfig {
    pub store: StoreConfig,
    /// Keyed by kind name (`access_profile`, `role`, ...).
    #[serde(default)]
    pub entities: BTreeMap<String, EntityOverrides>,
}

impl GovsyncConfig {
    pub fn new(store: StoreConfig) -> Self {
        Self {
            store,
            entities: BTreeMap::new(),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn with_extra_ignore(mut self, kind: EntityKind, pattern: impl Into<String>) -> Self {
        self.entities
            .entry(kind.as_str().to_string())
            .or_default()
            .extra_ignore
            .push(pattern.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        for name in self.entities.keys() {
            let kind = name
                .parse::<EntityKind>()
                .map_err(|source| ConfigError::UnknownKind {
                    name: name.clone(),
                    source,
                })?;
            self.extra_ignore(kind)?;
        }
        Ok(())
    }

    fn extra_ignore(&self, kind: EntityKind) -> Result<IgnoreSet, ConfigError> {
        let patterns = self
            .entities
            .iter()
            .filter(|(name, _)| name.parse::<EntityKind>().ok() == Some(kind))
            .flat_map(|(_, overrides)| overrides.extra_ignore.iter().map(String::as_str));
        IgnoreSet::from_patterns(patterns)
            .map_err(|source| ConfigError::IgnorePattern { kind, source })
    }

    /// The built-in profile of `kind` with this configuration's overrides.
    pub fn profile(&self, kind: EntityKind) -> Result<EntityProfile, ConfigError> {
        let extra = self.extra_ignore(kind)?;
        Ok(EntityProfile::for_kind(kind).with_extra_ignore(&extra))
    }
}
