//! Tracker configuration.
//!
//! Defaults cover normal play. [`TrackerConfig::from_env`] reads overrides
//! from the process environment after loading a `.env` file if one exists.

use crate::derive::HalfCasterProgression;
use crate::reconcile::ClassResourcePolicy;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

pub const ENV_SAVE_DIR: &str = "TRACKER_SAVE_DIR";
pub const ENV_RESOURCE_POLICY: &str = "TRACKER_RESOURCE_POLICY";
pub const ENV_MAX_CLASSES: &str = "TRACKER_MAX_CLASSES";
pub const ENV_HALF_CASTER: &str = "TRACKER_HALF_CASTER";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{key} must be between 1 and {max}, got {value}")]
    MaxClassesOutOfRange {
        key: &'static str,
        value: usize,
        max: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// How class resource usage survives re-derivation.
    pub class_resource_policy: ClassResourcePolicy,
    /// Largest number of class entries a character may hold, `1..=2`.
    pub max_classes: usize,
    pub half_caster_progression: HalfCasterProgression,
    /// Directory the autosave writer puts character files in.
    pub save_dir: PathBuf,
}

impl TrackerConfig {
    /// Multiclass cap; also the default.
    pub const MAX_CLASSES: usize = 2;
    pub const DEFAULT_SAVE_DIR: &'static str = "saves/characters";

    pub fn with_class_resource_policy(mut self, policy: ClassResourcePolicy) -> Self {
        self.class_resource_policy = policy;
        self
    }

    pub fn with_max_classes(mut self, max_classes: usize) -> Self {
        self.max_classes = max_classes.clamp(1, Self::MAX_CLASSES);
        self
    }

    pub fn with_half_caster_progression(mut self, progression: HalfCasterProgression) -> Self {
        self.half_caster_progression = progression;
        self
    }

    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = dir.into();
        self
    }

    /// Load `.env` if present, then read overrides from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_SAVE_DIR) {
            config.save_dir = PathBuf::from(dir);
        }

        if let Some(value) = lookup(ENV_RESOURCE_POLICY) {
            let normalized = value.trim().to_ascii_lowercase();
            config.class_resource_policy = match normalized.as_str() {
                "preserve" => ClassResourcePolicy::PreserveByIdentity,
                "reset" => ClassResourcePolicy::ResetOnChange,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_RESOURCE_POLICY,
                        value,
                    })
                }
            };
        }

        if let Some(value) = lookup(ENV_MAX_CLASSES) {
            let parsed: usize = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_MAX_CLASSES,
                value: value.clone(),
            })?;
            if !(1..=Self::MAX_CLASSES).contains(&parsed) {
                return Err(ConfigError::MaxClassesOutOfRange {
                    key: ENV_MAX_CLASSES,
                    value: parsed,
                    max: Self::MAX_CLASSES,
                });
            }
            config.max_classes = parsed;
        }

        if let Some(value) = lookup(ENV_HALF_CASTER) {
            let normalized = value.trim().to_ascii_lowercase();
            config.half_caster_progression = match normalized.as_str() {
                "multiclass" => HalfCasterProgression::Multiclass,
                "table" => HalfCasterProgression::DedicatedTable,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_HALF_CASTER,
                        value,
                    })
                }
            };
        }

        debug!(?config, "Loaded tracker config");
        Ok(config)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            class_resource_policy: ClassResourcePolicy::default(),
            max_classes: Self::MAX_CLASSES,
            half_caster_progression: HalfCasterProgression::default(),
            save_dir: PathBuf::from(Self::DEFAULT_SAVE_DIR),
        }
    }
}
