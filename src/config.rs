//! Configuration loading helpers.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::desc::{FetchDescriptor, IoDescriptor, UpdateDescriptor};
use crate::entry::Mode;
use crate::error::DescError;

/// Errors returned by configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error while reading config files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Invalid value for a key.
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Raw value string.
        value: String,
    },
    /// Unknown configuration key.
    #[error("unknown config key: {0}")]
    UnknownKey(String),
    /// Missing required configuration field.
    #[error("missing required field: {0}")]
    MissingField(String),
    /// The resolved parameters were rejected by descriptor construction.
    #[error("invalid descriptor parameters: {0}")]
    Descriptor(#[from] DescError),
}

/// Top-level configuration schema.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OxidescConfig {
    /// Descriptor construction parameters.
    pub descriptor: Option<DescriptorSpec>,
}

/// Descriptor parameters as they appear in configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DescriptorSpec {
    /// Shared cap for all keys, in characters.
    pub max_key_chars: Option<u16>,
    /// Number of entry slots.
    pub entry_count: Option<u16>,
    /// Capacity of each entry's Data Buffer, in bytes.
    pub entry_buffer_len: Option<usize>,
    /// `"update"` or `"fetch"`.
    pub mode: Option<String>,
}

impl OxidescConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load configuration from the `OXIDESC_CONFIG` env var (if set), then
    /// apply `OXIDESC__section__field` overrides.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let config_path = env::var("OXIDESC_CONFIG").ok();
        let mut config = match config_path {
            Some(path) => Self::load_from_path(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment overrides in-place.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        for (key, value) in env::vars() {
            if !key.starts_with("OXIDESC__") {
                continue;
            }
            let path = key["OXIDESC__".len()..].to_ascii_lowercase();
            let parts: Vec<&str> = path.split("__").collect();
            let value = value.trim().to_string();

            match parts.as_slice() {
                ["descriptor", "max_key_chars"] => {
                    self.descriptor_mut().max_key_chars = Some(parse_value(&key, &value)?);
                }
                ["descriptor", "entry_count"] => {
                    self.descriptor_mut().entry_count = Some(parse_value(&key, &value)?);
                }
                ["descriptor", "entry_buffer_len"] => {
                    self.descriptor_mut().entry_buffer_len = Some(parse_value(&key, &value)?);
                }
                ["descriptor", "mode"] => {
                    self.descriptor_mut().mode = Some(value);
                }
                _ => return Err(ConfigError::UnknownKey(key)),
            }
        }
        Ok(())
    }

    /// Resolved descriptor parameters; fails on missing fields.
    pub fn descriptor_params(&self) -> Result<DescriptorParams, ConfigError> {
        let spec = self
            .descriptor
            .as_ref()
            .ok_or_else(|| ConfigError::MissingField("descriptor".to_string()))?;
        let max_key_chars = spec
            .max_key_chars
            .ok_or_else(|| ConfigError::MissingField("descriptor.max_key_chars".to_string()))?;
        let entry_count = spec
            .entry_count
            .ok_or_else(|| ConfigError::MissingField("descriptor.entry_count".to_string()))?;
        let entry_buffer_len = spec
            .entry_buffer_len
            .ok_or_else(|| ConfigError::MissingField("descriptor.entry_buffer_len".to_string()))?;
        let mode = match spec.mode.as_deref() {
            Some("update") => Mode::Update,
            Some("fetch") => Mode::Fetch,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "descriptor.mode".to_string(),
                    value: other.to_string(),
                })
            }
            None => return Err(ConfigError::MissingField("descriptor.mode".to_string())),
        };
        Ok(DescriptorParams {
            max_key_chars,
            entry_count,
            entry_buffer_len,
            mode,
        })
    }

    fn descriptor_mut(&mut self) -> &mut DescriptorSpec {
        self.descriptor.get_or_insert_with(DescriptorSpec::default)
    }
}

/// Fully resolved descriptor construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorParams {
    /// Shared cap for all keys, in characters.
    pub max_key_chars: u16,
    /// Number of entry slots.
    pub entry_count: u16,
    /// Capacity of each entry's Data Buffer, in bytes.
    pub entry_buffer_len: usize,
    /// Update or fetch.
    pub mode: Mode,
}

impl DescriptorParams {
    /// Build a mode-checked descriptor from these parameters.
    pub fn build(&self) -> Result<IoDescriptor, ConfigError> {
        Ok(IoDescriptor::new(
            self.max_key_chars,
            self.entry_count,
            self.entry_buffer_len,
            self.mode,
        )?)
    }

    /// Build an [`UpdateDescriptor`]; fails unless `mode` is update.
    pub fn build_update(&self) -> Result<UpdateDescriptor, ConfigError> {
        if self.mode != Mode::Update {
            return Err(ConfigError::InvalidValue {
                key: "descriptor.mode".to_string(),
                value: self.mode.to_string(),
            });
        }
        Ok(UpdateDescriptor::new(
            self.max_key_chars,
            self.entry_count,
            self.entry_buffer_len,
        )?)
    }

    /// Build a [`FetchDescriptor`]; fails unless `mode` is fetch.
    pub fn build_fetch(&self) -> Result<FetchDescriptor, ConfigError> {
        if self.mode != Mode::Fetch {
            return Err(ConfigError::InvalidValue {
                key: "descriptor.mode".to_string(),
                value: self.mode.to_string(),
            });
        }
        Ok(FetchDescriptor::new(
            self.max_key_chars,
            self.entry_count,
            self.entry_buffer_len,
        )?)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
