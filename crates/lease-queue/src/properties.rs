//! Property binding for template settings.
//!
//! Settings can be bound from a TOML file layered with `LEASE_QUEUE_*`
//! environment variables. Binding goes through the same validation as the
//! template's setters: an unsupported checkpoint mode or payload format and a
//! non-positive visibility timeout fail with [`ConfigError`].

use crate::checkpoint::CheckpointMode;
use crate::converter::PayloadFormat;
use crate::error::ConfigError;
use crate::template::DEFAULT_VISIBILITY_TIMEOUT_IN_SECONDS;
use serde::{Deserialize, Serialize};

/// Validated settings bag for a queue template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TemplateProperties {
    pub visibility_timeout_seconds: u32,
    pub checkpoint_mode: CheckpointMode,
    pub payload_format: PayloadFormat,
}

impl Default for TemplateProperties {
    fn default() -> Self {
        Self {
            visibility_timeout_seconds: DEFAULT_VISIBILITY_TIMEOUT_IN_SECONDS,
            checkpoint_mode: CheckpointMode::default(),
            payload_format: PayloadFormat::default(),
        }
    }
}

/// Unvalidated shape as it appears in configuration sources
#[derive(Debug, Default, Deserialize)]
struct RawProperties {
    visibility_timeout_seconds: Option<i64>,
    checkpoint_mode: Option<String>,
    payload_format: Option<String>,
}

impl TemplateProperties {
    /// Bind properties from an optional TOML file layered with
    /// `LEASE_QUEUE_*` environment variables (environment wins).
    ///
    /// Missing keys fall back to the defaults; present keys are validated.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("LEASE_QUEUE").try_parsing(true))
            .build()
            .map_err(|error| ConfigError::Binding {
                message: error.to_string(),
            })?;

        let raw: RawProperties =
            settings
                .try_deserialize()
                .map_err(|error| ConfigError::Binding {
                    message: error.to_string(),
                })?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawProperties) -> Result<Self, ConfigError> {
        let mut properties = Self::default();

        if let Some(seconds) = raw.visibility_timeout_seconds {
            if seconds <= 0 {
                return Err(ConfigError::NonPositiveVisibilityTimeout { seconds });
            }
            properties.visibility_timeout_seconds =
                u32::try_from(seconds).map_err(|_| ConfigError::Binding {
                    message: format!("visibility timeout {seconds} exceeds the supported range"),
                })?;
        }

        if let Some(mode) = raw.checkpoint_mode {
            properties.checkpoint_mode = mode.parse()?;
        }

        if let Some(format) = raw.payload_format {
            properties.payload_format = format.parse()?;
        }

        Ok(properties)
    }
}

#[cfg(test)]
#[path = "properties_tests.rs"]
mod tests;
