//! Payload formats and translation between application messages and wire text.

use crate::error::{ConfigError, ConversionError};
use crate::message::{Envelope, Message, MessageHeaders, Payload};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use serde::Serialize;
use std::str::FromStr;

/// Wire representation of a payload, configured on the template.
///
/// The same format is applied in both directions: `to_wire` when sending and
/// `from_wire` when wrapping a received message as an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PayloadFormat {
    /// Arbitrary bytes, base64-encoded on the wire
    #[default]
    Raw,
    /// UTF-8 text passed through unchanged
    Text,
    /// JSON document, validated on send and parsed on receive
    Json,
}

impl std::fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw => write!(f, "RAW"),
            Self::Text => write!(f, "TEXT"),
            Self::Json => write!(f, "JSON"),
        }
    }
}

impl FromStr for PayloadFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RAW" => Ok(Self::Raw),
            "TEXT" => Ok(Self::Text),
            "JSON" => Ok(Self::Json),
            other => Err(ConfigError::UnsupportedPayloadFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// Translates between application messages and the wire message text.
///
/// All failures are local and surface as [`ConversionError`] before any
/// remote call is made.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageQueueMessageConverter;

impl StorageQueueMessageConverter {
    /// Create new converter
    pub fn new() -> Self {
        Self
    }

    /// Convert an outgoing message body to wire text
    pub fn to_wire(
        &self,
        message: &Message,
        format: PayloadFormat,
    ) -> Result<String, ConversionError> {
        match format {
            PayloadFormat::Raw => Ok(BASE64.encode(&message.body)),
            PayloadFormat::Text => std::str::from_utf8(&message.body)
                .map(str::to_string)
                .map_err(|_| ConversionError::InvalidUtf8),
            PayloadFormat::Json => {
                let value: serde_json::Value = serde_json::from_slice(&message.body)?;
                Ok(serde_json::to_string(&value)?)
            }
        }
    }

    /// Wrap received wire text and headers as an application envelope
    pub fn from_wire(
        &self,
        body: &str,
        headers: MessageHeaders,
        format: PayloadFormat,
    ) -> Result<Envelope, ConversionError> {
        let payload = match format {
            PayloadFormat::Raw => Payload::Raw(Bytes::from(BASE64.decode(body)?)),
            PayloadFormat::Text => Payload::Text(body.to_string()),
            PayloadFormat::Json => Payload::Json(serde_json::from_str(body)?),
        };

        Ok(Envelope::new(headers, payload))
    }
}

#[cfg(test)]
#[path = "converter_tests.rs"]
mod tests;
