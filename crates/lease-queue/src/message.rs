//! Message types for queue operations including core domain identifiers.

use crate::checkpoint::Checkpointer;
use crate::error::ValidationError;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// Header key under which the checkpointer is attached to received envelopes
/// in MANUAL checkpoint mode.
///
/// This key is the integration contract with callers: a consumer that wants to
/// acknowledge a message looks up this header and invokes the checkpointer it
/// finds there. [`MessageHeaders::checkpointer`] is the typed accessor.
pub const CHECKPOINTER_HEADER: &str = "lease_queue_checkpointer";

// ============================================================================
// Core Domain Identifiers
// ============================================================================

/// Validated queue name with length and character restrictions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueName(String);

impl QueueName {
    /// Create new queue name with validation
    pub fn new(name: String) -> Result<Self, ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "queue_name".to_string(),
            });
        }

        if name.len() > 63 {
            return Err(ValidationError::InvalidFormat {
                field: "queue_name".to_string(),
                message: "must be at most 63 characters".to_string(),
            });
        }

        // Validate characters (ASCII alphanumeric, hyphens, underscores)
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::InvalidFormat {
                field: "queue_name".to_string(),
                message: "only ASCII alphanumeric, hyphens, and underscores allowed".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get queue name as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Unique identifier assigned to a message by the queue store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    /// Generate new random message ID
    pub fn new() -> Self {
        let id = uuid::Uuid::new_v4();
        Self(id.to_string())
    }

    /// Get message ID as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "message_id".to_string(),
            });
        }

        Ok(Self(s.to_string()))
    }
}

/// Opaque delivery token paired with a message id to form the lease token.
///
/// A fresh pop receipt is issued on every delivery of a message; the store
/// invalidates it once the message is deleted or the visibility deadline
/// elapses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PopReceipt(String);

impl PopReceipt {
    /// Generate new random pop receipt
    pub fn new() -> Self {
        let receipt = uuid::Uuid::new_v4();
        Self(receipt.to_string())
    }

    /// Get pop receipt as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PopReceipt {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PopReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PopReceipt {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "pop_receipt".to_string(),
            });
        }

        Ok(Self(s.to_string()))
    }
}

/// Timestamp wrapper for consistent time handling
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current time
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create timestamp from DateTime
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get underlying DateTime
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Create timestamp offset into the future, saturating on overflow
    pub fn after(duration: std::time::Duration) -> Self {
        let offset = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX);
        let deadline = Utc::now()
            .checked_add_signed(offset)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self(deadline)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// A message to be sent through the queue system
#[derive(Debug, Clone)]
pub struct Message {
    pub body: Bytes,
    pub headers: HashMap<String, String>,
}

impl Message {
    /// Create new message with body
    pub fn new(body: Bytes) -> Self {
        Self {
            body,
            headers: HashMap::new(),
        }
    }

    /// Create new message with a UTF-8 text body
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(Bytes::from(body.into()))
    }

    /// Add message header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }
}

/// A message delivered by the queue store under a visibility lease.
///
/// Holds the wire body together with the lease token (message id plus pop
/// receipt) needed to delete this delivery. The message reappears to other
/// receivers once `next_visible_at` elapses; no local timer tracks that.
#[derive(Debug, Clone)]
pub struct LeasedMessage {
    pub message_id: MessageId,
    pub pop_receipt: PopReceipt,
    pub body: String,
    pub delivery_count: u32,
    pub next_visible_at: Timestamp,
}

impl LeasedMessage {
    /// Check if the visibility lease has elapsed on the local clock
    pub fn lease_elapsed(&self) -> bool {
        Timestamp::now() >= self.next_visible_at
    }

    /// Compact one-line rendering for log output
    pub fn summary(&self) -> String {
        format!(
            "message {} (delivery {})",
            self.message_id, self.delivery_count
        )
    }
}

// ============================================================================
// Envelope and Headers
// ============================================================================

/// A single header value on a received envelope
#[derive(Debug, Clone)]
pub enum HeaderValue {
    Text(String),
    Checkpointer(Arc<Checkpointer>),
}

/// Headers attached to a received envelope.
///
/// Besides plain text entries this can carry the checkpointer handed to the
/// caller in MANUAL mode, stored under [`CHECKPOINTER_HEADER`].
#[derive(Debug, Clone, Default)]
pub struct MessageHeaders {
    values: HashMap<String, HeaderValue>,
}

impl MessageHeaders {
    /// Create empty headers
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header value
    pub fn insert(&mut self, key: impl Into<String>, value: HeaderValue) {
        self.values.insert(key.into(), value);
    }

    /// Insert a plain text header
    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key, HeaderValue::Text(value.into()));
    }

    /// Get a header value by key
    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.values.get(key)
    }

    /// Get a text header by key
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(HeaderValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Get the checkpointer stored under [`CHECKPOINTER_HEADER`], if any
    pub fn checkpointer(&self) -> Option<Arc<Checkpointer>> {
        match self.values.get(CHECKPOINTER_HEADER) {
            Some(HeaderValue::Checkpointer(checkpointer)) => Some(Arc::clone(checkpointer)),
            _ => None,
        }
    }

    /// Number of headers
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no headers are present
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Application-level view of a received message: headers plus decoded payload
#[derive(Debug, Clone)]
pub struct Envelope {
    pub headers: MessageHeaders,
    pub payload: Payload,
}

impl Envelope {
    /// Create new envelope
    pub fn new(headers: MessageHeaders, payload: Payload) -> Self {
        Self { headers, payload }
    }

    /// Get the checkpointer attached in MANUAL mode, if any
    pub fn checkpointer(&self) -> Option<Arc<Checkpointer>> {
        self.headers.checkpointer()
    }
}

/// Decoded payload of a received envelope
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Raw(Bytes),
    Text(String),
    Json(serde_json::Value),
}

impl Payload {
    /// Get payload as text, if it was decoded as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Get payload as raw bytes, if it was decoded as raw
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Get payload as a JSON value, if it was decoded as JSON
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
