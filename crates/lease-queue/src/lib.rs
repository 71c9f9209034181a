//! # Lease Queue
//!
//! Client-side abstraction over a remote, at-least-once message queue with a
//! checkpoint/lease protocol for confirming successful processing.
//!
//! This library provides:
//! - A [`QueueTemplate`] facade for sending and receiving messages
//! - RECORD and MANUAL checkpoint modes governing who deletes a leased message
//! - A race-free per-queue client cache with single-winner handle creation
//! - Payload conversion between application messages and wire text
//! - An in-memory queue service for tests and development
//!
//! ## Module Organization
//!
//! - [`error`] - Error types for all queue operations
//! - [`message`] - Message structures, identifiers and envelopes
//! - [`converter`] - Payload formats and wire translation
//! - [`client`] - Remote store traits and the client cache
//! - [`checkpoint`] - Checkpoint mode and the checkpointer
//! - [`template`] - The public operations facade
//! - [`properties`] - Property binding for template settings
//! - [`providers`] - Queue service implementations
//!
//! ## Receiving with manual checkpointing
//!
//! ```
//! use lease_queue::{
//!     CheckpointMode, InMemoryQueueService, Message, PayloadFormat, QueueTemplate,
//! };
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), lease_queue::QueueError> {
//! let template = QueueTemplate::new(Arc::new(InMemoryQueueService::new()));
//! template.set_checkpoint_mode(CheckpointMode::Manual);
//! template.set_payload_format(PayloadFormat::Text);
//!
//! template.send("orders", Message::text("hello")).await?;
//!
//! if let Some(envelope) = template.receive("orders").await? {
//!     // process the payload, then confirm
//!     let checkpointer = envelope.checkpointer().expect("manual mode");
//!     checkpointer.success().await?;
//! }
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod checkpoint;
pub mod client;
pub mod converter;
pub mod error;
pub mod message;
pub mod properties;
pub mod providers;
pub mod template;

// Re-export commonly used types at crate root for convenience
pub use checkpoint::{CheckpointMode, Checkpointer};
pub use client::{QueueClientCache, QueueServiceClient, StorageQueueClient};
pub use converter::{PayloadFormat, StorageQueueMessageConverter};
pub use error::{ConfigError, ConversionError, QueueError, RemoteQueueError, ValidationError};
pub use message::{
    Envelope, HeaderValue, LeasedMessage, Message, MessageHeaders, MessageId, Payload, PopReceipt,
    QueueName, Timestamp, CHECKPOINTER_HEADER,
};
pub use properties::TemplateProperties;
pub use providers::{InMemoryQueueClient, InMemoryQueueService};
pub use template::{QueueTemplate, DEFAULT_VISIBILITY_TIMEOUT_IN_SECONDS};
