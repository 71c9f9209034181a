//! Queue operations facade orchestrating the receive/checkpoint protocol.

use crate::checkpoint::{CheckpointMode, Checkpointer};
use crate::client::{QueueClientCache, QueueServiceClient};
use crate::converter::{PayloadFormat, StorageQueueMessageConverter};
use crate::error::{ConfigError, QueueError};
use crate::message::{
    Envelope, HeaderValue, Message, MessageHeaders, QueueName, CHECKPOINTER_HEADER,
};
use crate::properties::TemplateProperties;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::info;

/// Visibility timeout applied when none has been configured
pub const DEFAULT_VISIBILITY_TIMEOUT_IN_SECONDS: u32 = 30;

/// Public operations surface over a remote queue service.
///
/// Orchestrates the client cache, the message converter and the checkpointer
/// into the send and receive/checkpoint protocols. One template serves any
/// number of queues; per-queue handles are created lazily and cached.
///
/// The three settings are independent cells that may be updated while
/// receives are in flight. Each receive reads the checkpoint mode exactly
/// once; a read that is torn across *fields* (e.g. new mode, old timeout) is
/// acceptable because each field is independently meaningful.
pub struct QueueTemplate {
    cache: QueueClientCache,
    converter: StorageQueueMessageConverter,
    visibility_timeout_seconds: AtomicU32,
    checkpoint_mode: RwLock<CheckpointMode>,
    payload_format: RwLock<PayloadFormat>,
}

impl QueueTemplate {
    /// Create new template over a queue service backend
    pub fn new(service: Arc<dyn QueueServiceClient>) -> Self {
        let template = Self {
            cache: QueueClientCache::new(service),
            converter: StorageQueueMessageConverter::new(),
            visibility_timeout_seconds: AtomicU32::new(DEFAULT_VISIBILITY_TIMEOUT_IN_SECONDS),
            checkpoint_mode: RwLock::new(CheckpointMode::default()),
            payload_format: RwLock::new(PayloadFormat::default()),
        };

        let properties = template.properties();
        info!(
            visibility_timeout_seconds = properties.visibility_timeout_seconds,
            checkpoint_mode = %properties.checkpoint_mode,
            payload_format = %properties.payload_format,
            "Queue template started"
        );

        template
    }

    /// Create new template and apply a validated properties bag
    pub fn with_properties(
        service: Arc<dyn QueueServiceClient>,
        properties: &TemplateProperties,
    ) -> Result<Self, ConfigError> {
        let template = Self::new(service);
        template.apply_properties(properties)?;
        Ok(template)
    }

    /// Apply a properties bag through the validating setters
    pub fn apply_properties(&self, properties: &TemplateProperties) -> Result<(), ConfigError> {
        self.set_visibility_timeout_seconds(properties.visibility_timeout_seconds)?;
        self.set_checkpoint_mode(properties.checkpoint_mode);
        self.set_payload_format(properties.payload_format);
        Ok(())
    }

    /// Snapshot of the current settings
    pub fn properties(&self) -> TemplateProperties {
        TemplateProperties {
            visibility_timeout_seconds: self.visibility_timeout_seconds(),
            checkpoint_mode: self.checkpoint_mode(),
            payload_format: self.payload_format(),
        }
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Current checkpoint mode
    pub fn checkpoint_mode(&self) -> CheckpointMode {
        *self.checkpoint_mode.read().unwrap()
    }

    /// Replace the checkpoint mode applied to subsequent receives
    pub fn set_checkpoint_mode(&self, mode: CheckpointMode) {
        *self.checkpoint_mode.write().unwrap() = mode;
        info!(checkpoint_mode = %mode, "Queue template checkpoint mode becomes");
    }

    /// Current visibility timeout in seconds
    pub fn visibility_timeout_seconds(&self) -> u32 {
        self.visibility_timeout_seconds.load(Ordering::SeqCst)
    }

    /// Replace the visibility timeout applied to subsequent receives.
    ///
    /// Zero is rejected and the previous value stays in effect.
    pub fn set_visibility_timeout_seconds(&self, seconds: u32) -> Result<(), ConfigError> {
        if seconds == 0 {
            return Err(ConfigError::NonPositiveVisibilityTimeout { seconds: 0 });
        }

        self.visibility_timeout_seconds
            .store(seconds, Ordering::SeqCst);
        info!(
            visibility_timeout_seconds = seconds,
            "Queue template visibility timeout becomes"
        );
        Ok(())
    }

    /// Current payload format
    pub fn payload_format(&self) -> PayloadFormat {
        *self.payload_format.read().unwrap()
    }

    /// Replace the payload format applied to subsequent sends and receives
    pub fn set_payload_format(&self, format: PayloadFormat) {
        *self.payload_format.write().unwrap() = format;
        info!(payload_format = %format, "Queue template payload format becomes");
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Send a message to the named queue.
    ///
    /// Resolves once the remote store has accepted the message, not when it
    /// is delivered. Conversion failures are local and surface before any
    /// remote call.
    pub async fn send(&self, queue_name: &str, message: Message) -> Result<(), QueueError> {
        let queue = QueueName::new(queue_name.to_string())?;
        let body = self.converter.to_wire(&message, self.payload_format())?;

        let client = self.cache.get_or_create(&queue).await?;
        client.send_message(&body).await?;

        Ok(())
    }

    /// Receive at most one message using the configured visibility timeout
    pub async fn receive(&self, queue_name: &str) -> Result<Option<Envelope>, QueueError> {
        let timeout = self.visibility_timeout_seconds();
        self.receive_with_timeout(queue_name, timeout).await
    }

    /// Receive at most one message under a lease of the given length.
    ///
    /// An empty queue resolves to `Ok(None)`. A delivered message is wrapped
    /// as an envelope; in MANUAL mode its headers carry the checkpointer
    /// under [`CHECKPOINTER_HEADER`], in RECORD mode the checkpoint is
    /// triggered automatically and its failure is only observable in logs.
    pub async fn receive_with_timeout(
        &self,
        queue_name: &str,
        visibility_timeout_seconds: u32,
    ) -> Result<Option<Envelope>, QueueError> {
        let queue = QueueName::new(queue_name.to_string())?;
        let client = self.cache.get_or_create(&queue).await?;

        let visibility_timeout = Duration::from_secs(u64::from(visibility_timeout_seconds));
        let leased = match client.receive_message(visibility_timeout).await? {
            Some(leased) => leased,
            None => return Ok(None),
        };

        // The checkpointer exists before the message is handed to the caller,
        // regardless of mode. The mode is read once per receive and captured
        // in the checkpointer for logging.
        let mode = self.checkpoint_mode();
        let checkpointer = Arc::new(Checkpointer::new(Arc::clone(&client), &leased, mode));

        let mut headers = MessageHeaders::new();
        match mode {
            CheckpointMode::Record => {
                // Fire-and-forget: the delete runs on a detached task and the
                // receive resolves without waiting for it. The checkpointer
                // logs the outcome; a failed delete leaves the message to
                // reappear after its lease expires.
                tokio::spawn(async move {
                    let _ = checkpointer.success().await;
                });
            }
            CheckpointMode::Manual => {
                headers.insert(CHECKPOINTER_HEADER, HeaderValue::Checkpointer(checkpointer));
            }
        }

        let envelope = self
            .converter
            .from_wire(&leased.body, headers, self.payload_format())?;

        Ok(Some(envelope))
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
