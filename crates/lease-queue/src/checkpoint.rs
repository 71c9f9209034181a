//! Checkpoint mode and the deferred delete action for leased messages.

use crate::client::StorageQueueClient;
use crate::error::{ConfigError, RemoteQueueError};
use crate::message::{LeasedMessage, MessageId, PopReceipt};
use serde::Serialize;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Who triggers the delete of a leased message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckpointMode {
    /// The template checkpoints automatically right after receive
    #[default]
    Record,
    /// The caller checkpoints explicitly via the envelope's checkpointer
    Manual,
}

impl std::fmt::Display for CheckpointMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Record => write!(f, "RECORD"),
            Self::Manual => write!(f, "MANUAL"),
        }
    }
}

impl FromStr for CheckpointMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RECORD" => Ok(Self::Record),
            "MANUAL" => Ok(Self::Manual),
            other => Err(ConfigError::UnsupportedCheckpointMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// One-shot deferred delete of a single leased message.
///
/// Bound to exactly one queue handle and one delivery. [`success`] issues the
/// delete-by-lease-token call at most once; a second invocation never reaches
/// the remote store. The checkpoint mode in effect at receive time is captured
/// at construction so log output reflects the mode the message was received
/// under, not a mode set concurrently afterwards.
///
/// [`success`]: Checkpointer::success
pub struct Checkpointer {
    client: Arc<dyn StorageQueueClient>,
    message_id: MessageId,
    pop_receipt: PopReceipt,
    summary: String,
    mode: CheckpointMode,
    completed: AtomicBool,
}

impl Checkpointer {
    /// Create a checkpointer bound to one leased message
    pub fn new(
        client: Arc<dyn StorageQueueClient>,
        leased: &LeasedMessage,
        mode: CheckpointMode,
    ) -> Self {
        Self {
            client,
            message_id: leased.message_id.clone(),
            pop_receipt: leased.pop_receipt.clone(),
            summary: leased.summary(),
            mode,
            completed: AtomicBool::new(false),
        }
    }

    /// Checkpoint mode captured when the message was received
    pub fn mode(&self) -> CheckpointMode {
        self.mode
    }

    /// Identity of the bound message
    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    /// Check whether completion has already been triggered
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    /// Delete the bound message, confirming successful processing.
    ///
    /// Success is logged at debug level including the captured mode; failure
    /// is logged at warn level with the transport error and returned to the
    /// caller without retry. A repeated invocation is tolerated: it issues no
    /// delete and reports [`RemoteQueueError::ReceiptInvalid`].
    pub async fn success(&self) -> Result<(), RemoteQueueError> {
        let queue_name = self.client.queue_name().clone();

        if self.completed.swap(true, Ordering::SeqCst) {
            warn!(
                queue_name = %queue_name,
                message = %self.summary,
                "Checkpointer invoked more than once, delete not re-issued"
            );
            return Err(RemoteQueueError::ReceiptInvalid {
                queue_name: queue_name.as_str().to_string(),
                message_id: self.message_id.as_str().to_string(),
            });
        }

        match self
            .client
            .delete_message(&self.message_id, &self.pop_receipt)
            .await
        {
            Ok(()) => {
                debug!(
                    queue_name = %queue_name,
                    message = %self.summary,
                    mode = %self.mode,
                    "Checkpointed message"
                );
                Ok(())
            }
            Err(error) => {
                warn!(
                    queue_name = %queue_name,
                    message = %self.summary,
                    error = %error,
                    "Failed to checkpoint message"
                );
                Err(error)
            }
        }
    }
}

impl std::fmt::Debug for Checkpointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkpointer")
            .field("queue_name", self.client.queue_name())
            .field("message_id", &self.message_id)
            .field("mode", &self.mode)
            .field("completed", &self.completed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
