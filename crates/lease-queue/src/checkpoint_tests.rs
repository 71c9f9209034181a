//! Tests for checkpoint mode and the checkpointer.

use super::*;
use crate::message::{QueueName, Timestamp};
use async_trait::async_trait;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

// ============================================================================
// Test Doubles
// ============================================================================

/// Queue handle double that counts deletes and optionally fails them
struct RecordingClient {
    queue_name: QueueName,
    deletes: AtomicUsize,
    fail_deletes: bool,
}

impl RecordingClient {
    fn new() -> Self {
        Self {
            queue_name: QueueName::new("checkpoint-test".to_string()).unwrap(),
            deletes: AtomicUsize::new(0),
            fail_deletes: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail_deletes: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl StorageQueueClient for RecordingClient {
    fn queue_name(&self) -> &QueueName {
        &self.queue_name
    }

    async fn send_message(&self, _body: &str) -> Result<(), RemoteQueueError> {
        Ok(())
    }

    async fn receive_message(
        &self,
        _visibility_timeout: Duration,
    ) -> Result<Option<LeasedMessage>, RemoteQueueError> {
        Ok(None)
    }

    async fn delete_message(
        &self,
        message_id: &MessageId,
        _pop_receipt: &PopReceipt,
    ) -> Result<(), RemoteQueueError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);

        if self.fail_deletes {
            return Err(RemoteQueueError::Service {
                code: "InternalError".to_string(),
                message: format!("induced delete failure for {message_id}"),
            });
        }

        Ok(())
    }
}

fn leased_message() -> LeasedMessage {
    LeasedMessage {
        message_id: MessageId::new(),
        pop_receipt: PopReceipt::new(),
        body: "payload".to_string(),
        delivery_count: 1,
        next_visible_at: Timestamp::after(Duration::from_secs(30)),
    }
}

// ============================================================================
// CheckpointMode Tests
// ============================================================================

#[test]
fn test_mode_parse_accepts_supported_modes() {
    assert_eq!(
        "RECORD".parse::<CheckpointMode>().unwrap(),
        CheckpointMode::Record
    );
    assert_eq!(
        "manual".parse::<CheckpointMode>().unwrap(),
        CheckpointMode::Manual
    );
}

#[test]
fn test_mode_parse_rejects_unsupported_modes() {
    for unsupported in ["TIME", "BATCH", "PARTITION_COUNT", ""] {
        let error = unsupported.parse::<CheckpointMode>().unwrap_err();
        assert!(matches!(
            error,
            ConfigError::UnsupportedCheckpointMode { .. }
        ));
    }
}

#[test]
fn test_mode_display() {
    assert_eq!(CheckpointMode::Record.to_string(), "RECORD");
    assert_eq!(CheckpointMode::Manual.to_string(), "MANUAL");
}

// ============================================================================
// Checkpointer Tests
// ============================================================================

#[tokio::test]
async fn test_success_issues_exactly_one_delete() {
    // Arrange
    let client = Arc::new(RecordingClient::new());
    let checkpointer = Checkpointer::new(
        Arc::clone(&client) as Arc<dyn StorageQueueClient>,
        &leased_message(),
        CheckpointMode::Manual,
    );

    // Act
    let result = checkpointer.success().await;

    // Assert
    assert!(result.is_ok());
    assert!(checkpointer.is_completed());
    assert_eq!(client.deletes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_second_invocation_does_not_delete_again() {
    // Arrange
    let client = Arc::new(RecordingClient::new());
    let checkpointer = Checkpointer::new(
        Arc::clone(&client) as Arc<dyn StorageQueueClient>,
        &leased_message(),
        CheckpointMode::Manual,
    );

    // Act
    checkpointer.success().await.unwrap();
    let second = checkpointer.success().await;

    // Assert - tolerated, reported as failure, no second delete call
    assert!(matches!(
        second,
        Err(RemoteQueueError::ReceiptInvalid { .. })
    ));
    assert_eq!(client.deletes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_delete_failure_surfaces_without_retry() {
    // Arrange
    let client = Arc::new(RecordingClient::failing());
    let checkpointer = Checkpointer::new(
        Arc::clone(&client) as Arc<dyn StorageQueueClient>,
        &leased_message(),
        CheckpointMode::Manual,
    );

    // Act
    let result = checkpointer.success().await;

    // Assert - one attempt, error propagated to the awaiting caller
    assert!(matches!(result, Err(RemoteQueueError::Service { .. })));
    assert_eq!(client.deletes.load(Ordering::SeqCst), 1);
    assert!(checkpointer.is_completed());
}

#[tokio::test]
async fn test_mode_is_captured_at_construction() {
    // Arrange
    let client = Arc::new(RecordingClient::new());

    // Act
    let checkpointer = Checkpointer::new(
        Arc::clone(&client) as Arc<dyn StorageQueueClient>,
        &leased_message(),
        CheckpointMode::Record,
    );

    // Assert
    assert_eq!(checkpointer.mode(), CheckpointMode::Record);
    assert!(!checkpointer.is_completed());
}
