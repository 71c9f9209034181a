//! In-memory queue service implementation for testing and development.
//!
//! This module provides a fully functional process-local queue store that:
//! - Auto-creates queues on first reference
//! - Implements visibility timeouts with redelivery
//! - Rotates the pop receipt on every delivery
//! - Validates lease tokens on delete
//! - Provides thread-safe concurrent access

use crate::client::{QueueServiceClient, StorageQueueClient};
use crate::error::RemoteQueueError;
use crate::message::{LeasedMessage, MessageId, PopReceipt, QueueName, Timestamp};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

// ============================================================================
// Internal Storage Structures
// ============================================================================

/// Thread-safe storage for all queues
#[derive(Default)]
struct QueueStorage {
    queues: HashMap<QueueName, InMemoryQueue>,
}

impl QueueStorage {
    /// Get or create a queue
    fn get_or_create_queue(&mut self, queue_name: &QueueName) -> &mut InMemoryQueue {
        self.queues.entry(queue_name.clone()).or_default()
    }
}

/// Internal state for a single queue (FIFO order)
#[derive(Default)]
struct InMemoryQueue {
    messages: VecDeque<StoredMessage>,
}

/// A message stored in the queue with delivery metadata
struct StoredMessage {
    message_id: MessageId,
    body: String,
    delivery_count: u32,
    visible_at: Timestamp,
    pop_receipt: Option<PopReceipt>,
}

impl StoredMessage {
    fn new(body: String) -> Self {
        Self {
            message_id: MessageId::new(),
            body,
            delivery_count: 0,
            visible_at: Timestamp::now(),
            pop_receipt: None,
        }
    }

    /// Check if message is available for receiving
    fn is_available(&self) -> bool {
        Timestamp::now() >= self.visible_at
    }
}

// ============================================================================
// InMemoryQueueService
// ============================================================================

/// In-memory queue service backend.
///
/// Handles created by [`create_queue_client`] share this service's storage,
/// so a template wired to one service instance observes a single consistent
/// store across all its queues.
///
/// [`create_queue_client`]: QueueServiceClient::create_queue_client
#[derive(Default)]
pub struct InMemoryQueueService {
    storage: Arc<RwLock<QueueStorage>>,
}

impl InMemoryQueueService {
    /// Create new in-memory queue service
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages currently stored in a queue, leased or not.
    ///
    /// Intended for tests asserting on checkpoint effects.
    pub fn message_count(&self, queue_name: &QueueName) -> usize {
        let storage = self.storage.read().unwrap();
        storage
            .queues
            .get(queue_name)
            .map(|queue| queue.messages.len())
            .unwrap_or(0)
    }

    /// Check whether a queue has been created
    pub fn queue_exists(&self, queue_name: &QueueName) -> bool {
        self.storage.read().unwrap().queues.contains_key(queue_name)
    }
}

#[async_trait]
impl QueueServiceClient for InMemoryQueueService {
    async fn create_queue_client(
        &self,
        queue: &QueueName,
    ) -> Result<Arc<dyn StorageQueueClient>, RemoteQueueError> {
        // Mirrors the remote existence/creation call of a real store.
        self.storage.write().unwrap().get_or_create_queue(queue);

        Ok(Arc::new(InMemoryQueueClient {
            queue_name: queue.clone(),
            storage: Arc::clone(&self.storage),
        }))
    }
}

// ============================================================================
// InMemoryQueueClient
// ============================================================================

/// Handle to a single queue of an [`InMemoryQueueService`]
pub struct InMemoryQueueClient {
    queue_name: QueueName,
    storage: Arc<RwLock<QueueStorage>>,
}

#[async_trait]
impl StorageQueueClient for InMemoryQueueClient {
    fn queue_name(&self) -> &QueueName {
        &self.queue_name
    }

    async fn send_message(&self, body: &str) -> Result<(), RemoteQueueError> {
        let mut storage = self.storage.write().unwrap();
        let queue = storage.get_or_create_queue(&self.queue_name);
        queue.messages.push_back(StoredMessage::new(body.to_string()));

        Ok(())
    }

    async fn receive_message(
        &self,
        visibility_timeout: Duration,
    ) -> Result<Option<LeasedMessage>, RemoteQueueError> {
        let mut storage = self.storage.write().unwrap();
        let queue = storage.get_or_create_queue(&self.queue_name);

        let Some(stored) = queue.messages.iter_mut().find(|m| m.is_available()) else {
            return Ok(None);
        };

        // Deliver under a fresh lease: hide the message and rotate the pop
        // receipt so receipts from earlier deliveries can no longer delete it.
        stored.delivery_count += 1;
        stored.visible_at = Timestamp::after(visibility_timeout);
        let pop_receipt = PopReceipt::new();
        stored.pop_receipt = Some(pop_receipt.clone());

        Ok(Some(LeasedMessage {
            message_id: stored.message_id.clone(),
            pop_receipt,
            body: stored.body.clone(),
            delivery_count: stored.delivery_count,
            next_visible_at: stored.visible_at.clone(),
        }))
    }

    async fn delete_message(
        &self,
        message_id: &MessageId,
        pop_receipt: &PopReceipt,
    ) -> Result<(), RemoteQueueError> {
        let mut storage = self.storage.write().unwrap();
        let queue = storage.get_or_create_queue(&self.queue_name);

        let position = queue.messages.iter().position(|m| {
            &m.message_id == message_id && m.pop_receipt.as_ref() == Some(pop_receipt)
        });

        match position {
            Some(index) => {
                queue.messages.remove(index);
                Ok(())
            }
            None => Err(RemoteQueueError::ReceiptInvalid {
                queue_name: self.queue_name.as_str().to_string(),
                message_id: message_id.as_str().to_string(),
            }),
        }
    }
}
