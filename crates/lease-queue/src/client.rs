//! Remote store traits and the per-queue client cache.

use crate::error::RemoteQueueError;
use crate::message::{LeasedMessage, MessageId, PopReceipt, QueueName};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OnceCell, RwLock};

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Handle to a single remote queue.
///
/// Implementations wrap one queue of the remote store and remap their native
/// transport errors into [`RemoteQueueError`] before returning.
#[async_trait]
pub trait StorageQueueClient: Send + Sync {
    /// Name of the queue this handle is bound to
    fn queue_name(&self) -> &QueueName;

    /// Submit wire text to the queue; resolves when the store accepts it
    async fn send_message(&self, body: &str) -> Result<(), RemoteQueueError>;

    /// Receive at most one message under a visibility lease.
    ///
    /// An empty queue is a legitimate outcome and yields `Ok(None)`.
    async fn receive_message(
        &self,
        visibility_timeout: Duration,
    ) -> Result<Option<LeasedMessage>, RemoteQueueError>;

    /// Delete a leased message by its lease token
    async fn delete_message(
        &self,
        message_id: &MessageId,
        pop_receipt: &PopReceipt,
    ) -> Result<(), RemoteQueueError>;
}

/// Factory for per-queue handles, implemented by the queue service backend.
///
/// Creation may perform a remote existence/creation call for a brand-new
/// queue name.
#[async_trait]
pub trait QueueServiceClient: Send + Sync {
    /// Create a handle for the given queue
    async fn create_queue_client(
        &self,
        queue: &QueueName,
    ) -> Result<Arc<dyn StorageQueueClient>, RemoteQueueError>;
}

type ClientSlot = Arc<OnceCell<Arc<dyn StorageQueueClient>>>;

/// Process-lifetime cache of one remote-queue handle per queue name.
///
/// Lookups for already-created handles take a read lock only. A previously
/// unseen name inserts an empty per-name slot under a briefly-held write lock;
/// the remote creation call itself runs outside the map locks, so creating a
/// handle for one queue never serializes callers working on other queues.
/// The slot guarantees a single winner: concurrent first-time callers observe
/// exactly one underlying creation call. A failed creation leaves the slot
/// empty, so no broken handle is retained and a later call retries.
pub struct QueueClientCache {
    service: Arc<dyn QueueServiceClient>,
    clients: RwLock<HashMap<QueueName, ClientSlot>>,
}

impl QueueClientCache {
    /// Create new cache over a queue service backend
    pub fn new(service: Arc<dyn QueueServiceClient>) -> Self {
        Self {
            service,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Get the cached handle for a queue, creating it on first reference.
    ///
    /// Returns the same handle for the same name across repeated and
    /// concurrent calls. Creation failure propagates to the caller.
    pub async fn get_or_create(
        &self,
        queue: &QueueName,
    ) -> Result<Arc<dyn StorageQueueClient>, RemoteQueueError> {
        let slot = {
            let clients = self.clients.read().await;
            clients.get(queue).cloned()
        };

        let slot = match slot {
            Some(slot) => slot,
            None => {
                let mut clients = self.clients.write().await;
                Arc::clone(
                    clients
                        .entry(queue.clone())
                        .or_insert_with(|| Arc::new(OnceCell::new())),
                )
            }
        };

        let client = slot
            .get_or_try_init(|| self.service.create_queue_client(queue))
            .await?;

        Ok(Arc::clone(client))
    }

    /// Number of queue names referenced so far (created or pending)
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }
}
