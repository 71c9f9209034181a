//! Common test utilities for lease-queue integration tests
//!
//! This module provides:
//! - A recording queue service that counts remote calls
//! - A flaky queue service that fails handle creation on demand
//! - Helpers for building templates wired to the in-memory store

// Each test binary uses a different subset of these utilities.
#![allow(dead_code)]

use async_trait::async_trait;
use lease_queue::{
    InMemoryQueueService, LeasedMessage, MessageId, PayloadFormat, PopReceipt, QueueName,
    QueueServiceClient, QueueTemplate, RemoteQueueError, StorageQueueClient,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Recording Queue Service
// ============================================================================

/// Counters shared between a recording service and its handles
#[derive(Default)]
pub struct RemoteCallCounters {
    pub creations: AtomicUsize,
    pub sends: AtomicUsize,
    pub receives: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl RemoteCallCounters {
    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn receives(&self) -> usize {
        self.receives.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

/// Queue service wrapper that records every remote call made through it
pub struct RecordingQueueService {
    inner: InMemoryQueueService,
    counters: Arc<RemoteCallCounters>,
}

impl RecordingQueueService {
    pub fn new() -> Self {
        Self {
            inner: InMemoryQueueService::new(),
            counters: Arc::new(RemoteCallCounters::default()),
        }
    }

    pub fn counters(&self) -> Arc<RemoteCallCounters> {
        Arc::clone(&self.counters)
    }

    pub fn message_count(&self, queue_name: &QueueName) -> usize {
        self.inner.message_count(queue_name)
    }
}

#[async_trait]
impl QueueServiceClient for RecordingQueueService {
    async fn create_queue_client(
        &self,
        queue: &QueueName,
    ) -> Result<Arc<dyn StorageQueueClient>, RemoteQueueError> {
        self.counters.creations.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.create_queue_client(queue).await?;

        Ok(Arc::new(RecordingQueueClient {
            inner,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct RecordingQueueClient {
    inner: Arc<dyn StorageQueueClient>,
    counters: Arc<RemoteCallCounters>,
}

#[async_trait]
impl StorageQueueClient for RecordingQueueClient {
    fn queue_name(&self) -> &QueueName {
        self.inner.queue_name()
    }

    async fn send_message(&self, body: &str) -> Result<(), RemoteQueueError> {
        self.counters.sends.fetch_add(1, Ordering::SeqCst);
        self.inner.send_message(body).await
    }

    async fn receive_message(
        &self,
        visibility_timeout: Duration,
    ) -> Result<Option<LeasedMessage>, RemoteQueueError> {
        self.counters.receives.fetch_add(1, Ordering::SeqCst);
        self.inner.receive_message(visibility_timeout).await
    }

    async fn delete_message(
        &self,
        message_id: &MessageId,
        pop_receipt: &PopReceipt,
    ) -> Result<(), RemoteQueueError> {
        self.counters.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_message(message_id, pop_receipt).await
    }
}

// ============================================================================
// Flaky Queue Service
// ============================================================================

/// Queue service that fails the first N handle creations
pub struct FlakyQueueService {
    inner: InMemoryQueueService,
    fail_remaining: AtomicUsize,
    pub creations: AtomicUsize,
}

impl FlakyQueueService {
    pub fn failing_first(failures: usize) -> Self {
        Self {
            inner: InMemoryQueueService::new(),
            fail_remaining: AtomicUsize::new(failures),
            creations: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl QueueServiceClient for FlakyQueueService {
    async fn create_queue_client(
        &self,
        queue: &QueueName,
    ) -> Result<Arc<dyn StorageQueueClient>, RemoteQueueError> {
        self.creations.fetch_add(1, Ordering::SeqCst);

        if self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
        {
            return Err(RemoteQueueError::Connection {
                message: "induced creation failure".to_string(),
            });
        }

        self.inner.create_queue_client(queue).await
    }
}

// ============================================================================
// Template Builders
// ============================================================================

/// Build a text-payload template over a recording service
pub fn recording_template() -> (QueueTemplate, Arc<RecordingQueueService>) {
    let service = Arc::new(RecordingQueueService::new());
    let template = QueueTemplate::new(Arc::clone(&service) as Arc<dyn QueueServiceClient>);
    template.set_payload_format(PayloadFormat::Text);

    (template, service)
}

/// Parse a queue name for assertions against the store
pub fn queue(name: &str) -> QueueName {
    QueueName::new(name.to_string()).unwrap()
}

/// Install a test tracing subscriber once per test binary.
///
/// RECORD-mode checkpoint outcomes are observable only through logs, so tests
/// exercising that path capture them for debugging.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lease_queue=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
