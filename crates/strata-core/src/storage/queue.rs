//! Queue surface.

use std::sync::Arc;
use std::time::Duration;

use super::backend::QueueBackend;
use super::call::CallOptions;
use super::error::StorageError;
use super::types::QueueMessage;

/// Visibility timeout used by [`QueueClient::receive`].
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);

pub struct QueueClient<B: ?Sized> {
    backend: Arc<B>,
    options: CallOptions,
}

impl<B: QueueBackend + ?Sized> QueueClient<B> {
    pub fn new(backend: Arc<B>, options: CallOptions) -> Self {
        Self { backend, options }
    }

    pub async fn create_queue(&self, queue: &str) -> Result<(), StorageError> {
        let backend = &*self.backend;
        self.options.call(move || backend.create_queue(queue)).await
    }

    pub async fn delete_queue(&self, queue: &str) -> Result<(), StorageError> {
        let backend = &*self.backend;
        self.options.call(move || backend.delete_queue(queue)).await
    }

    pub async fn list_queues(&self) -> Result<Vec<String>, StorageError> {
        let backend = &*self.backend;
        self.options.call(move || backend.list_queues()).await
    }

    pub async fn send(&self, queue: &str, body: &str) -> Result<QueueMessage, StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.send_message(queue, body))
            .await
    }

    /// Receive up to `max` messages with the default visibility timeout.
    pub async fn receive(&self, queue: &str, max: u32) -> Result<Vec<QueueMessage>, StorageError> {
        self.receive_with_timeout(queue, max, DEFAULT_VISIBILITY_TIMEOUT)
            .await
    }

    pub async fn receive_with_timeout(
        &self,
        queue: &str,
        max: u32,
        visibility_timeout: Duration,
    ) -> Result<Vec<QueueMessage>, StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.receive_messages(queue, max, visibility_timeout))
            .await
    }

    pub async fn peek(&self, queue: &str, max: u32) -> Result<Vec<QueueMessage>, StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.peek_messages(queue, max))
            .await
    }

    /// Delete a received message. Fails with not-found if the receipt is stale.
    pub async fn delete_message(
        &self,
        queue: &str,
        message_id: &str,
        pop_receipt: &str,
    ) -> Result<(), StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.delete_message(queue, message_id, pop_receipt))
            .await
    }

    pub async fn clear(&self, queue: &str) -> Result<(), StorageError> {
        let backend = &*self.backend;
        self.options.call(move || backend.clear_messages(queue)).await
    }
}
