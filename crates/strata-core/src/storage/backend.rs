//! Backend seam: the raw remote operations each storage surface delegates to.
//!
//! Implementations talk to the actual store and report failures as
//! [`RemoteError`]s; retrying and error translation happen in the clients.

use std::time::Duration;

use async_trait::async_trait;

use super::types::{BlobProperties, IfMatch, QueueMessage, ShareEntry};
use crate::entity::PropertyBag;
use crate::retry::RemoteError;

pub type RemoteResult<T> = Result<T, RemoteError>;

#[async_trait]
pub trait BlobBackend: Send + Sync {
    async fn create_container(&self, container: &str) -> RemoteResult<()>;
    async fn delete_container(&self, container: &str) -> RemoteResult<()>;
    async fn list_containers(&self) -> RemoteResult<Vec<String>>;
    async fn put_blob(
        &self,
        container: &str,
        name: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> RemoteResult<BlobProperties>;
    async fn get_blob(&self, container: &str, name: &str) -> RemoteResult<Vec<u8>>;
    async fn blob_properties(&self, container: &str, name: &str) -> RemoteResult<BlobProperties>;
    async fn delete_blob(&self, container: &str, name: &str) -> RemoteResult<()>;
    async fn list_blobs(
        &self,
        container: &str,
        prefix: Option<&str>,
    ) -> RemoteResult<Vec<BlobProperties>>;
}

#[async_trait]
pub trait QueueBackend: Send + Sync {
    async fn create_queue(&self, queue: &str) -> RemoteResult<()>;
    async fn delete_queue(&self, queue: &str) -> RemoteResult<()>;
    async fn list_queues(&self) -> RemoteResult<Vec<String>>;
    async fn send_message(&self, queue: &str, body: &str) -> RemoteResult<QueueMessage>;
    /// Up to `max` visible messages, hidden for `visibility_timeout` afterwards.
    async fn receive_messages(
        &self,
        queue: &str,
        max: u32,
        visibility_timeout: Duration,
    ) -> RemoteResult<Vec<QueueMessage>>;
    async fn peek_messages(&self, queue: &str, max: u32) -> RemoteResult<Vec<QueueMessage>>;
    async fn delete_message(
        &self,
        queue: &str,
        message_id: &str,
        pop_receipt: &str,
    ) -> RemoteResult<()>;
    async fn clear_messages(&self, queue: &str) -> RemoteResult<()>;
}

#[async_trait]
pub trait TableBackend: Send + Sync {
    async fn create_table(&self, table: &str) -> RemoteResult<()>;
    async fn delete_table(&self, table: &str) -> RemoteResult<()>;
    async fn list_tables(&self) -> RemoteResult<Vec<String>>;
    /// Fails with 409 when the entity exists. Returns the stored bag (with timestamp and etag).
    async fn insert_entity(&self, table: &str, entity: &PropertyBag) -> RemoteResult<PropertyBag>;
    async fn upsert_entity(&self, table: &str, entity: &PropertyBag) -> RemoteResult<PropertyBag>;
    /// Fails with 404 when absent and 412 when `if_match` does not hold.
    async fn update_entity(
        &self,
        table: &str,
        entity: &PropertyBag,
        if_match: &IfMatch,
    ) -> RemoteResult<PropertyBag>;
    async fn get_entity(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> RemoteResult<PropertyBag>;
    async fn query_partition(&self, table: &str, partition_key: &str)
        -> RemoteResult<Vec<PropertyBag>>;
    async fn delete_entity(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
        if_match: &IfMatch,
    ) -> RemoteResult<()>;
}

#[async_trait]
pub trait ShareBackend: Send + Sync {
    async fn create_share(&self, share: &str) -> RemoteResult<()>;
    async fn delete_share(&self, share: &str) -> RemoteResult<()>;
    async fn list_shares(&self) -> RemoteResult<Vec<String>>;
    /// `path` is `/`-separated; the parent directory must exist.
    async fn create_directory(&self, share: &str, path: &str) -> RemoteResult<()>;
    async fn upload_file(&self, share: &str, path: &str, data: &[u8]) -> RemoteResult<()>;
    async fn download_file(&self, share: &str, path: &str) -> RemoteResult<Vec<u8>>;
    async fn delete_file(&self, share: &str, path: &str) -> RemoteResult<()>;
    /// `path` of `""` lists the share root.
    async fn list_directory(&self, share: &str, path: &str) -> RemoteResult<Vec<ShareEntry>>;
}
