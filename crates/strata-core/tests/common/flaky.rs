//! Backend wrapper that fails the first N calls before delegating.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use strata_core::entity::PropertyBag;
use strata_core::retry::RemoteError;
use strata_core::storage::{
    BlobBackend, BlobProperties, IfMatch, RemoteResult, TableBackend,
};

/// Failure handed out while the fault budget lasts.
pub type FaultFn = fn() -> RemoteError;

pub fn server_busy() -> RemoteError {
    RemoteError::with_status(503, "ServerBusy", "injected: server busy")
}

pub fn bad_request() -> RemoteError {
    RemoteError::with_status(400, "InvalidInput", "injected: bad request")
}

pub fn internal_error() -> RemoteError {
    RemoteError::with_status(500, "InternalError", "injected: internal error")
}

pub fn connection_reset() -> RemoteError {
    RemoteError::new("injected: connection reset").with_source(std::io::Error::from(
        std::io::ErrorKind::ConnectionReset,
    ))
}

pub struct Flaky<B> {
    inner: Arc<B>,
    failures_left: AtomicU32,
    calls: AtomicU32,
    fault: FaultFn,
}

impl<B> Flaky<B> {
    pub fn new(inner: Arc<B>, failures: u32, fault: FaultFn) -> Self {
        Self {
            inner,
            failures_left: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
            fault,
        }
    }

    /// Total invocations, failed or not.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Re-arm the fault budget (e.g. after setup calls).
    pub fn fail_next(&self, failures: u32) {
        self.failures_left.store(failures, Ordering::SeqCst);
        self.calls.store(0, Ordering::SeqCst);
    }

    fn inject(&self) -> RemoteResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let took = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match took {
            Ok(_) => Err((self.fault)()),
            Err(_) => Ok(()),
        }
    }
}

#[async_trait]
impl<B: BlobBackend> BlobBackend for Flaky<B> {
    async fn create_container(&self, container: &str) -> RemoteResult<()> {
        self.inject()?;
        self.inner.create_container(container).await
    }

    async fn delete_container(&self, container: &str) -> RemoteResult<()> {
        self.inject()?;
        self.inner.delete_container(container).await
    }

    async fn list_containers(&self) -> RemoteResult<Vec<String>> {
        self.inject()?;
        self.inner.list_containers().await
    }

    async fn put_blob(
        &self,
        container: &str,
        name: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> RemoteResult<BlobProperties> {
        self.inject()?;
        self.inner.put_blob(container, name, data, content_type).await
    }

    async fn get_blob(&self, container: &str, name: &str) -> RemoteResult<Vec<u8>> {
        self.inject()?;
        self.inner.get_blob(container, name).await
    }

    async fn blob_properties(&self, container: &str, name: &str) -> RemoteResult<BlobProperties> {
        self.inject()?;
        self.inner.blob_properties(container, name).await
    }

    async fn delete_blob(&self, container: &str, name: &str) -> RemoteResult<()> {
        self.inject()?;
        self.inner.delete_blob(container, name).await
    }

    async fn list_blobs(
        &self,
        container: &str,
        prefix: Option<&str>,
    ) -> RemoteResult<Vec<BlobProperties>> {
        self.inject()?;
        self.inner.list_blobs(container, prefix).await
    }
}

#[async_trait]
impl<B: TableBackend> TableBackend for Flaky<B> {
    async fn create_table(&self, table: &str) -> RemoteResult<()> {
        self.inject()?;
        self.inner.create_table(table).await
    }

    async fn delete_table(&self, table: &str) -> RemoteResult<()> {
        self.inject()?;
        self.inner.delete_table(table).await
    }

    async fn list_tables(&self) -> RemoteResult<Vec<String>> {
        self.inject()?;
        self.inner.list_tables().await
    }

    async fn insert_entity(&self, table: &str, entity: &PropertyBag) -> RemoteResult<PropertyBag> {
        self.inject()?;
        self.inner.insert_entity(table, entity).await
    }

    async fn upsert_entity(&self, table: &str, entity: &PropertyBag) -> RemoteResult<PropertyBag> {
        self.inject()?;
        self.inner.upsert_entity(table, entity).await
    }

    async fn update_entity(
        &self,
        table: &str,
        entity: &PropertyBag,
        if_match: &IfMatch,
    ) -> RemoteResult<PropertyBag> {
        self.inject()?;
        self.inner.update_entity(table, entity, if_match).await
    }

    async fn get_entity(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> RemoteResult<PropertyBag> {
        self.inject()?;
        self.inner.get_entity(table, partition_key, row_key).await
    }

    async fn query_partition(
        &self,
        table: &str,
        partition_key: &str,
    ) -> RemoteResult<Vec<PropertyBag>> {
        self.inject()?;
        self.inner.query_partition(table, partition_key).await
    }

    async fn delete_entity(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
        if_match: &IfMatch,
    ) -> RemoteResult<()> {
        self.inject()?;
        self.inner
            .delete_entity(table, partition_key, row_key, if_match)
            .await
    }
}
