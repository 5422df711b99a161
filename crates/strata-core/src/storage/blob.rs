//! Blob surface: containers of named byte blobs.

use std::sync::Arc;

use super::backend::BlobBackend;
use super::call::CallOptions;
use super::error::StorageError;
use super::types::BlobProperties;

/// Blob client. Every operation goes through the retry loop.
pub struct BlobClient<B: ?Sized> {
    backend: Arc<B>,
    options: CallOptions,
}

impl<B: BlobBackend + ?Sized> BlobClient<B> {
    pub fn new(backend: Arc<B>, options: CallOptions) -> Self {
        Self { backend, options }
    }

    pub async fn create_container(&self, container: &str) -> Result<(), StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.create_container(container))
            .await
    }

    /// Create the container unless it already exists. Returns true when created.
    pub async fn create_container_if_not_exists(
        &self,
        container: &str,
    ) -> Result<bool, StorageError> {
        match self.create_container(container).await {
            Ok(()) => Ok(true),
            Err(StorageError::AlreadyExists(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn delete_container(&self, container: &str) -> Result<(), StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.delete_container(container))
            .await
    }

    pub async fn list_containers(&self) -> Result<Vec<String>, StorageError> {
        let backend = &*self.backend;
        self.options.call(move || backend.list_containers()).await
    }

    pub async fn upload(
        &self,
        container: &str,
        name: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<BlobProperties, StorageError> {
        let backend = &*self.backend;
        let props = self
            .options
            .call(move || backend.put_blob(container, name, data, content_type))
            .await?;
        tracing::debug!(container, blob = name, bytes = data.len(), "blob uploaded");
        Ok(props)
    }

    pub async fn download(&self, container: &str, name: &str) -> Result<Vec<u8>, StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.get_blob(container, name))
            .await
    }

    pub async fn properties(
        &self,
        container: &str,
        name: &str,
    ) -> Result<BlobProperties, StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.blob_properties(container, name))
            .await
    }

    /// True when the blob exists. Other failures still propagate.
    pub async fn exists(&self, container: &str, name: &str) -> Result<bool, StorageError> {
        match self.properties(container, name).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn delete(&self, container: &str, name: &str) -> Result<(), StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.delete_blob(container, name))
            .await
    }

    pub async fn list(
        &self,
        container: &str,
        prefix: Option<&str>,
    ) -> Result<Vec<BlobProperties>, StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.list_blobs(container, prefix))
            .await
    }
}
