//! File-share surface: directories and files inside named shares.

use std::sync::Arc;

use super::backend::ShareBackend;
use super::call::CallOptions;
use super::error::StorageError;
use super::types::ShareEntry;

pub struct ShareClient<B: ?Sized> {
    backend: Arc<B>,
    options: CallOptions,
}

impl<B: ShareBackend + ?Sized> ShareClient<B> {
    pub fn new(backend: Arc<B>, options: CallOptions) -> Self {
        Self { backend, options }
    }

    pub async fn create_share(&self, share: &str) -> Result<(), StorageError> {
        let backend = &*self.backend;
        self.options.call(move || backend.create_share(share)).await
    }

    pub async fn delete_share(&self, share: &str) -> Result<(), StorageError> {
        let backend = &*self.backend;
        self.options.call(move || backend.delete_share(share)).await
    }

    pub async fn list_shares(&self) -> Result<Vec<String>, StorageError> {
        let backend = &*self.backend;
        self.options.call(move || backend.list_shares()).await
    }

    pub async fn create_directory(&self, share: &str, path: &str) -> Result<(), StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.create_directory(share, path))
            .await
    }

    /// Create every missing directory along `path`.
    pub async fn create_directory_all(&self, share: &str, path: &str) -> Result<(), StorageError> {
        let mut current = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(part);
            match self.create_directory(share, &current).await {
                Ok(()) | Err(StorageError::AlreadyExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub async fn upload(&self, share: &str, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.upload_file(share, path, data))
            .await
    }

    pub async fn download(&self, share: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.download_file(share, path))
            .await
    }

    pub async fn delete_file(&self, share: &str, path: &str) -> Result<(), StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.delete_file(share, path))
            .await
    }

    pub async fn list(&self, share: &str, path: &str) -> Result<Vec<ShareEntry>, StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.list_directory(share, path))
            .await
    }
}
