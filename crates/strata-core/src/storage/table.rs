//! Table surface: typed entities over property bags.

use std::sync::Arc;

use super::backend::TableBackend;
use super::call::CallOptions;
use super::error::StorageError;
use super::types::IfMatch;
use crate::entity::{from_bag, to_bag, PropertyBag, TableEntity};

pub struct TableClient<B: ?Sized> {
    backend: Arc<B>,
    options: CallOptions,
}

impl<B: TableBackend + ?Sized> TableClient<B> {
    pub fn new(backend: Arc<B>, options: CallOptions) -> Self {
        Self { backend, options }
    }

    pub async fn create_table(&self, table: &str) -> Result<(), StorageError> {
        let backend = &*self.backend;
        self.options.call(move || backend.create_table(table)).await
    }

    pub async fn delete_table(&self, table: &str) -> Result<(), StorageError> {
        let backend = &*self.backend;
        self.options.call(move || backend.delete_table(table)).await
    }

    pub async fn list_tables(&self) -> Result<Vec<String>, StorageError> {
        let backend = &*self.backend;
        self.options.call(move || backend.list_tables()).await
    }

    /// Insert a new entity; returns its ETag.
    pub async fn insert<T: TableEntity>(
        &self,
        table: &str,
        entity: &T,
    ) -> Result<String, StorageError> {
        let stored = self.insert_bag(table, &to_bag(entity)).await?;
        Ok(stored.etag().unwrap_or_default().to_owned())
    }

    /// Insert or replace; returns the new ETag.
    pub async fn upsert<T: TableEntity>(
        &self,
        table: &str,
        entity: &T,
    ) -> Result<String, StorageError> {
        let stored = self.upsert_bag(table, &to_bag(entity)).await?;
        Ok(stored.etag().unwrap_or_default().to_owned())
    }

    /// Replace an existing entity if its stored ETag still matches the one
    /// the record was read with (or unconditionally when it carries none).
    pub async fn update<T: TableEntity>(
        &self,
        table: &str,
        entity: &T,
    ) -> Result<String, StorageError> {
        let if_match = entity
            .etag()
            .map(IfMatch::from_header)
            .unwrap_or(IfMatch::Any);
        let stored = self.update_bag(table, &to_bag(entity), &if_match).await?;
        Ok(stored.etag().unwrap_or_default().to_owned())
    }

    pub async fn get<T: TableEntity>(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<T, StorageError> {
        let bag = self.get_bag(table, partition_key, row_key).await?;
        Ok(from_bag(&bag)?)
    }

    /// All entities of one partition, ordered by row key.
    pub async fn query_partition<T: TableEntity>(
        &self,
        table: &str,
        partition_key: &str,
    ) -> Result<Vec<T>, StorageError> {
        let bags = self.query_partition_bags(table, partition_key).await?;
        bags.iter()
            .map(|b| from_bag(b).map_err(StorageError::from))
            .collect()
    }

    pub async fn delete(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
        if_match: &IfMatch,
    ) -> Result<(), StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.delete_entity(table, partition_key, row_key, if_match))
            .await
    }

    pub async fn insert_bag(
        &self,
        table: &str,
        bag: &PropertyBag,
    ) -> Result<PropertyBag, StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.insert_entity(table, bag))
            .await
    }

    pub async fn upsert_bag(
        &self,
        table: &str,
        bag: &PropertyBag,
    ) -> Result<PropertyBag, StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.upsert_entity(table, bag))
            .await
    }

    pub async fn update_bag(
        &self,
        table: &str,
        bag: &PropertyBag,
        if_match: &IfMatch,
    ) -> Result<PropertyBag, StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.update_entity(table, bag, if_match))
            .await
    }

    pub async fn get_bag(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<PropertyBag, StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.get_entity(table, partition_key, row_key))
            .await
    }

    pub async fn query_partition_bags(
        &self,
        table: &str,
        partition_key: &str,
    ) -> Result<Vec<PropertyBag>, StorageError> {
        let backend = &*self.backend;
        self.options
            .call(move || backend.query_partition(table, partition_key))
            .await
    }
}
