//! Table surface of the emulator.
//!
//! Entities are stored as their JSON wire form minus the system metadata;
//! the etag and timestamp live in their own columns.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::db::{from_millis, now_millis, Emulator};
use super::error::{
    already_exists, check_entity_key, check_table_name, condition_not_met, not_found,
};
use crate::entity::PropertyBag;
use crate::retry::RemoteError;
use crate::storage::{IfMatch, RemoteResult, TableBackend};

fn new_etag() -> (String, i64) {
    let now = Utc::now();
    let etag = format!(
        "W/\"datetime'{}'\"",
        now.to_rfc3339_opts(SecondsFormat::Nanos, true)
    );
    (etag, now.timestamp_millis())
}

fn stored_json(entity: &PropertyBag) -> String {
    let mut bare = entity.clone();
    bare.set_etag(None);
    bare.set_timestamp(None);
    bare.to_json_string()
}

fn entity_from_row(row: &SqliteRow) -> RemoteResult<PropertyBag> {
    let json: String = row.get("properties_json");
    let mut bag = PropertyBag::from_json_str(&json).map_err(|e| {
        RemoteError::with_status(500, "InternalError", "stored entity is corrupt").with_source(e)
    })?;
    bag.set_etag(Some(row.get("etag")));
    bag.set_timestamp(Some(from_millis(row.get("timestamp"))));
    Ok(bag)
}

fn entity_label(table: &str, pk: &str, rk: &str) -> String {
    format!("entity ({pk}, {rk}) in table '{table}'")
}

fn check_keys(entity: &PropertyBag) -> RemoteResult<()> {
    check_entity_key("PartitionKey", entity.partition_key())?;
    check_entity_key("RowKey", entity.row_key())
}

impl Emulator {
    async fn table_exists(&self, table: &str) -> RemoteResult<bool> {
        let row = sqlx::query("SELECT 1 FROM tables WHERE name = ?1")
            .bind(table)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn require_table(&self, table: &str) -> RemoteResult<()> {
        if self.table_exists(table).await? {
            Ok(())
        } else {
            Err(not_found("TableNotFound", format!("table '{table}'")))
        }
    }

    async fn current_etag(&self, table: &str, pk: &str, rk: &str) -> RemoteResult<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT etag FROM entities
            WHERE table_name = ?1 AND partition_key = ?2 AND row_key = ?3
            "#,
        )
        .bind(table)
        .bind(pk)
        .bind(rk)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get("etag")))
    }

    async fn write_entity(&self, table: &str, entity: &PropertyBag) -> RemoteResult<PropertyBag> {
        let (etag, ts) = new_etag();
        sqlx::query(
            r#"
            INSERT INTO entities
                (table_name, partition_key, row_key, properties_json, etag, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (table_name, partition_key, row_key) DO UPDATE SET
                properties_json = excluded.properties_json,
                etag = excluded.etag,
                timestamp = excluded.timestamp
            "#,
        )
        .bind(table)
        .bind(entity.partition_key())
        .bind(entity.row_key())
        .bind(stored_json(entity))
        .bind(&etag)
        .bind(ts)
        .execute(&self.pool)
        .await?;
        let mut stored = entity.clone();
        stored.set_etag(Some(etag));
        stored.set_timestamp(Some(from_millis(ts)));
        Ok(stored)
    }
}

#[async_trait]
impl TableBackend for Emulator {
    async fn create_table(&self, table: &str) -> RemoteResult<()> {
        check_table_name(table)?;
        if self.table_exists(table).await? {
            return Err(already_exists("TableAlreadyExists", format!("table '{table}'")));
        }
        sqlx::query("INSERT INTO tables (name, created_at) VALUES (?1, ?2)")
            .bind(table)
            .bind(now_millis())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_table(&self, table: &str) -> RemoteResult<()> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM tables WHERE name = ?1")
            .bind(table)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(not_found("TableNotFound", format!("table '{table}'")));
        }
        sqlx::query("DELETE FROM entities WHERE table_name = ?1")
            .bind(table)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_tables(&self) -> RemoteResult<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM tables ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|r| r.get("name")).collect())
    }

    async fn insert_entity(&self, table: &str, entity: &PropertyBag) -> RemoteResult<PropertyBag> {
        check_keys(entity)?;
        self.require_table(table).await?;
        let (pk, rk) = (entity.partition_key(), entity.row_key());
        if self.current_etag(table, pk, rk).await?.is_some() {
            return Err(already_exists(
                "EntityAlreadyExists",
                entity_label(table, pk, rk),
            ));
        }
        self.write_entity(table, entity).await
    }

    async fn upsert_entity(&self, table: &str, entity: &PropertyBag) -> RemoteResult<PropertyBag> {
        check_keys(entity)?;
        self.require_table(table).await?;
        self.write_entity(table, entity).await
    }

    async fn update_entity(
        &self,
        table: &str,
        entity: &PropertyBag,
        if_match: &IfMatch,
    ) -> RemoteResult<PropertyBag> {
        check_keys(entity)?;
        self.require_table(table).await?;
        let (pk, rk) = (entity.partition_key(), entity.row_key());
        let label = entity_label(table, pk, rk);
        let current = self
            .current_etag(table, pk, rk)
            .await?
            .ok_or_else(|| not_found("ResourceNotFound", &label))?;
        if !if_match.matches(&current) {
            return Err(condition_not_met(&label));
        }

        let (etag, ts) = new_etag();
        let updated = sqlx::query(
            r#"
            UPDATE entities SET properties_json = ?1, etag = ?2, timestamp = ?3
            WHERE table_name = ?4 AND partition_key = ?5 AND row_key = ?6 AND etag = ?7
            "#,
        )
        .bind(stored_json(entity))
        .bind(&etag)
        .bind(ts)
        .bind(table)
        .bind(pk)
        .bind(rk)
        .bind(&current)
        .execute(&self.pool)
        .await?
        .rows_affected();
        if updated == 0 {
            // Another writer got in between the read and the update.
            return Err(condition_not_met(&label));
        }
        let mut stored = entity.clone();
        stored.set_etag(Some(etag));
        stored.set_timestamp(Some(from_millis(ts)));
        Ok(stored)
    }

    async fn get_entity(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> RemoteResult<PropertyBag> {
        self.require_table(table).await?;
        let row = sqlx::query(
            r#"
            SELECT properties_json, etag, timestamp FROM entities
            WHERE table_name = ?1 AND partition_key = ?2 AND row_key = ?3
            "#,
        )
        .bind(table)
        .bind(partition_key)
        .bind(row_key)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => entity_from_row(&row),
            None => Err(not_found(
                "ResourceNotFound",
                entity_label(table, partition_key, row_key),
            )),
        }
    }

    async fn query_partition(
        &self,
        table: &str,
        partition_key: &str,
    ) -> RemoteResult<Vec<PropertyBag>> {
        self.require_table(table).await?;
        let rows = sqlx::query(
            r#"
            SELECT properties_json, etag, timestamp FROM entities
            WHERE table_name = ?1 AND partition_key = ?2
            ORDER BY row_key
            "#,
        )
        .bind(table)
        .bind(partition_key)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(entity_from_row).collect()
    }

    async fn delete_entity(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
        if_match: &IfMatch,
    ) -> RemoteResult<()> {
        self.require_table(table).await?;
        let label = entity_label(table, partition_key, row_key);
        let current = self
            .current_etag(table, partition_key, row_key)
            .await?
            .ok_or_else(|| not_found("ResourceNotFound", &label))?;
        if !if_match.matches(&current) {
            return Err(condition_not_met(&label));
        }
        let deleted = sqlx::query(
            r#"
            DELETE FROM entities
            WHERE table_name = ?1 AND partition_key = ?2 AND row_key = ?3 AND etag = ?4
            "#,
        )
        .bind(table)
        .bind(partition_key)
        .bind(row_key)
        .bind(&current)
        .execute(&self.pool)
        .await?
        .rows_affected();
        if deleted == 0 {
            return Err(condition_not_met(&label));
        }
        Ok(())
    }
}
