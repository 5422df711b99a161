//! Blob surface of the emulator.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::db::{from_millis, now_millis, Emulator};
use super::error::{already_exists, check_dns_name, invalid_input, not_found};
use crate::storage::{BlobBackend, BlobProperties, RemoteResult};

fn blob_properties(container: &str, row: &SqliteRow) -> BlobProperties {
    BlobProperties {
        container: container.to_owned(),
        name: row.get("name"),
        content_length: row.get::<i64, _>("content_length") as u64,
        content_type: row.get("content_type"),
        etag: row.get("etag"),
        content_sha256: row.get("content_sha256"),
        last_modified: from_millis(row.get("last_modified")),
    }
}

fn check_blob_name(name: &str) -> RemoteResult<()> {
    if name.is_empty() || name.len() > 1024 {
        return Err(invalid_input(
            "InvalidResourceName",
            format!("invalid blob name '{name}'"),
        ));
    }
    Ok(())
}

impl Emulator {
    async fn container_exists(&self, container: &str) -> RemoteResult<bool> {
        let row = sqlx::query("SELECT 1 FROM containers WHERE name = ?1")
            .bind(container)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn require_container(&self, container: &str) -> RemoteResult<()> {
        if self.container_exists(container).await? {
            Ok(())
        } else {
            Err(not_found("ContainerNotFound", format!("container '{container}'")))
        }
    }
}

#[async_trait]
impl BlobBackend for Emulator {
    async fn create_container(&self, container: &str) -> RemoteResult<()> {
        check_dns_name("container", container)?;
        if self.container_exists(container).await? {
            return Err(already_exists(
                "ContainerAlreadyExists",
                format!("container '{container}'"),
            ));
        }
        sqlx::query("INSERT INTO containers (name, created_at) VALUES (?1, ?2)")
            .bind(container)
            .bind(now_millis())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_container(&self, container: &str) -> RemoteResult<()> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM containers WHERE name = ?1")
            .bind(container)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(not_found("ContainerNotFound", format!("container '{container}'")));
        }
        sqlx::query("DELETE FROM blobs WHERE container = ?1")
            .bind(container)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_containers(&self) -> RemoteResult<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM containers ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|r| r.get("name")).collect())
    }

    async fn put_blob(
        &self,
        container: &str,
        name: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> RemoteResult<BlobProperties> {
        check_blob_name(name)?;
        self.require_container(container).await?;

        let sha = hex::encode(Sha256::digest(data));
        let etag = format!("\"0x{}\"", sha[..16].to_ascii_uppercase());
        let now = now_millis();
        sqlx::query(
            r#"
            INSERT INTO blobs
                (container, name, data, content_type, content_sha256, etag, last_modified)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (container, name) DO UPDATE SET
                data = excluded.data,
                content_type = excluded.content_type,
                content_sha256 = excluded.content_sha256,
                etag = excluded.etag,
                last_modified = excluded.last_modified
            "#,
        )
        .bind(container)
        .bind(name)
        .bind(data)
        .bind(content_type)
        .bind(&sha)
        .bind(&etag)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(BlobProperties {
            container: container.to_owned(),
            name: name.to_owned(),
            content_length: data.len() as u64,
            content_type: content_type.map(str::to_owned),
            etag,
            content_sha256: sha,
            last_modified: from_millis(now),
        })
    }

    async fn get_blob(&self, container: &str, name: &str) -> RemoteResult<Vec<u8>> {
        self.require_container(container).await?;
        let row = sqlx::query("SELECT data FROM blobs WHERE container = ?1 AND name = ?2")
            .bind(container)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(row.get("data")),
            None => Err(not_found("BlobNotFound", format!("blob '{container}/{name}'"))),
        }
    }

    async fn blob_properties(&self, container: &str, name: &str) -> RemoteResult<BlobProperties> {
        self.require_container(container).await?;
        let row = sqlx::query(
            r#"
            SELECT name, length(data) AS content_length, content_type,
                   content_sha256, etag, last_modified
            FROM blobs
            WHERE container = ?1 AND name = ?2
            "#,
        )
        .bind(container)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(blob_properties(container, &row)),
            None => Err(not_found("BlobNotFound", format!("blob '{container}/{name}'"))),
        }
    }

    async fn delete_blob(&self, container: &str, name: &str) -> RemoteResult<()> {
        self.require_container(container).await?;
        let deleted = sqlx::query("DELETE FROM blobs WHERE container = ?1 AND name = ?2")
            .bind(container)
            .bind(name)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(not_found("BlobNotFound", format!("blob '{container}/{name}'")));
        }
        Ok(())
    }

    async fn list_blobs(
        &self,
        container: &str,
        prefix: Option<&str>,
    ) -> RemoteResult<Vec<BlobProperties>> {
        self.require_container(container).await?;
        let rows = sqlx::query(
            r#"
            SELECT name, length(data) AS content_length, content_type,
                   content_sha256, etag, last_modified
            FROM blobs
            WHERE container = ?1 AND substr(name, 1, length(?2)) = ?2
            ORDER BY name
            "#,
        )
        .bind(container)
        .bind(prefix.unwrap_or(""))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|r| blob_properties(container, r)).collect())
    }
}
