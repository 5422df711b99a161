//! File-share surface of the emulator.
//!
//! Each entry is keyed by its parent directory path and leaf name; the share
//! root is the parent `""`.

use async_trait::async_trait;
use sqlx::Row;

use super::db::{now_millis, Emulator};
use super::error::{already_exists, check_dns_name, invalid_input, not_found};
use crate::retry::RemoteError;
use crate::storage::{RemoteResult, ShareBackend, ShareEntry};

/// Split `a/b/c` into (`a/b`, `c`). Leading, trailing and doubled slashes are ignored.
fn split_path(path: &str) -> RemoteResult<(String, String)> {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    match parts.split_last() {
        Some((leaf, parent)) if !parts.iter().any(|p| *p == "." || *p == "..") => {
            Ok((parent.join("/"), (*leaf).to_owned()))
        }
        _ => Err(invalid_input("InvalidResourceName", format!("invalid path '{path}'"))),
    }
}

fn type_mismatch(path: &str) -> RemoteError {
    RemoteError::with_status(
        409,
        "ResourceTypeMismatch",
        format!("'{path}' is not the expected kind of entry"),
    )
}

impl Emulator {
    async fn share_exists(&self, share: &str) -> RemoteResult<bool> {
        let row = sqlx::query("SELECT 1 FROM shares WHERE name = ?1")
            .bind(share)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn require_share(&self, share: &str) -> RemoteResult<()> {
        if self.share_exists(share).await? {
            Ok(())
        } else {
            Err(not_found("ShareNotFound", format!("share '{share}'")))
        }
    }

    /// `Some(true)` for a directory, `Some(false)` for a file.
    async fn entry_kind(
        &self,
        share: &str,
        parent: &str,
        name: &str,
    ) -> RemoteResult<Option<bool>> {
        let row = sqlx::query(
            "SELECT is_dir FROM share_entries WHERE share = ?1 AND parent = ?2 AND name = ?3",
        )
        .bind(share)
        .bind(parent)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get::<i64, _>("is_dir") != 0))
    }

    async fn is_directory(&self, share: &str, path: &str) -> RemoteResult<bool> {
        if path.split('/').all(str::is_empty) {
            return Ok(true);
        }
        let (parent, name) = split_path(path)?;
        Ok(self.entry_kind(share, &parent, &name).await? == Some(true))
    }

    async fn require_parent(&self, share: &str, parent: &str) -> RemoteResult<()> {
        if self.is_directory(share, parent).await? {
            Ok(())
        } else {
            Err(not_found("ParentNotFound", format!("directory '{parent}'")))
        }
    }

    async fn require_file(&self, share: &str, path: &str) -> RemoteResult<(String, String)> {
        self.require_share(share).await?;
        let (parent, name) = split_path(path)?;
        match self.entry_kind(share, &parent, &name).await? {
            Some(false) => Ok((parent, name)),
            Some(true) => Err(type_mismatch(path)),
            None => Err(not_found("ResourceNotFound", format!("file '{path}'"))),
        }
    }
}

#[async_trait]
impl ShareBackend for Emulator {
    async fn create_share(&self, share: &str) -> RemoteResult<()> {
        check_dns_name("share", share)?;
        if self.share_exists(share).await? {
            return Err(already_exists("ShareAlreadyExists", format!("share '{share}'")));
        }
        sqlx::query("INSERT INTO shares (name, created_at) VALUES (?1, ?2)")
            .bind(share)
            .bind(now_millis())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_share(&self, share: &str) -> RemoteResult<()> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM shares WHERE name = ?1")
            .bind(share)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(not_found("ShareNotFound", format!("share '{share}'")));
        }
        sqlx::query("DELETE FROM share_entries WHERE share = ?1")
            .bind(share)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_shares(&self) -> RemoteResult<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM shares ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|r| r.get("name")).collect())
    }

    async fn create_directory(&self, share: &str, path: &str) -> RemoteResult<()> {
        self.require_share(share).await?;
        let (parent, name) = split_path(path)?;
        self.require_parent(share, &parent).await?;
        match self.entry_kind(share, &parent, &name).await? {
            Some(true) => {
                return Err(already_exists(
                    "ResourceAlreadyExists",
                    format!("directory '{path}'"),
                ))
            }
            Some(false) => return Err(type_mismatch(path)),
            None => {}
        }
        sqlx::query(
            r#"
            INSERT INTO share_entries (share, parent, name, is_dir, data, last_modified)
            VALUES (?1, ?2, ?3, 1, NULL, ?4)
            "#,
        )
        .bind(share)
        .bind(&parent)
        .bind(&name)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upload_file(&self, share: &str, path: &str, data: &[u8]) -> RemoteResult<()> {
        self.require_share(share).await?;
        let (parent, name) = split_path(path)?;
        self.require_parent(share, &parent).await?;
        if self.entry_kind(share, &parent, &name).await? == Some(true) {
            return Err(type_mismatch(path));
        }
        sqlx::query(
            r#"
            INSERT INTO share_entries (share, parent, name, is_dir, data, last_modified)
            VALUES (?1, ?2, ?3, 0, ?4, ?5)
            ON CONFLICT (share, parent, name) DO UPDATE SET
                data = excluded.data,
                last_modified = excluded.last_modified
            "#,
        )
        .bind(share)
        .bind(&parent)
        .bind(&name)
        .bind(data)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn download_file(&self, share: &str, path: &str) -> RemoteResult<Vec<u8>> {
        let (parent, name) = self.require_file(share, path).await?;
        let row = sqlx::query(
            "SELECT data FROM share_entries WHERE share = ?1 AND parent = ?2 AND name = ?3",
        )
        .bind(share)
        .bind(&parent)
        .bind(&name)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(row.get::<Option<Vec<u8>>, _>("data").unwrap_or_default()),
            None => Err(not_found("ResourceNotFound", format!("file '{path}'"))),
        }
    }

    async fn delete_file(&self, share: &str, path: &str) -> RemoteResult<()> {
        let (parent, name) = self.require_file(share, path).await?;
        sqlx::query("DELETE FROM share_entries WHERE share = ?1 AND parent = ?2 AND name = ?3")
            .bind(share)
            .bind(&parent)
            .bind(&name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_directory(&self, share: &str, path: &str) -> RemoteResult<Vec<ShareEntry>> {
        self.require_share(share).await?;
        if !self.is_directory(share, path).await? {
            return Err(not_found("ResourceNotFound", format!("directory '{path}'")));
        }
        let dir: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        let rows = sqlx::query(
            r#"
            SELECT name, is_dir, length(data) AS content_length
            FROM share_entries
            WHERE share = ?1 AND parent = ?2
            ORDER BY is_dir DESC, name
            "#,
        )
        .bind(share)
        .bind(dir.join("/"))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|r| {
                let is_directory = r.get::<i64, _>("is_dir") != 0;
                ShareEntry {
                    name: r.get("name"),
                    is_directory,
                    content_length: if is_directory {
                        None
                    } else {
                        Some(r.get::<Option<i64>, _>("content_length").unwrap_or(0) as u64)
                    },
                }
            })
            .collect())
    }
}
