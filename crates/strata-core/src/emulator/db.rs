//! SQLite-backed emulator: connection, migrations, and time helpers.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars
/// don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS containers (
        name TEXT PRIMARY KEY,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS blobs (
        container TEXT NOT NULL,
        name TEXT NOT NULL,
        data BLOB NOT NULL,
        content_type TEXT,
        content_sha256 TEXT NOT NULL,
        etag TEXT NOT NULL,
        last_modified INTEGER NOT NULL,
        PRIMARY KEY (container, name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS queues (
        name TEXT PRIMARY KEY,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        queue TEXT NOT NULL,
        message_id TEXT NOT NULL UNIQUE,
        body TEXT NOT NULL,
        inserted_at INTEGER NOT NULL,
        visible_at INTEGER NOT NULL,
        dequeue_count INTEGER NOT NULL DEFAULT 0,
        pop_receipt TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tables (
        name TEXT PRIMARY KEY,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS entities (
        table_name TEXT NOT NULL,
        partition_key TEXT NOT NULL,
        row_key TEXT NOT NULL,
        properties_json TEXT NOT NULL,
        etag TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        PRIMARY KEY (table_name, partition_key, row_key)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS shares (
        name TEXT PRIMARY KEY,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS share_entries (
        share TEXT NOT NULL,
        parent TEXT NOT NULL,
        name TEXT NOT NULL,
        is_dir INTEGER NOT NULL,
        data BLOB,
        last_modified INTEGER NOT NULL,
        PRIMARY KEY (share, parent, name)
    )
    "#,
];

/// Local stand-in for the storage service, implementing every backend trait.
///
/// The database file lives under the XDG state directory:
/// `~/.local/state/strata/emulator.db` on Debian.
#[derive(Clone)]
pub struct Emulator {
    pub(crate) pool: Pool<Sqlite>,
}

impl Emulator {
    /// Default database path under the XDG state directory.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("strata")?;
        Ok(xdg_dirs.get_state_home().join("strata").join("emulator.db"))
    }

    /// Open (or create) the default emulator database and run migrations.
    pub async fn open_default() -> Result<Self> {
        Self::open_at(Self::default_path()?).await
    }

    /// Open (or create) the database at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(&uri)
            .await
            .with_context(|| format!("failed to open emulator database {}", path.display()))?;
        let emu = Emulator { pool };
        emu.migrate().await?;
        tracing::debug!(path = %path.display(), "emulator database ready");
        Ok(emu)
    }

    /// In-memory database (nothing touches disk). One connection, kept open
    /// for the life of the pool, so the data survives between calls.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let emu = Emulator { pool };
        emu.migrate().await?;
        Ok(emu)
    }

    async fn migrate(&self) -> Result<()> {
        for stmt in SCHEMA {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .context("emulator schema migration failed")?;
        }
        Ok(())
    }
}

/// Current time as Unix milliseconds (for DB timestamps).
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Out-of-range values clamp to chrono's bounds.
pub(crate) fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or(if ms > 0 {
        DateTime::<Utc>::MAX_UTC
    } else {
        DateTime::<Utc>::MIN_UTC
    })
}

/// Random hex identifier for message ids and pop receipts.
pub(crate) fn new_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}
