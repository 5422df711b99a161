//! Plain data returned by the storage surfaces.

use chrono::{DateTime, Utc};

/// Metadata of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobProperties {
    pub container: String,
    pub name: String,
    pub content_length: u64,
    pub content_type: Option<String>,
    /// Quoted opaque version marker; changes when content changes.
    pub etag: String,
    /// Hex SHA-256 of the content.
    pub content_sha256: String,
    pub last_modified: DateTime<Utc>,
}

/// A queue message. `pop_receipt` is only set on received messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub message_id: String,
    pub body: String,
    pub dequeue_count: u32,
    pub inserted_on: DateTime<Utc>,
    pub next_visible_on: DateTime<Utc>,
    pub pop_receipt: Option<String>,
}

/// One entry of a file-share directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareEntry {
    pub name: String,
    pub is_directory: bool,
    /// `None` for directories.
    pub content_length: Option<u64>,
}

/// Optimistic-concurrency condition for table writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfMatch {
    /// `*`: overwrite whatever is stored.
    Any,
    /// Succeed only if the stored ETag equals this one.
    Etag(String),
}

impl IfMatch {
    pub fn from_header(value: &str) -> Self {
        if value == "*" {
            IfMatch::Any
        } else {
            IfMatch::Etag(value.to_owned())
        }
    }

    pub fn matches(&self, current: &str) -> bool {
        match self {
            IfMatch::Any => true,
            IfMatch::Etag(expected) => expected == current,
        }
    }
}
