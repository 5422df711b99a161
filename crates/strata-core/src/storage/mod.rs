//! Storage surfaces (blob, queue, table, file share).
//!
//! Each client is a thin layer over a backend trait: it wraps every remote
//! call in the shared retry loop and translates the final failure into
//! [`StorageError`].

mod backend;
mod blob;
mod call;
mod error;
mod queue;
mod share;
mod table;
mod types;

pub use backend::{BlobBackend, QueueBackend, RemoteResult, ShareBackend, TableBackend};
pub use blob::BlobClient;
pub use call::CallOptions;
pub use error::StorageError;
pub use queue::{QueueClient, DEFAULT_VISIBILITY_TIMEOUT};
pub use share::ShareClient;
pub use table::TableClient;
pub use types::{BlobProperties, IfMatch, QueueMessage, ShareEntry};
