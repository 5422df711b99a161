//! Local storage emulator (SQLite via sqlx).
//!
//! Implements every backend trait against one database so the clients, the
//! retry loop and the CLI can run without a cloud account. Failures carry the
//! same status and error codes the service would send.

mod blob;
mod db;
mod error;
mod queue;
mod share;
mod table;

pub use db::Emulator;
