//! CLI command handlers, one file per storage surface.

mod blob;
mod config;
mod queue;
mod share;
mod table;

pub use blob::run_blob;
pub use config::run_config;
pub use queue::run_queue;
pub use share::run_share;
pub use table::run_table;

use std::io::Write;
use std::path::Path;

use anyhow::Result;

/// Write downloaded bytes to `output`, or to stdout when none is given.
fn write_output(data: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, data)?;
            println!("Wrote {} bytes to {}", data.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(data)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
