//! `strata blob ...` – containers and blobs.

use anyhow::{Context as _, Result};
use strata_core::storage::BlobClient;

use super::write_output;
use crate::cli::{BlobCommand, Context};

pub async fn run_blob(ctx: &Context, command: BlobCommand) -> Result<()> {
    let client = BlobClient::new(ctx.emulator.clone(), ctx.options.clone());
    match command {
        BlobCommand::CreateContainer { container } => {
            client.create_container(&container).await?;
            println!("Created container {container}");
        }
        BlobCommand::ListContainers => {
            for name in client.list_containers().await? {
                println!("{name}");
            }
        }
        BlobCommand::Put {
            container,
            name,
            file,
            content_type,
        } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            let props = client
                .upload(&container, &name, &data, content_type.as_deref())
                .await?;
            println!(
                "Uploaded {container}/{name} ({} bytes, etag {})",
                props.content_length, props.etag
            );
        }
        BlobCommand::Get {
            container,
            name,
            output,
        } => {
            let data = client.download(&container, &name).await?;
            write_output(&data, output.as_deref())?;
        }
        BlobCommand::Ls { container, prefix } => {
            let blobs = client.list(&container, prefix.as_deref()).await?;
            if blobs.is_empty() {
                println!("No blobs in {container}.");
            } else {
                println!("{:<10} {:<20} {}", "SIZE", "MODIFIED", "NAME");
                for b in blobs {
                    println!(
                        "{:<10} {:<20} {}",
                        b.content_length,
                        b.last_modified.format("%Y-%m-%d %H:%M:%S").to_string(),
                        b.name
                    );
                }
            }
        }
        BlobCommand::Rm { container, name } => {
            client.delete(&container, &name).await?;
            println!("Deleted {container}/{name}");
        }
    }
    Ok(())
}
