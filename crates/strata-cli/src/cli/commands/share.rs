//! `strata share ...` – directories and files in file shares.

use anyhow::{Context as _, Result};
use strata_core::storage::ShareClient;

use super::write_output;
use crate::cli::{Context, ShareCommand};

pub async fn run_share(ctx: &Context, command: ShareCommand) -> Result<()> {
    let client = ShareClient::new(ctx.emulator.clone(), ctx.options.clone());
    match command {
        ShareCommand::Create { share } => {
            client.create_share(&share).await?;
            println!("Created share {share}");
        }
        ShareCommand::Mkdir {
            share,
            path,
            parents,
        } => {
            if parents {
                client.create_directory_all(&share, &path).await?;
            } else {
                client.create_directory(&share, &path).await?;
            }
            println!("Created {share}/{path}");
        }
        ShareCommand::Put { share, path, file } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            client.upload(&share, &path, &data).await?;
            println!("Uploaded {share}/{path} ({} bytes)", data.len());
        }
        ShareCommand::Get {
            share,
            path,
            output,
        } => {
            let data = client.download(&share, &path).await?;
            write_output(&data, output.as_deref())?;
        }
        ShareCommand::Ls { share, path } => {
            for e in client.list(&share, &path).await? {
                match e.content_length {
                    Some(len) => println!("{:<10} {}", len, e.name),
                    None => println!("{:<10} {}/", "<DIR>", e.name),
                }
            }
        }
    }
    Ok(())
}
