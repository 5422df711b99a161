//! `strata table ...` – entities as JSON.

use anyhow::{Context as _, Result};
use strata_core::entity::PropertyBag;
use strata_core::storage::TableClient;

use crate::cli::{Context, TableCommand};

fn print_entity(bag: &PropertyBag) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&bag.to_json())?);
    Ok(())
}

pub async fn run_table(ctx: &Context, command: TableCommand) -> Result<()> {
    let client = TableClient::new(ctx.emulator.clone(), ctx.options.clone());
    match command {
        TableCommand::Create { table } => {
            client.create_table(&table).await?;
            println!("Created table {table}");
        }
        TableCommand::Insert {
            table,
            entity,
            upsert,
        } => {
            let bag = PropertyBag::from_json_str(&entity).context("invalid entity JSON")?;
            let stored = if upsert {
                client.upsert_bag(&table, &bag).await?
            } else {
                client.insert_bag(&table, &bag).await?
            };
            println!(
                "Stored ({}, {}) etag {}",
                stored.partition_key(),
                stored.row_key(),
                stored.etag().unwrap_or("-")
            );
        }
        TableCommand::Get {
            table,
            partition_key,
            row_key,
        } => {
            let bag = client.get_bag(&table, &partition_key, &row_key).await?;
            print_entity(&bag)?;
        }
        TableCommand::Query {
            table,
            partition_key,
        } => {
            let bags = client.query_partition_bags(&table, &partition_key).await?;
            let rows: Vec<_> = bags.iter().map(PropertyBag::to_json).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}
