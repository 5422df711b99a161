//! `strata queue ...` – send, receive and peek messages.

use std::time::Duration;

use anyhow::Result;
use strata_core::storage::{QueueClient, QueueMessage};

use crate::cli::{Context, QueueCommand};

fn print_message(m: &QueueMessage) {
    println!(
        "{}  dequeued={}  inserted={}  {}",
        m.message_id,
        m.dequeue_count,
        m.inserted_on.format("%Y-%m-%d %H:%M:%S"),
        m.body
    );
}

pub async fn run_queue(ctx: &Context, command: QueueCommand) -> Result<()> {
    let client = QueueClient::new(ctx.emulator.clone(), ctx.options.clone());
    match command {
        QueueCommand::Create { queue } => {
            client.create_queue(&queue).await?;
            println!("Created queue {queue}");
        }
        QueueCommand::Send { queue, body } => {
            let msg = client.send(&queue, &body).await?;
            println!("Sent message {}", msg.message_id);
        }
        QueueCommand::Receive {
            queue,
            max,
            visibility,
            delete,
        } => {
            let messages = client
                .receive_with_timeout(&queue, max, Duration::from_secs(visibility))
                .await?;
            if messages.is_empty() {
                println!("No messages.");
            }
            for m in &messages {
                print_message(m);
                if let (true, Some(receipt)) = (delete, m.pop_receipt.as_deref()) {
                    client.delete_message(&queue, &m.message_id, receipt).await?;
                }
            }
        }
        QueueCommand::Peek { queue, max } => {
            let messages = client.peek(&queue, max).await?;
            if messages.is_empty() {
                println!("No messages.");
            }
            for m in &messages {
                print_message(m);
            }
        }
    }
    Ok(())
}
