//! Queue surface of the emulator.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::db::{from_millis, new_id, now_millis, Emulator};
use super::error::{already_exists, check_dns_name, invalid_input, not_found};
use crate::storage::{QueueBackend, QueueMessage, RemoteResult};

/// Largest batch a single receive or peek may ask for.
const MAX_BATCH: u32 = 32;

fn queue_message(row: &SqliteRow) -> QueueMessage {
    QueueMessage {
        message_id: row.get("message_id"),
        body: row.get("body"),
        dequeue_count: u32::try_from(row.get::<i64, _>("dequeue_count")).unwrap_or(u32::MAX),
        inserted_on: from_millis(row.get("inserted_at")),
        next_visible_on: from_millis(row.get("visible_at")),
        pop_receipt: None,
    }
}

fn check_batch(max: u32) -> RemoteResult<()> {
    if (1..=MAX_BATCH).contains(&max) {
        Ok(())
    } else {
        Err(invalid_input(
            "InvalidQueryParameterValue",
            format!("numofmessages must be between 1 and {MAX_BATCH}, got {max}"),
        ))
    }
}

impl Emulator {
    async fn queue_exists(&self, queue: &str) -> RemoteResult<bool> {
        let row = sqlx::query("SELECT 1 FROM queues WHERE name = ?1")
            .bind(queue)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn require_queue(&self, queue: &str) -> RemoteResult<()> {
        if self.queue_exists(queue).await? {
            Ok(())
        } else {
            Err(not_found("QueueNotFound", format!("queue '{queue}'")))
        }
    }
}

#[async_trait]
impl QueueBackend for Emulator {
    async fn create_queue(&self, queue: &str) -> RemoteResult<()> {
        check_dns_name("queue", queue)?;
        if self.queue_exists(queue).await? {
            return Err(already_exists("QueueAlreadyExists", format!("queue '{queue}'")));
        }
        sqlx::query("INSERT INTO queues (name, created_at) VALUES (?1, ?2)")
            .bind(queue)
            .bind(now_millis())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_queue(&self, queue: &str) -> RemoteResult<()> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM queues WHERE name = ?1")
            .bind(queue)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(not_found("QueueNotFound", format!("queue '{queue}'")));
        }
        sqlx::query("DELETE FROM messages WHERE queue = ?1")
            .bind(queue)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_queues(&self) -> RemoteResult<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM queues ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|r| r.get("name")).collect())
    }

    async fn send_message(&self, queue: &str, body: &str) -> RemoteResult<QueueMessage> {
        self.require_queue(queue).await?;
        let id = new_id();
        let now = now_millis();
        sqlx::query(
            r#"
            INSERT INTO messages (queue, message_id, body, inserted_at, visible_at, dequeue_count)
            VALUES (?1, ?2, ?3, ?4, ?4, 0)
            "#,
        )
        .bind(queue)
        .bind(&id)
        .bind(body)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(QueueMessage {
            message_id: id,
            body: body.to_owned(),
            dequeue_count: 0,
            inserted_on: from_millis(now),
            next_visible_on: from_millis(now),
            pop_receipt: None,
        })
    }

    async fn receive_messages(
        &self,
        queue: &str,
        max: u32,
        visibility_timeout: Duration,
    ) -> RemoteResult<Vec<QueueMessage>> {
        check_batch(max)?;
        self.require_queue(queue).await?;

        let now = now_millis();
        let hidden_for = i64::try_from(visibility_timeout.as_millis()).unwrap_or(i64::MAX);
        let visible_at = now.saturating_add(hidden_for);
        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query(
            r#"
            SELECT message_id, body, dequeue_count, inserted_at, visible_at
            FROM messages
            WHERE queue = ?1 AND visible_at <= ?2
            ORDER BY seq
            LIMIT ?3
            "#,
        )
        .bind(queue)
        .bind(now)
        .bind(max as i64)
        .fetch_all(&mut *tx)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut msg = queue_message(row);
            let receipt = new_id();
            sqlx::query(
                r#"
                UPDATE messages
                SET visible_at = ?1, dequeue_count = dequeue_count + 1, pop_receipt = ?2
                WHERE message_id = ?3
                "#,
            )
            .bind(visible_at)
            .bind(&receipt)
            .bind(&msg.message_id)
            .execute(&mut *tx)
            .await?;
            msg.dequeue_count = msg.dequeue_count.saturating_add(1);
            msg.next_visible_on = from_millis(visible_at);
            msg.pop_receipt = Some(receipt);
            out.push(msg);
        }
        tx.commit().await?;
        Ok(out)
    }

    async fn peek_messages(&self, queue: &str, max: u32) -> RemoteResult<Vec<QueueMessage>> {
        check_batch(max)?;
        self.require_queue(queue).await?;
        let rows = sqlx::query(
            r#"
            SELECT message_id, body, dequeue_count, inserted_at, visible_at
            FROM messages
            WHERE queue = ?1 AND visible_at <= ?2
            ORDER BY seq
            LIMIT ?3
            "#,
        )
        .bind(queue)
        .bind(now_millis())
        .bind(max as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(queue_message).collect())
    }

    async fn delete_message(
        &self,
        queue: &str,
        message_id: &str,
        pop_receipt: &str,
    ) -> RemoteResult<()> {
        self.require_queue(queue).await?;
        let deleted = sqlx::query(
            "DELETE FROM messages WHERE queue = ?1 AND message_id = ?2 AND pop_receipt = ?3",
        )
        .bind(queue)
        .bind(message_id)
        .bind(pop_receipt)
        .execute(&self.pool)
        .await?
        .rows_affected();
        if deleted == 0 {
            // Unknown id and stale receipt look the same to the caller.
            return Err(not_found(
                "MessageNotFound",
                format!("message '{message_id}' with that pop receipt"),
            ));
        }
        Ok(())
    }

    async fn clear_messages(&self, queue: &str) -> RemoteResult<()> {
        self.require_queue(queue).await?;
        sqlx::query("DELETE FROM messages WHERE queue = ?1")
            .bind(queue)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
