use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{Message, MessageRepository, NewMessage, Result};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::{db_error, PgStore};

const INSERT: &str = "INSERT INTO messages (id, sender_id, receiver_id, content) VALUES ($1, $2, $3, $4) \
     RETURNING id, sender_id, receiver_id, content, is_read, created_at";

fn message_from_row(row: &PgRow) -> Result<Message> {
    Ok(Message {
        id: row.try_get("id").map_err(db_error)?,
        sender_id: row.try_get("sender_id").map_err(db_error)?,
        receiver_id: row.try_get("receiver_id").map_err(db_error)?,
        content: row.try_get("content").map_err(db_error)?,
        is_read: row.try_get("is_read").map_err(db_error)?,
        created_at: row.try_get("created_at").map_err(db_error)?,
    })
}

#[async_trait]
impl MessageRepository for PgStore {
    async fn insert(&self, message: NewMessage) -> Result<Message> {
        let row = sqlx::query(INSERT)
            .bind(Uuid::new_v4())
            .bind(message.sender_id)
            .bind(message.receiver_id)
            .bind(&message.content)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        message_from_row(&row)
    }

    /// All rows or none.
    async fn insert_many(&self, messages: Vec<NewMessage>) -> Result<Vec<Message>> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let mut stored = Vec::with_capacity(messages.len());
        for message in messages {
            let row = sqlx::query(INSERT)
                .bind(Uuid::new_v4())
                .bind(message.sender_id)
                .bind(message.receiver_id)
                .bind(&message.content)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error)?;
            stored.push(message_from_row(&row)?);
        }
        tx.commit().await.map_err(db_error)?;
        Ok(stored)
    }

    async fn inbox(&self, receiver_id: Uuid, limit: u32) -> Result<Vec<Message>> {
        sqlx::query(
            "SELECT id, sender_id, receiver_id, content, is_read, created_at FROM messages \
             WHERE receiver_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(receiver_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .iter()
        .map(message_from_row)
        .collect()
    }

    async fn mark_read(&self, id: Uuid, receiver_id: Uuid) -> Result<bool> {
        let result = sqlx::query("UPDATE messages SET is_read = TRUE WHERE id = $1 AND receiver_id = $2")
            .bind(id)
            .bind(receiver_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid, receiver_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1 AND receiver_id = $2")
            .bind(id)
            .bind(receiver_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_sent_since(&self, sender_id: Uuid, since: DateTime<Utc>) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE sender_id = $1 AND created_at >= $2")
                .bind(sender_id)
                .bind(since)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(count.max(0) as u64)
    }

    async fn last_sent_at(&self, sender_id: Uuid) -> Result<Option<DateTime<Utc>>> {
        sqlx::query_scalar("SELECT MAX(created_at) FROM messages WHERE sender_id = $1")
            .bind(sender_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }
}
