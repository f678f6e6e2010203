//! Conversation repository

use crate::domain::entities::Conversation;
use medrelay_common::Result;
use sqlx::PgPool;

#[derive(Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count all conversations
    pub async fn count(&self) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM conversations")
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    /// List one page of conversations, newest first
    pub async fn list_page(&self, offset: i64, limit: i64) -> Result<Vec<Conversation>> {
        let convs = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT id, description, patient, doctor, created_at, updated_at
            FROM conversations
            ORDER BY created_at DESC, id DESC
            OFFSET $1
            LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(convs)
    }

    /// Create a new conversation
    pub async fn create(&self, conv: &Conversation) -> Result<Conversation> {
        let created = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations (
                id, description, patient, doctor, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, description, patient, doctor, created_at, updated_at
            "#,
        )
        .bind(conv.id)
        .bind(&conv.description)
        .bind(&conv.patient)
        .bind(&conv.doctor)
        .bind(conv.created_at)
        .bind(conv.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }
}
