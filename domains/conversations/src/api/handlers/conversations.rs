//! Conversation listing API handler

use axum::{body::Bytes, extract::State, Json};
use chrono::{DateTime, Utc};
use medrelay_common::{PageRequest, Result};
use serde::Serialize;
use uuid::Uuid;

use crate::api::middleware::ConversationsState;

/// Conversation response DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: Uuid,
    pub description: String,
    pub patient: String,
    pub doctor: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::domain::entities::Conversation> for ConversationResponse {
    fn from(c: crate::domain::entities::Conversation) -> Self {
        Self {
            id: c.id,
            description: c.description,
            patient: c.patient,
            doctor: c.doctor,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// One page of conversations
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPage {
    pub total: i64,
    pub total_pages: i64,
    pub page: i64,
    pub limit: i64,
    pub data: Vec<ConversationResponse>,
}

impl ConversationPage {
    pub fn new(
        request: &PageRequest,
        total: i64,
        conversations: Vec<crate::domain::entities::Conversation>,
    ) -> Self {
        Self {
            total,
            total_pages: request.total_pages(total),
            page: request.page(),
            limit: request.limit(),
            data: conversations.into_iter().map(Into::into).collect(),
        }
    }
}

/// List conversations, newest first.
///
/// Pagination comes from an optional JSON body `{"page", "limit"}`.
pub async fn list_conversations(
    State(state): State<ConversationsState>,
    body: Bytes,
) -> Result<Json<ConversationPage>> {
    let request = PageRequest::from_body(&body)?;

    let repo = &state.repos.conversations;
    let (total, conversations) = tokio::try_join!(
        repo.count(),
        repo.list_page(request.offset(), request.limit())
    )?;

    tracing::debug!(
        total,
        page = request.page(),
        returned = conversations.len(),
        "Listed conversations"
    );

    Ok(Json(ConversationPage::new(&request, total, conversations)))
}
