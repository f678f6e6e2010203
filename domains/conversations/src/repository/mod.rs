//! Repository implementations for Conversations domain

pub mod conversations;

use sqlx::PgPool;

pub use conversations::ConversationRepository;

/// Combined repository access for the Conversations domain
#[derive(Clone)]
pub struct ConversationsRepositories {
    pub conversations: ConversationRepository,
}

impl ConversationsRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            conversations: ConversationRepository::new(pool),
        }
    }
}
