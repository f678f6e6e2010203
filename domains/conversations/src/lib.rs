//! Conversations domain: consultation records and the query relay endpoint

pub mod api;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::Conversation;

// Re-export repository types
pub use repository::{ConversationRepository, ConversationsRepositories};

// Re-export API types
pub use api::routes;
pub use api::ConversationsState;
