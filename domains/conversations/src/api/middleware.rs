//! Conversations domain state

use crate::ConversationsRepositories;
use axum::extract::FromRef;
use medrelay_relay::RelayService;
use std::sync::Arc;

/// Relay shared by all in-flight requests; read-only after startup
pub type SharedRelay = Arc<dyn RelayService>;

/// Application state for the Conversations domain
#[derive(Clone)]
pub struct ConversationsState {
    pub repos: ConversationsRepositories,
    pub relay: SharedRelay,
}

impl FromRef<ConversationsState> for SharedRelay {
    fn from_ref(state: &ConversationsState) -> Self {
        state.relay.clone()
    }
}
