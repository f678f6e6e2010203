//! Mock Relay Implementation
//!
//! Records every query in memory for test assertions and returns either a
//! deterministic echo answer or a scripted outcome.
//! Thread-safe via `Arc<Mutex<>>`.

use std::sync::{Arc, Mutex};

use crate::{RelayMode, RelayOutcome, RelayService};

/// Mock relay that records queries for test assertions
#[derive(Debug, Clone, Default)]
pub struct MockRelay {
    scripted: Option<RelayOutcome>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockRelay {
    /// Create a mock that answers `Mock answer to: <query>`
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that always returns `outcome`
    pub fn with_outcome(outcome: RelayOutcome) -> Self {
        Self {
            scripted: Some(outcome),
            queries: Arc::default(),
        }
    }

    /// Number of calls made through this mock (and its clones)
    pub fn calls(&self) -> usize {
        self.recorded_queries().len()
    }

    /// Return all recorded queries, oldest first
    pub fn recorded_queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }

    /// Clear all recorded queries
    pub fn reset(&self) {
        if let Ok(mut queries) = self.queries.lock() {
            queries.clear();
        }
    }
}

#[async_trait::async_trait]
impl RelayService for MockRelay {
    async fn send(&self, query: &str) -> RelayOutcome {
        tracing::debug!("Mock relay: recording query");
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }

        match &self.scripted {
            Some(outcome) => outcome.clone(),
            None => RelayOutcome::success(format!("Mock answer to: {}", query)),
        }
    }

    fn mode(&self) -> RelayMode {
        RelayMode::Mock
    }
}
