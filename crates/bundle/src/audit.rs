//! Fire-and-forget audit sink.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use crate::events::BundleEvent;

/// Error from an audit sink. Emission failures are logged by the caller
/// and never fail the workflow.
#[derive(Debug, Error)]
#[error("Audit sink error: {0}")]
pub struct AuditError(pub String);

/// Receives one event per committed saga transition.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Delivers one event. Best effort only.
    async fn emit(&self, event: BundleEvent) -> Result<(), AuditError>;
}

#[derive(Debug, Default)]
struct InMemoryAuditState {
    events: Vec<BundleEvent>,
    fail_on_emit: bool,
}

/// In-memory audit sink for tests and the demo server.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditSink {
    state: Arc<RwLock<InMemoryAuditState>>,
}

impl InMemoryAuditSink {
    /// Creates a new empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the sink to reject emissions.
    pub fn set_fail_on_emit(&self, fail: bool) {
        self.state.write().unwrap().fail_on_emit = fail;
    }

    /// Returns all recorded events.
    pub fn events(&self) -> Vec<BundleEvent> {
        self.state.read().unwrap().events.clone()
    }

    /// Returns the recorded event type names, in order.
    pub fn event_types(&self) -> Vec<&'static str> {
        self.state
            .read()
            .unwrap()
            .events
            .iter()
            .map(BundleEvent::event_type)
            .collect()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn emit(&self, event: BundleEvent) -> Result<(), AuditError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_emit {
            return Err(AuditError("sink unavailable".to_string()));
        }
        state.events.push(event);
        Ok(())
    }
}
