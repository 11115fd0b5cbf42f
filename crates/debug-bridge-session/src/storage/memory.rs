//! In-memory debugger event store.

use std::sync::RwLock;

use async_trait::async_trait;
use debug_bridge_core::{
    Ack, Event, EventKind, LatestView, SessionList,
    traits::{DebugStore, StoreError},
};
use serde_json::Value;

use crate::state::{StoreState, Transition};

/// In-memory store implementation.
///
/// One lock guards the whole state, so a submission (classify, apply,
/// merge into the latest view) and a read (snapshot of both views) never
/// interleave. Data is lost on restart.
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::new()),
        }
    }

    /// Run `f` against a consistent view of the state.
    ///
    /// # Errors
    /// Returns error if a writer panicked while holding the lock.
    pub fn inspect<T>(&self, f: impl FnOnce(&StoreState) -> T) -> Result<T, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(f(&state))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DebugStore for MemoryStore {
    async fn submit(&self, record: Value) -> Result<Ack, StoreError> {
        let event = Event::classify(&record);
        let kind = event.kind();

        let mut state = self
            .state
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        match state.apply(event) {
            Transition::Started { index, abandoned } => {
                let id = state.session(index).map_or(Value::Null, |s| s.id.clone());
                if let Some(prev) = abandoned {
                    let prev_id = state.session(prev).map_or(Value::Null, |s| s.id.clone());
                    tracing::warn!(
                        %prev_id,
                        %id,
                        "Session started while another was active; previous session left unterminated"
                    );
                }
                tracing::info!(%id, "Debug session started");
            }
            Transition::Terminated { index } => {
                let id = state.session(index).map_or(Value::Null, |s| s.id.clone());
                tracing::info!(%id, "Debug session terminated");
            }
            Transition::Detached if kind == EventKind::SessionTerminated => {
                tracing::warn!("Session termination received with no active session");
            }
            Transition::Recorded { .. } | Transition::Detached | Transition::Ignored => {}
        }

        state.merge_latest(record);
        let sessions_count = state.sessions_count();
        drop(state);

        tracing::debug!(%kind, sessions_count, "Submission applied");
        Ok(Ack::ok(sessions_count))
    }

    async fn query(&self) -> Result<LatestView, StoreError> {
        self.inspect(StoreState::latest_view)
    }

    async fn sessions(&self) -> Result<SessionList, StoreError> {
        self.inspect(StoreState::session_list)
    }
}
