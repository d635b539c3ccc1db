//! In-memory checkpoint store for local development and tests.
//!
//! State is lost on restart. Selected only via `checkpoint.backend =
//! "memory"` in config; a production deployment uses the file store.

use std::collections::HashMap;

use parking_lot::RwLock;

use tt_domain::error::Result;
use tt_domain::tool::Message;

use crate::state::SessionState;
use crate::store::CheckpointStore;

#[derive(Default)]
pub struct MemoryCheckpointStore {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>> {
        Ok(self.sessions.read().get(session_id).cloned())
    }

    async fn append_and_commit(
        &self,
        session_id: &str,
        new_messages: Vec<Message>,
        route: Option<String>,
    ) -> Result<SessionState> {
        let mut sessions = self.sessions.write();
        let state = sessions
            .entry(session_id.to_owned())
            .or_insert_with(|| SessionState::new(session_id));
        state.messages.extend(new_messages);
        state.step += 1;
        if route.is_some() {
            state.route = route;
        }
        Ok(state.clone())
    }
}
