use tt_domain::error::Result;
use tt_domain::tool::Message;

use crate::state::SessionState;

/// Persistence contract for conversation checkpoints.
///
/// `load` distinguishes "no prior session" (`Ok(None)`) from "prior state
/// unreachable" (`Err`) — the two must never be conflated, or a storage
/// outage would silently restart every conversation from scratch.
#[async_trait::async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Fetch the latest committed state for a session.
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>>;

    /// Append `new_messages` to the session (creating it on first use),
    /// bump the step counter, and durably commit the whole state in one
    /// atomic operation. Returns the committed state.
    async fn append_and_commit(
        &self,
        session_id: &str,
        new_messages: Vec<Message>,
        route: Option<String>,
    ) -> Result<SessionState>;
}
