use serde::{Deserialize, Serialize};
use tt_domain::tool::Message;

/// Complete state of one conversation session.
///
/// Mutated only by appending messages; `step` counts committed turns and is
/// strictly monotonically increasing per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub messages: Vec<Message>,
    /// Route selected for the most recent turn.
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub step: u64,
}

impl SessionState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            route: None,
            step: 0,
        }
    }
}
