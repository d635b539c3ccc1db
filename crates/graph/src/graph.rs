//! Turn handling.
//!
//! `ChatGraph` wires the router, the two agents and the checkpoint store
//! into a single `handle_turn` entry point. Exactly one checkpoint commit
//! happens per successful turn; any failure before the commit leaves the
//! previous state untouched.

use std::sync::Arc;

use tt_checkpoint::CheckpointStore;
use tt_domain::error::{Error, Result};
use tt_domain::tool::{Message, Role};

use crate::agent::Agent;
use crate::router::{Route, Router};
use crate::session_lock::SessionLockMap;

/// Result of one completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The session the turn ran against (minted here when the caller had none).
    pub session_id: String,
    /// Content of the final assistant message.
    pub assistant_text: String,
    /// The full committed transcript, oldest first.
    pub transcript: Vec<Message>,
}

pub struct ChatGraph {
    router: Router,
    general_agent: Agent,
    documents_agent: Agent,
    store: Arc<dyn CheckpointStore>,
    locks: SessionLockMap,
}

impl ChatGraph {
    pub fn new(
        router: Router,
        general_agent: Agent,
        documents_agent: Agent,
        store: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            router,
            general_agent,
            documents_agent,
            store,
            locks: SessionLockMap::new(),
        }
    }

    /// Run one conversation turn.
    ///
    /// `system_prompt_if_new` seeds a brand-new session with one system
    /// message; an existing session is never re-seeded.
    pub async fn handle_turn(
        &self,
        session_id: Option<&str>,
        user_text: &str,
        system_prompt_if_new: &str,
    ) -> Result<TurnOutcome> {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return Err(Error::InvalidInput("user text must be non-empty".into()));
        }

        let session_id = match session_id {
            Some(id) => id.to_owned(),
            None => format!("session-{}", uuid::Uuid::new_v4()),
        };

        // Hold the lock for the whole turn: routing through commit.
        let _permit = self.locks.acquire(&session_id).await?;

        // A store failure here is fatal for the turn; it is never treated
        // as "no prior session".
        let prior = self.store.load(&session_id).await?;
        let (base, seeded) = match prior {
            Some(state) => (state.messages, false),
            None if !system_prompt_if_new.is_empty() => {
                (vec![Message::system(system_prompt_if_new)], true)
            }
            None => (Vec::new(), true),
        };

        let mut working = base;
        let base_len = if seeded { 0 } else { working.len() };
        working.push(Message::user(user_text));

        let route = self.router.select_route(&working).await;
        let agent = match route {
            Route::General => &self.general_agent,
            Route::Documents => &self.documents_agent,
        };
        tracing::info!(
            session_id,
            route = route.as_str(),
            agent = agent.name(),
            "turn routed"
        );

        let agent_messages = agent.run(&working).await?;
        working.extend(agent_messages);

        // Single atomic commit covering everything this turn added.
        let new_messages = working[base_len..].to_vec();
        let state = self
            .store
            .append_and_commit(&session_id, new_messages, Some(route.as_str().to_owned()))
            .await?;

        let assistant_text = state
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        Ok(TurnOutcome {
            session_id,
            assistant_text,
            transcript: state.messages,
        })
    }
}
