//! End-to-end turn handling against scripted providers and real stores.

use std::sync::Arc;

use tt_checkpoint::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore, SessionState};
use tt_domain::config::{AgentConfig, RouterConfig};
use tt_domain::error::{Error, Result};
use tt_domain::persona::{build_system_prompt, PersonaRecord};
use tt_domain::tool::{Message, Role};
use tt_graph::{Agent, ChatGraph, Router};
use tt_providers::{
    ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse, LlmProvider,
};
use tt_tools::ToolRegistry;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Test doubles
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Provider that answers the router with "general" and every agent call
/// with a canned assistant reply.
struct EchoPersona;

#[async_trait::async_trait]
impl LlmProvider for EchoPersona {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        // The router sends a single-word classification request; the agent
        // sends the full transcript.
        let is_router = req
            .messages
            .first()
            .map(|m| m.content.contains("request router"))
            .unwrap_or(false);
        let content = if is_router {
            "general".to_owned()
        } else {
            let last_user = req
                .messages
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .map(|m| m.content.clone())
                .unwrap_or_default();
            format!("You said: {last_user}")
        };
        Ok(ChatResponse {
            content,
            tool_calls: vec![],
            usage: None,
            model: "stub".into(),
            finish_reason: Some("stop".into()),
        })
    }

    async fn embeddings(&self, _req: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
        Ok(EmbeddingsResponse { embeddings: vec![] })
    }

    fn provider_id(&self) -> &str {
        "echo"
    }
}

/// Store wrapper that fails every commit, to prove nothing is half-written.
struct BrokenCommit {
    inner: MemoryCheckpointStore,
}

#[async_trait::async_trait]
impl CheckpointStore for BrokenCommit {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>> {
        self.inner.load(session_id).await
    }

    async fn append_and_commit(
        &self,
        _session_id: &str,
        _new_messages: Vec<Message>,
        _route: Option<String>,
    ) -> Result<SessionState> {
        Err(Error::Checkpoint("disk full".into()))
    }
}

fn graph_with(store: Arc<dyn CheckpointStore>) -> ChatGraph {
    let provider: Arc<dyn LlmProvider> = Arc::new(EchoPersona);
    let registry = Arc::new(ToolRegistry::new());
    let cfg = AgentConfig::default();
    ChatGraph::new(
        Router::new(provider.clone(), &RouterConfig::default()),
        Agent::new("general", provider.clone(), registry.clone(), vec![], &cfg),
        Agent::new("documents", provider, registry, vec![], &cfg),
        store,
    )
}

fn ana() -> PersonaRecord {
    PersonaRecord {
        id: 1,
        name: "Ana".into(),
        age: 29,
        location: "Porto".into(),
        description: "Data engineer".into(),
        education: "MSc Informatics".into(),
        tech_skills: "Python, SQL, Spark".into(),
        soft_skills: "communication".into(),
        strengths: "persistence".into(),
        weaknesses: "impatience".into(),
        goals: "lead a data team".into(),
        hobbies: "climbing".into(),
        personality: "curious".into(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn two_turns_build_the_expected_transcript() {
    let graph = graph_with(Arc::new(MemoryCheckpointStore::new()));
    let prompt = build_system_prompt(&ana());

    let first = graph
        .handle_turn(Some("s1"), "Hello", &prompt)
        .await
        .unwrap();
    assert_eq!(first.session_id, "s1");
    assert_eq!(first.transcript.len(), 3);
    assert_eq!(first.transcript[0].role, Role::System);
    assert!(first.transcript[0].content.contains("Ana"));
    assert_eq!(first.transcript[1].content, "Hello");
    assert_eq!(first.transcript[2].role, Role::Assistant);

    let second = graph
        .handle_turn(Some("s1"), "What are your skills?", &prompt)
        .await
        .unwrap();
    assert_eq!(second.transcript.len(), 5);
    // Strict prefix extension of the first transcript.
    for (a, b) in first.transcript.iter().zip(second.transcript.iter()) {
        assert_eq!(a.role, b.role);
        assert_eq!(a.content, b.content);
    }
    assert_eq!(second.transcript[3].content, "What are your skills?");
    assert_eq!(second.assistant_text, "You said: What are your skills?");
}

#[tokio::test]
async fn seeding_is_idempotent() {
    let graph = graph_with(Arc::new(MemoryCheckpointStore::new()));
    let prompt = build_system_prompt(&ana());
    graph.handle_turn(Some("s1"), "Hi", &prompt).await.unwrap();
    let out = graph
        .handle_turn(Some("s1"), "Hi again", &prompt)
        .await
        .unwrap();
    let system_count = out
        .transcript
        .iter()
        .filter(|m| m.role == Role::System)
        .count();
    assert_eq!(system_count, 1);
}

#[tokio::test]
async fn missing_session_id_is_minted_and_reusable() {
    let graph = graph_with(Arc::new(MemoryCheckpointStore::new()));
    let out = graph.handle_turn(None, "Hello", "prompt").await.unwrap();
    assert!(out.session_id.starts_with("session-"));

    let next = graph
        .handle_turn(Some(&out.session_id), "again", "prompt")
        .await
        .unwrap();
    assert_eq!(next.transcript.len(), 5);
}

#[tokio::test]
async fn empty_user_text_is_rejected_before_any_state_change() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let graph = graph_with(store.clone());
    let err = graph.handle_turn(Some("s1"), "   ", "prompt").await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(!err.is_retriable());
    assert!(store.load("s1").await.unwrap().is_none());
}

#[tokio::test]
async fn failed_commit_leaves_pre_turn_state_observable() {
    let inner = MemoryCheckpointStore::new();
    inner
        .append_and_commit("s1", vec![Message::user("before")], None)
        .await
        .unwrap();
    let store = Arc::new(BrokenCommit { inner });
    let graph = graph_with(store.clone());

    let err = graph
        .handle_turn(Some("s1"), "this will not stick", "")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Checkpoint(_)));
    assert!(err.is_retriable());

    let state = store.load("s1").await.unwrap().unwrap();
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages[0].content, "before");
}

#[tokio::test]
async fn state_survives_a_store_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = Arc::new(FileCheckpointStore::new(dir.path()).unwrap());
        let graph = graph_with(store);
        graph
            .handle_turn(Some("s1"), "remember me", "prompt")
            .await
            .unwrap();
    }
    // Fresh store over the same directory, as after a process restart.
    let store = Arc::new(FileCheckpointStore::new(dir.path()).unwrap());
    let graph = graph_with(store);
    let out = graph
        .handle_turn(Some("s1"), "did you?", "prompt")
        .await
        .unwrap();
    assert_eq!(out.transcript.len(), 5);
    assert_eq!(out.transcript[1].content, "remember me");
}

#[tokio::test]
async fn concurrent_turns_on_the_same_session_serialize() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let graph = Arc::new(graph_with(store.clone()));

    let mut handles = Vec::new();
    for i in 0..4 {
        let graph = graph.clone();
        handles.push(tokio::spawn(async move {
            graph
                .handle_turn(Some("s1"), &format!("turn {i}"), "prompt")
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let state = store.load("s1").await.unwrap().unwrap();
    // One system seed, then (user, assistant) per turn; interleaving would
    // break the strict pairing.
    assert_eq!(state.messages.len(), 9);
    assert_eq!(state.step, 4);
    for pair in state.messages[1..].chunks(2) {
        assert_eq!(pair[0].role, Role::User);
        assert_eq!(pair[1].role, Role::Assistant);
        assert_eq!(pair[1].content, format!("You said: {}", pair[0].content));
    }
}

#[tokio::test]
async fn distinct_sessions_do_not_share_history() {
    let graph = Arc::new(graph_with(Arc::new(MemoryCheckpointStore::new())));
    let a = graph.handle_turn(Some("a"), "for a", "pa").await.unwrap();
    let b = graph.handle_turn(Some("b"), "for b", "pb").await.unwrap();
    assert_eq!(a.transcript.len(), 3);
    assert_eq!(b.transcript.len(), 3);
    assert_eq!(a.transcript[0].content, "pa");
    assert_eq!(b.transcript[0].content, "pb");
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Routing through the graph
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Provider whose router reply is unparseable, so the keyword fallback
/// decides.
struct ConfusedClassifier;

#[async_trait::async_trait]
impl LlmProvider for ConfusedClassifier {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        let is_router = req
            .messages
            .first()
            .map(|m| m.content.contains("request router"))
            .unwrap_or(false);
        let content = if is_router {
            "hmm, hard to say".to_owned()
        } else {
            "done".to_owned()
        };
        Ok(ChatResponse {
            content,
            tool_calls: vec![],
            usage: None,
            model: "stub".into(),
            finish_reason: Some("stop".into()),
        })
    }

    async fn embeddings(&self, _req: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
        Ok(EmbeddingsResponse { embeddings: vec![] })
    }

    fn provider_id(&self) -> &str {
        "confused"
    }
}

#[tokio::test]
async fn keyword_fallback_routes_thesis_questions_to_documents() {
    let provider: Arc<dyn LlmProvider> = Arc::new(ConfusedClassifier);
    let store = Arc::new(MemoryCheckpointStore::new());
    let registry = Arc::new(ToolRegistry::new());
    let cfg = AgentConfig::default();
    let graph = ChatGraph::new(
        Router::new(provider.clone(), &RouterConfig::default()),
        Agent::new("general", provider.clone(), registry.clone(), vec![], &cfg),
        Agent::new("documents", provider, registry, vec![], &cfg),
        store.clone(),
    );

    graph
        .handle_turn(Some("s1"), "what does the thesis conclude?", "")
        .await
        .unwrap();
    let state = store.load("s1").await.unwrap().unwrap();
    assert_eq!(state.route.as_deref(), Some("documents"));

    graph
        .handle_turn(Some("s2"), "tell me a joke", "")
        .await
        .unwrap();
    let state = store.load("s2").await.unwrap().unwrap();
    assert_eq!(state.route.as_deref(), Some("general"));
}
