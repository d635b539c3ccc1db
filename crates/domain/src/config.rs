use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub personas: PersonasConfig,
}

impl Config {
    /// Load a TOML config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&raw).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key.
    #[serde(default = "d_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "d_model")]
    pub model: String,
    #[serde(default = "d_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "d_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Per-request timeout applied to chat and embedding calls.
    #[serde(default = "d_30000")]
    pub request_timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            api_key_env: d_api_key_env(),
            model: d_model(),
            embedding_model: d_embedding_model(),
            temperature: d_temperature(),
            max_tokens: None,
            request_timeout_ms: 30_000,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Checkpoint store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointBackend {
    /// Durable file-backed store (one JSON file per session).
    File,
    /// In-memory store. Local/ephemeral development only — state is lost
    /// on restart, so never select this in a production deployment.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    #[serde(default = "d_backend")]
    pub backend: CheckpointBackend,
    #[serde(default = "d_checkpoint_path")]
    pub path: PathBuf,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            backend: CheckpointBackend::File,
            path: d_checkpoint_path(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Router
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Keywords that send a turn to the document-lookup route when the
    /// classification call fails to produce a recognizable tag.
    #[serde(default = "d_doc_keywords")]
    pub document_keywords: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            document_keywords: d_doc_keywords(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Agent tool loop
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum tool-call loop iterations before the turn is force-stopped.
    #[serde(default = "d_8")]
    pub max_tool_loops: usize,
    /// Timeout applied to each individual tool invocation.
    #[serde(default = "d_15000")]
    pub tool_timeout_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_loops: 8,
            tool_timeout_ms: 15_000,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Retrieval index
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "d_index_path")]
    pub index_path: PathBuf,
    /// Passages returned per query. Tool-level constant, not caller-set.
    #[serde(default = "d_3u")]
    pub top_k: usize,
    /// Candidates drawn from each ranking before the hybrid merge.
    #[serde(default = "d_8")]
    pub candidates_per_ranking: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            index_path: d_index_path(),
            top_k: 3,
            candidates_per_ranking: 8,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tool data sources
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Root of the time-partitioned health dataset
    /// (`year=YYYY/month=MM.jsonl` layout).
    #[serde(default = "d_metrics_path")]
    pub data_path: PathBuf,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            data_path: d_metrics_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "d_github_url")]
    pub base_url: String,
    /// Environment variable holding an optional bearer token.
    #[serde(default = "d_github_token_env")]
    pub token_env: String,
    #[serde(default = "d_15000")]
    pub request_timeout_ms: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            base_url: d_github_url(),
            token_env: d_github_token_env(),
            request_timeout_ms: 15_000,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Personas
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonasConfig {
    /// Directory of `persona_<name>.json` files.
    #[serde(default = "d_personas_path")]
    pub path: PathBuf,
}

impl Default for PersonasConfig {
    fn default() -> Self {
        Self {
            path: d_personas_path(),
        }
    }
}

// ── Serde default helpers ──────────────────────────────────────────

fn d_base_url() -> String {
    "https://api.groq.com/openai/v1".into()
}
fn d_api_key_env() -> String {
    "GROQ_API_KEY".into()
}
fn d_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn d_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn d_temperature() -> f32 {
    0.3
}
fn d_backend() -> CheckpointBackend {
    CheckpointBackend::File
}
fn d_checkpoint_path() -> PathBuf {
    PathBuf::from("./data/checkpoints")
}
fn d_doc_keywords() -> Vec<String> {
    ["thesis", "dissertation", "report", "paper", "document"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn d_index_path() -> PathBuf {
    PathBuf::from("./data/thesis_index.json")
}
fn d_metrics_path() -> PathBuf {
    PathBuf::from("./data/health")
}
fn d_github_url() -> String {
    "https://api.github.com".into()
}
fn d_github_token_env() -> String {
    "GITHUB_TOKEN".into()
}
fn d_personas_path() -> PathBuf {
    PathBuf::from("./personas")
}
fn d_8() -> usize {
    8
}
fn d_3u() -> usize {
    3
}
fn d_15000() -> u64 {
    15_000
}
fn d_30000() -> u64 {
    30_000
}
