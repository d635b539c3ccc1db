//! Wires the runtime together from the config file.

use std::sync::Arc;

use tt_checkpoint::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
use tt_domain::config::{CheckpointBackend, Config};
use tt_domain::persona::PersonaStore;
use tt_graph::{Agent, ChatGraph, Router};
use tt_providers::{LlmProvider, OpenAiCompatProvider};
use tt_retrieval::DocumentIndex;
use tt_tools::{DocumentSearchTool, GithubRepoSummaryTool, HealthMetricsTool, ToolRegistry};

/// Build the conversation graph and the persona store.
pub fn build(config: &Config) -> anyhow::Result<(ChatGraph, PersonaStore)> {
    let provider: Arc<dyn LlmProvider> = Arc::new(OpenAiCompatProvider::from_config(&config.llm)?);

    let index = Arc::new(DocumentIndex::load(&config.retrieval.index_path)?);

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(HealthMetricsTool::new(&config.metrics.data_path)));
    registry.register(Arc::new(GithubRepoSummaryTool::new(&config.github)?));
    registry.register(Arc::new(DocumentSearchTool::new(
        index,
        provider.clone(),
        &config.retrieval,
    )));
    let registry = Arc::new(registry);

    let sampling = (config.llm.temperature, config.llm.max_tokens);
    let general_agent = Agent::new(
        "general",
        provider.clone(),
        registry.clone(),
        vec!["health.metrics".into(), "github.repo_summary".into()],
        &config.agent,
    )
    .with_sampling(Some(sampling.0), sampling.1);
    let documents_agent = Agent::new(
        "documents",
        provider.clone(),
        registry,
        vec!["documents.search".into()],
        &config.agent,
    )
    .with_sampling(Some(sampling.0), sampling.1);

    let store: Arc<dyn CheckpointStore> = match config.checkpoint.backend {
        CheckpointBackend::File => Arc::new(FileCheckpointStore::new(&config.checkpoint.path)?),
        CheckpointBackend::Memory => {
            tracing::warn!("memory checkpoint backend selected: state will not survive restart");
            Arc::new(MemoryCheckpointStore::new())
        }
    };

    let router = Router::new(provider, &config.router);
    let graph = ChatGraph::new(router, general_agent, documents_agent, store);

    let personas = PersonaStore::load_dir(&config.personas.path)?;
    Ok((graph, personas))
}

/// One display line per persona.
pub fn persona_listing(store: &PersonaStore) -> Vec<String> {
    store
        .records()
        .iter()
        .map(|p| format!("{:>4}  {} ({}, {})", p.id, p.name, p.age, p.location))
        .collect()
}
