//! Document lookup over the hybrid retrieval index.
//!
//! Embeds the query through the LLM provider, then unions the keyword and
//! dense rankings. The number of passages returned is tool configuration,
//! not something the model can ask for.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tt_domain::config::RetrievalConfig;
use tt_domain::tool::ToolDefinition;
use tt_providers::{EmbeddingsRequest, LlmProvider};
use tt_retrieval::DocumentIndex;

use crate::error::ToolError;
use crate::registry::Tool;

pub struct DocumentSearchTool {
    index: Arc<DocumentIndex>,
    provider: Arc<dyn LlmProvider>,
    top_k: usize,
    candidates_per_ranking: usize,
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
}

impl DocumentSearchTool {
    pub fn new(
        index: Arc<DocumentIndex>,
        provider: Arc<dyn LlmProvider>,
        cfg: &RetrievalConfig,
    ) -> Self {
        Self {
            index,
            provider,
            top_k: cfg.top_k,
            candidates_per_ranking: cfg.candidates_per_ranking,
        }
    }
}

#[async_trait::async_trait]
impl Tool for DocumentSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "documents.search".into(),
            description: "Search the indexed document corpus and return the \
                          most relevant passages."
                .into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query" }
                },
                "required": ["query"]
            }),
        }
    }

    async fn invoke(&self, arguments: &Value) -> Result<Value, ToolError> {
        let req = SearchRequest::deserialize(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        let query = req.query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArguments("query must be non-empty".into()));
        }

        let embeddings = self
            .provider
            .embeddings(EmbeddingsRequest {
                input: vec![query.to_owned()],
                model: None,
            })
            .await
            .map_err(|e| ToolError::Upstream(e.to_string()))?;
        let query_embedding = embeddings.embeddings.into_iter().next().unwrap_or_default();

        let passages = self.index.hybrid_search(
            query,
            &query_embedding,
            self.candidates_per_ranking,
            self.top_k,
        );

        tracing::debug!(query, hits = passages.len(), "document search");
        Ok(serde_json::json!({
            "query": query,
            "passage_count": passages.len(),
            "passages": passages,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tt_domain::error::Result;
    use tt_providers::{ChatRequest, ChatResponse, EmbeddingsResponse};
    use tt_retrieval::Document;

    /// Provider stub returning a fixed embedding.
    struct FixedEmbedding(Vec<f32>);

    #[async_trait::async_trait]
    impl LlmProvider for FixedEmbedding {
        async fn chat(&self, _req: ChatRequest) -> Result<ChatResponse> {
            unreachable!("chat is not used by the search tool")
        }

        async fn embeddings(&self, _req: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
            Ok(EmbeddingsResponse {
                embeddings: vec![self.0.clone()],
            })
        }

        fn provider_id(&self) -> &str {
            "stub"
        }
    }

    fn index_with_docs() -> Arc<DocumentIndex> {
        let idx = DocumentIndex::new();
        idx.add(Document {
            id: "d1".into(),
            source: "thesis.pdf".into(),
            text: "methodology for streaming pipelines".into(),
            embedding: vec![1.0, 0.0],
        });
        idx.add(Document {
            id: "d2".into(),
            source: "thesis.pdf".into(),
            text: "conclusions and future work".into(),
            embedding: vec![0.0, 1.0],
        });
        Arc::new(idx)
    }

    #[tokio::test]
    async fn returns_bounded_passages() {
        let cfg = RetrievalConfig {
            top_k: 1,
            ..Default::default()
        };
        let tool = DocumentSearchTool::new(
            index_with_docs(),
            Arc::new(FixedEmbedding(vec![1.0, 0.0])),
            &cfg,
        );
        let out = tool
            .invoke(&serde_json::json!({"query": "methodology"}))
            .await
            .unwrap();
        assert_eq!(out["passage_count"], 1);
        assert_eq!(out["passages"][0]["id"], "d1");
    }

    #[tokio::test]
    async fn blank_query_is_invalid_arguments() {
        let cfg = RetrievalConfig::default();
        let tool = DocumentSearchTool::new(
            index_with_docs(),
            Arc::new(FixedEmbedding(vec![1.0, 0.0])),
            &cfg,
        );
        let err = tool
            .invoke(&serde_json::json!({"query": "   "}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
