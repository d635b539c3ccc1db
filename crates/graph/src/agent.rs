//! The agent tool loop.
//!
//! An agent binds the provider to a fixed subset of the tool registry and
//! drives the call-tools-until-done loop for one turn. Tool failures are
//! contained: the model sees the error text as a tool message and decides
//! how to continue. Only the LLM call itself may be retried, once, and
//! only for transient transport errors.

use std::sync::Arc;
use std::time::Duration;

use tt_domain::config::AgentConfig;
use tt_domain::error::{Error, Result};
use tt_domain::tool::{Message, ToolCall};
use tt_providers::{ChatRequest, ChatResponse, LlmProvider};
use tt_tools::ToolRegistry;

pub struct Agent {
    name: String,
    provider: Arc<dyn LlmProvider>,
    registry: Arc<ToolRegistry>,
    /// Names of the registry tools this agent may use. Empty = no tools.
    tool_names: Vec<String>,
    max_tool_loops: usize,
    tool_timeout: Duration,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn LlmProvider>,
        registry: Arc<ToolRegistry>,
        tool_names: Vec<String>,
        cfg: &AgentConfig,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            registry,
            tool_names,
            max_tool_loops: cfg.max_tool_loops,
            tool_timeout: Duration::from_millis(cfg.tool_timeout_ms),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the loop over `base` and return the messages this turn appended:
    /// zero or more (assistant-with-tool-calls, tool-result...) rounds
    /// followed by exactly one final assistant message.
    pub async fn run(&self, base: &[Message]) -> Result<Vec<Message>> {
        let tool_defs = self.registry.definitions_for(&self.tool_names);
        let mut appended: Vec<Message> = Vec::new();

        for loop_idx in 0..self.max_tool_loops {
            let mut messages = base.to_vec();
            messages.extend(appended.iter().cloned());
            let req = ChatRequest {
                messages,
                tools: tool_defs.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                model: None,
            };

            let resp = self.chat_with_retry(req).await?;

            if resp.tool_calls.is_empty() {
                appended.push(Message::assistant(resp.content));
                return Ok(appended);
            }

            tracing::debug!(
                agent = %self.name,
                loop_idx,
                calls = resp.tool_calls.len(),
                "executing tool calls"
            );
            appended.push(Message::assistant_tool_calls(
                resp.content.clone(),
                resp.tool_calls.clone(),
            ));
            for call in &resp.tool_calls {
                let content = self.invoke_tool(call).await;
                appended.push(Message::tool_result(&call.call_id, content));
            }
        }

        tracing::warn!(agent = %self.name, limit = self.max_tool_loops, "tool loop limit reached");
        appended.push(Message::assistant(format!(
            "I had to stop: the tool call limit ({} rounds) was reached before \
             I could finish.",
            self.max_tool_loops
        )));
        Ok(appended)
    }

    /// At most one retry, and only for transient transport failures. A
    /// provider-side or validation error is returned as-is.
    async fn chat_with_retry(&self, req: ChatRequest) -> Result<ChatResponse> {
        match self.provider.chat(req.clone()).await {
            Ok(resp) => Ok(resp),
            Err(e @ (Error::Timeout(_) | Error::Http(_))) => {
                tracing::warn!(agent = %self.name, error = %e, "transient LLM failure, retrying once");
                self.provider.chat(req).await
            }
            Err(e) => Err(e),
        }
    }

    /// Execute one requested call. Failures become the tool message text;
    /// they never abort the turn and are never retried.
    async fn invoke_tool(&self, call: &ToolCall) -> String {
        if !self.tool_names.iter().any(|n| n == &call.tool_name) {
            return format!("error: tool '{}' is not available", call.tool_name);
        }
        let Some(tool) = self.registry.get(&call.tool_name) else {
            return format!("error: tool '{}' is not available", call.tool_name);
        };

        match tokio::time::timeout(self.tool_timeout, tool.invoke(&call.arguments)).await {
            Err(_) => format!(
                "error: tool '{}' timed out after {}ms",
                call.tool_name,
                self.tool_timeout.as_millis()
            ),
            Ok(Err(e)) => format!("error: {e}"),
            Ok(Ok(value)) => value.to_string(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
