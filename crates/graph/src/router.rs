//! Route selection for an incoming turn.
//!
//! The router inspects only the most recent user message. A constrained
//! classification call asks the model for exactly one tag; anything less
//! than an unambiguous answer falls back to a keyword regex, and an empty
//! keyword match defaults to the general route. Routing never fails a turn.

use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use tt_domain::config::RouterConfig;
use tt_domain::tool::{Message, Role};
use tt_providers::{ChatRequest, LlmProvider};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Route
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The closed set of routes a turn can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    General,
    Documents,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::General => "general",
            Route::Documents => "documents",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Router
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const CLASSIFY_PROMPT: &str = "You are a request router. Reply with exactly one \
word: 'documents' if the user is asking about the indexed document corpus \
(thesis, reports, papers), otherwise 'general'. No other text.";

pub struct Router {
    provider: Arc<dyn LlmProvider>,
    keyword_regex: Option<Regex>,
}

impl Router {
    pub fn new(provider: Arc<dyn LlmProvider>, cfg: &RouterConfig) -> Self {
        Self {
            provider,
            keyword_regex: build_keyword_regex(&cfg.document_keywords),
        }
    }

    /// Pick the route for the conversation's most recent user message.
    pub async fn select_route(&self, messages: &[Message]) -> Route {
        let Some(user_text) = last_user_text(messages) else {
            return Route::General;
        };

        let req = ChatRequest {
            messages: vec![Message::system(CLASSIFY_PROMPT), Message::user(user_text)],
            temperature: Some(0.0),
            max_tokens: Some(8),
            ..Default::default()
        };

        match self.provider.chat(req).await {
            Ok(resp) => {
                if let Some(route) = parse_route_tag(&resp.content) {
                    tracing::debug!(route = route.as_str(), "route from classifier");
                    return route;
                }
                tracing::debug!(reply = %resp.content, "classifier reply unparseable, using keyword fallback");
            }
            Err(e) => {
                tracing::warn!(error = %e, "classifier call failed, using keyword fallback");
            }
        }

        self.keyword_fallback(user_text)
    }

    fn keyword_fallback(&self, user_text: &str) -> Route {
        match self.keyword_regex {
            Some(ref re) if re.is_match(user_text) => Route::Documents,
            _ => Route::General,
        }
    }
}

/// Whole-word, case-insensitive match over the configured keywords.
fn build_keyword_regex(keywords: &[String]) -> Option<Regex> {
    let words: Vec<String> = keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .map(|k| regex::escape(k.trim()))
        .collect();
    if words.is_empty() {
        return None;
    }
    RegexBuilder::new(&format!(r"\b(?:{})\b", words.join("|")))
        .case_insensitive(true)
        .build()
        .map_err(|e| {
            tracing::warn!(error = %e, "invalid router keyword pattern, keyword fallback disabled");
        })
        .ok()
}

fn last_user_text(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
}

/// Accept the model's reply only when it contains exactly one recognized
/// tag. "documents or general" is ambiguous and rejected.
fn parse_route_tag(reply: &str) -> Option<Route> {
    let lower = reply.to_lowercase();
    let has_documents = lower.contains("documents");
    let has_general = lower.contains("general");
    match (has_documents, has_general) {
        (true, false) => Some(Route::Documents),
        (false, true) => Some(Route::General),
        _ => None,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
