//! GitHub user repository summary.
//!
//! Verifies the user exists, pages through their public repositories,
//! and reports a deduplicated repo list plus primary-language shares.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tt_domain::tool::ToolDefinition;

use crate::error::ToolError;
use crate::registry::Tool;

pub struct GithubRepoSummaryTool {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RepoSummaryRequest {
    username: String,
}

/// The fields we keep from the GitHub repo payload.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RepoInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    pub html_url: String,
    #[serde(default, rename = "stargazers_count")]
    pub stars: u64,
}

impl GithubRepoSummaryTool {
    pub fn new(cfg: &tt_domain::config::GithubConfig) -> Result<Self, tt_domain::Error> {
        let token = std::env::var(&cfg.token_env).ok();
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.request_timeout_ms))
            .user_agent("twintalk")
            .build()
            .map_err(|e| tt_domain::Error::Http(e.to_string()))?;
        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        if let Some(ref token) = self.token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder
    }

    async fn fetch_summary(&self, username: &str) -> Result<Value, ToolError> {
        // 1) Verify the user exists.
        let user_url = format!("{}/users/{username}", self.base_url);
        let resp = self
            .get(&user_url)
            .send()
            .await
            .map_err(|e| ToolError::Upstream(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ToolError::Execution(format!(
                "GitHub user '{username}' not found"
            )));
        }
        if !resp.status().is_success() {
            return Err(ToolError::Upstream(format!(
                "GitHub user lookup: HTTP {}",
                resp.status().as_u16()
            )));
        }

        // 2) Page through public repos until an empty page.
        let mut repos: Vec<RepoInfo> = Vec::new();
        let mut page = 1u32;
        loop {
            let url = format!(
                "{}/users/{username}/repos?per_page=100&page={page}&type=public&sort=updated",
                self.base_url
            );
            let resp = self
                .get(&url)
                .send()
                .await
                .map_err(|e| ToolError::Upstream(e.to_string()))?;
            if !resp.status().is_success() {
                return Err(ToolError::Upstream(format!(
                    "GitHub repo listing: HTTP {}",
                    resp.status().as_u16()
                )));
            }
            let batch: Vec<RepoInfo> = resp
                .json()
                .await
                .map_err(|e| ToolError::Upstream(e.to_string()))?;
            if batch.is_empty() {
                break;
            }
            repos.extend(batch);
            page += 1;
        }

        Ok(summarize_repos(username, repos))
    }
}

/// Dedupe by URL, order by stars desc then name asc, and compute
/// primary-language shares.
pub(crate) fn summarize_repos(username: &str, repos: Vec<RepoInfo>) -> Value {
    let mut seen = std::collections::HashSet::new();
    let mut deduped: Vec<RepoInfo> = repos
        .into_iter()
        .filter(|r| seen.insert(r.html_url.clone()))
        .collect();
    deduped.sort_by(|a, b| {
        b.stars
            .cmp(&a.stars)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    let mut lang_counts: HashMap<String, u64> = HashMap::new();
    for repo in &deduped {
        if let Some(ref lang) = repo.language {
            *lang_counts.entry(lang.clone()).or_insert(0) += 1;
        }
    }
    let total: u64 = lang_counts.values().sum::<u64>().max(1);
    let mut top_languages: Vec<_> = lang_counts.into_iter().collect();
    top_languages.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let top_languages: Vec<Value> = top_languages
        .into_iter()
        .map(|(language, count)| {
            let percent = (10_000.0 * count as f64 / total as f64).round() / 100.0;
            serde_json::json!({"language": language, "count": count, "percent": percent})
        })
        .collect();

    let repos_min: Vec<Value> = deduped
        .iter()
        .map(|r| {
            serde_json::json!({
                "name": r.name,
                "description": r.description.clone().unwrap_or_default(),
                "language": r.language,
                "html_url": r.html_url,
            })
        })
        .collect();

    serde_json::json!({
        "user": username,
        "repo_count": repos_min.len(),
        "repos": repos_min,
        "top_languages": top_languages,
    })
}

#[async_trait::async_trait]
impl Tool for GithubRepoSummaryTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "github.repo_summary".into(),
            description: "Summarize a GitHub user's public repositories: \
                          repo list and top primary languages."
                .into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "username": { "type": "string", "description": "GitHub login" }
                },
                "required": ["username"]
            }),
        }
    }

    async fn invoke(&self, arguments: &Value) -> Result<Value, ToolError> {
        let req = RepoSummaryRequest::deserialize(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        let username = req.username.trim();
        if username.is_empty() {
            return Err(ToolError::InvalidArguments("username must be non-empty".into()));
        }
        self.fetch_summary(username).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str, language: Option<&str>, url: &str, stars: u64) -> RepoInfo {
        RepoInfo {
            name: name.into(),
            description: None,
            language: language.map(String::from),
            html_url: url.into(),
            stars,
        }
    }

    #[test]
    fn summary_dedupes_and_sorts() {
        let out = summarize_repos(
            "ana",
            vec![
                repo("zeta", Some("Rust"), "https://g/zeta", 5),
                repo("alpha", Some("Python"), "https://g/alpha", 5),
                repo("zeta", Some("Rust"), "https://g/zeta", 5), // duplicate URL
                repo("beta", Some("Rust"), "https://g/beta", 50),
            ],
        );
        assert_eq!(out["repo_count"], 3);
        // Stars desc, then name asc for ties.
        assert_eq!(out["repos"][0]["name"], "beta");
        assert_eq!(out["repos"][1]["name"], "alpha");
        assert_eq!(out["repos"][2]["name"], "zeta");
    }

    #[test]
    fn language_percentages_cover_primary_languages_only() {
        let out = summarize_repos(
            "ana",
            vec![
                repo("a", Some("Rust"), "https://g/a", 0),
                repo("b", Some("Rust"), "https://g/b", 0),
                repo("c", Some("Python"), "https://g/c", 0),
                repo("d", None, "https://g/d", 0),
            ],
        );
        let langs = out["top_languages"].as_array().unwrap();
        assert_eq!(langs.len(), 2);
        assert_eq!(langs[0]["language"], "Rust");
        assert_eq!(langs[0]["count"], 2);
        assert_eq!(langs[0]["percent"], 66.67);
        assert_eq!(langs[1]["percent"], 33.33);
    }

    #[test]
    fn no_repos_is_a_valid_summary() {
        let out = summarize_repos("ana", vec![]);
        assert_eq!(out["repo_count"], 0);
        assert!(out["top_languages"].as_array().unwrap().is_empty());
    }
}
