//! Built-in tools for TwinTalk.
//!
//! Each tool publishes a JSON-Schema definition for the LLM and validates
//! its arguments by deserializing into a typed request struct. Invocations
//! are idempotent reads; a failed call never aborts the turn.

pub mod documents;
pub mod error;
pub mod github;
pub mod metrics;
pub mod registry;

pub use documents::DocumentSearchTool;
pub use error::ToolError;
pub use github::GithubRepoSummaryTool;
pub use metrics::HealthMetricsTool;
pub use registry::{Tool, ToolRegistry};
