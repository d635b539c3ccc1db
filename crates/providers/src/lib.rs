//! LLM provider adapters.
//!
//! The rest of the system talks to models exclusively through the
//! [`LlmProvider`] trait; the only shipped adapter speaks the
//! OpenAI-compatible chat completions contract.

pub mod openai_compat;
pub mod traits;
pub(crate) mod util;

pub use openai_compat::OpenAiCompatProvider;
pub use traits::{
    ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse, LlmProvider, Usage,
};
