//! Persisted hybrid document index.
//!
//! Documents carry both raw text (for keyword ranking) and a pre-computed
//! embedding (for dense-vector ranking). Queries union the two rankings,
//! dedupe, and return a bounded top-K.

pub mod index;
pub mod math;

pub use index::{Document, DocumentIndex, Passage};
pub use math::cosine_similarity;
