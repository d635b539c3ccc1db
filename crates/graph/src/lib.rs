//! Conversation orchestration engine.
//!
//! A turn flows: per-session lock → load checkpoint → route → agent tool
//! loop → single atomic checkpoint commit. The graph owns no global state;
//! every dependency is passed in at construction.

pub mod agent;
pub mod graph;
pub mod router;
pub mod session_lock;

pub use agent::Agent;
pub use graph::{ChatGraph, TurnOutcome};
pub use router::{Route, Router};
pub use session_lock::SessionLockMap;
