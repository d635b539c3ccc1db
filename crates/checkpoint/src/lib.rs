//! Durable conversation checkpoints.
//!
//! Each session's full state lives in exactly one store entry addressed by
//! its session ID. The store commits whole turns atomically: a reader
//! observes either the pre-turn state or the complete post-turn state,
//! never a partial transcript.

pub mod file;
pub mod memory;
pub mod state;
pub mod store;

pub use file::FileCheckpointStore;
pub use memory::MemoryCheckpointStore;
pub use state::SessionState;
pub use store::CheckpointStore;
