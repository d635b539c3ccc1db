//! Shared domain types for TwinTalk: messages, tool call formats, the
//! configuration tree, personas, and the common error type.

pub mod config;
pub mod error;
pub mod persona;
pub mod tool;

pub use error::{Error, Result};
