/// Errors a tool invocation can produce.
///
/// `InvalidArguments` means the caller's input was rejected before any
/// work happened; it is never conflated with a legitimately empty result,
/// which tools report as a successful value with explicit zero counts.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("execution failed: {0}")]
    Execution(String),

    #[error("upstream dependency failed: {0}")]
    Upstream(String),
}
