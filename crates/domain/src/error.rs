/// Shared error type used across all TwinTalk crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("checkpoint store: {0}")]
    Checkpoint(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("persona not found: {0}")]
    PersonaNotFound(String),

    #[error("ambiguous persona reference: {0}")]
    PersonaAmbiguous(String),

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the caller may safely resubmit the same request.
    ///
    /// Dependency failures (transport, timeout, provider, storage I/O) leave
    /// no partial state behind and are retriable; input and resolution
    /// errors are not — resubmitting the same request will fail again.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::Http(_)
                | Error::Timeout(_)
                | Error::Provider { .. }
                | Error::Checkpoint(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_not_retriable() {
        assert!(!Error::InvalidInput("empty user text".into()).is_retriable());
        assert!(!Error::PersonaNotFound("ana".into()).is_retriable());
        assert!(!Error::PersonaAmbiguous("123".into()).is_retriable());
    }

    #[test]
    fn dependency_errors_are_retriable() {
        assert!(Error::Timeout("llm call".into()).is_retriable());
        assert!(Error::Http("connection reset".into()).is_retriable());
        assert!(Error::Checkpoint("store unavailable".into()).is_retriable());
    }
}
