//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// No usable provider configured; the turn cannot start
    #[error("Authentication required: {0}")]
    Auth(String),

    /// Non-success HTTP status from a provider or the search proxy
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// Transport failure (connect, TLS, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Response shape failed validation
    #[error("Format error: {0}")]
    Format(String),

    /// Tool name not in the dispatch table
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool handler body raised
    #[error("Execution error: {0}")]
    Execution(String),

    /// A turn is already in flight for this session
    #[error("A turn is already in progress")]
    Busy,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Errors the gateway recovers from by falling back to simulation
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            AgentError::Http { .. }
                | AgentError::Network(_)
                | AgentError::Format(_)
                | AgentError::Json(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Auth(_) => {
                "Please configure an API key or enable simulation mode before sending.".into()
            }
            AgentError::Http { status, .. } => format!("The AI service returned status {status}."),
            AgentError::Network(_) => "The AI service could not be reached.".into(),
            AgentError::Format(_) => {
                "The AI service sent a response that could not be understood.".into()
            }
            AgentError::UnknownTool(name) => format!("The tool '{name}' is not available."),
            AgentError::Execution(msg) => format!("Tool error: {msg}"),
            AgentError::Busy => "Still working on the previous message. Please wait.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_failure_classification() {
        assert!(AgentError::Http { status: 500, body: String::new() }.is_provider_failure());
        assert!(AgentError::Format("missing content".into()).is_provider_failure());
        assert!(!AgentError::Auth("no key".into()).is_provider_failure());
        assert!(!AgentError::Busy.is_provider_failure());
    }
}
