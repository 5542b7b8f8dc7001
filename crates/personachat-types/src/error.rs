use thiserror::Error;
use uuid::Uuid;

use crate::llm::LlmError;

/// Errors related to persona operations.
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("Persona '{0}' not found")]
    NotFound(String),

    #[error("A persona named '{0}' already exists")]
    Conflict(String),

    #[error("Cannot {0} default personas")]
    DefaultImmutable(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors related to chat operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("Persona '{0}' not found")]
    PersonaNotFound(String),

    #[error("chat session {0} not found")]
    SessionNotFound(Uuid),

    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors from repository operations (used by trait definitions in personachat-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        ChatError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_error_display() {
        assert_eq!(
            PersonaError::NotFound("pirate".to_string()).to_string(),
            "Persona 'pirate' not found"
        );
        assert_eq!(
            PersonaError::DefaultImmutable("delete").to_string(),
            "Cannot delete default personas"
        );
        assert!(PersonaError::Conflict("Pirate".into()).to_string().contains("already exists"));
    }

    #[test]
    fn test_chat_error_from_repository() {
        let err: ChatError = RepositoryError::Query("disk I/O".to_string()).into();
        assert!(matches!(err, ChatError::Storage(ref m) if m.contains("disk I/O")));
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
