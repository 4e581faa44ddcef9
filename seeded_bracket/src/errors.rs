//! Bracket error types.

use crate::bracket::models::DivisionId;
use thiserror::Error;

/// Bracket errors
///
/// Every error is scoped to a single division's bracket.
#[derive(Debug, Error)]
pub enum BracketError {
    /// Invalid bracket size or seed range (a caller bug, never retried)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Bad entrant, seed or result input; shown to the operator as-is
    #[error("Validation error: {0}")]
    Validation(String),

    /// Advancement requested before every match in the round has a winner
    #[error("Round {round} is incomplete: unresolved slots {unresolved:?}")]
    IncompleteRound { round: u32, unresolved: Vec<u32> },

    /// The division lock could not be acquired in time
    #[error("Division {division} is being modified by another writer (gave up after {attempts} attempts)")]
    ConcurrentModification { division: DivisionId, attempts: u32 },

    /// Failure reported by the persistence collaborator
    #[error("Store error: {0}")]
    Store(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BracketError {
    /// Whether the caller should retry the operation later
    ///
    /// Incomplete rounds resolve once a result is recorded, and lock
    /// contention clears once the other writer commits.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BracketError::IncompleteRound { .. } | BracketError::ConcurrentModification { .. }
        )
    }

    /// Get a client-safe error message
    ///
    /// Validation messages are passed through verbatim so the operator can
    /// fix the input; storage errors are sanitized.
    pub fn client_message(&self) -> String {
        match self {
            BracketError::Validation(msg) => msg.clone(),
            BracketError::Store(_) => "Internal storage error".to_string(),
            BracketError::ConcurrentModification { .. } => {
                "Bracket is being updated by someone else, try again".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;
