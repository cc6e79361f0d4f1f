//! Board Errors
//!
//! Error type shared by the engine and the remote authority implementations.

use serde::{Deserialize, Serialize};

/// Common result type for board operations
pub type BoardResult<T> = Result<T, BoardError>;

/// Board-level errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardError {
    NotFound(String),
    InvalidInput(String),
    /// Credentials missing, expired or not allowed to touch the item
    Unauthorized(String),
    /// Transport failure or unexpected response from the authority
    Network(String),
    Internal(String),
}

impl BoardError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BoardError::Unauthorized(_))
    }
}

impl std::fmt::Display for BoardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardError::NotFound(msg) => write!(f, "Not found: {}", msg),
            BoardError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            BoardError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            BoardError::Network(msg) => write!(f, "Network error: {}", msg),
            BoardError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for BoardError {}
