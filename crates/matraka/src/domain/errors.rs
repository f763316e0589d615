//! Domain-specific errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("macro {0} not found")]
    MacroNotFound(u64),
}
