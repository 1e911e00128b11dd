//! The tagged error surface exposed to route handlers.

use thiserror::Error;

use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("caller identity required")]
    AuthRequired,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("conflicting concurrent write on `{constraint}`")]
    Conflict { constraint: String },
    #[error(transparent)]
    Store(RepoError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }
}

impl From<RepoError> for ServiceError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => ServiceError::NotFound { entity: "record" },
            RepoError::Duplicate { constraint } => ServiceError::Conflict { constraint },
            RepoError::InvalidInput { message } => ServiceError::Validation(message),
            other => ServiceError::Store(other),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { message } => ServiceError::Validation(message),
            DomainError::Invariant { message } => {
                ServiceError::Store(RepoError::Integrity { message })
            }
        }
    }
}
