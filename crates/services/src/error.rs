use thiserror::Error;

use crate::dao::base::DaoError;

/// Failures surfaced by the membership and chat services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Validation: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(#[from] DaoError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
