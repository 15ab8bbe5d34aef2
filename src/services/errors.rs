use thiserror::Error;

use crate::domain::types::TypeConstraintError;
use crate::forms::FormError;
use crate::graph::GraphError;

/// Errors returned by the service layer to the routes.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Form(String),

    /// The Graph client could not be resolved.
    #[error("directory is unavailable: {0}")]
    Unavailable(String),

    #[error("directory request failed: {0}")]
    Graph(#[from] GraphError),

    #[error("not found")]
    NotFound,

    #[error("internal error")]
    Internal,
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        ServiceError::Form(err.to_string())
    }
}

impl From<TypeConstraintError> for ServiceError {
    fn from(err: TypeConstraintError) -> Self {
        ServiceError::Form(err.to_string())
    }
}
