//! Form definitions backing the directory routes.

use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::types::TypeConstraintError;

pub mod directory;

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("value cannot be empty")]
    EmptyValue,

    #[error("invalid group id")]
    InvalidGroup,

    #[error("invalid page size")]
    InvalidPageSize,

    #[error("unknown department")]
    UnknownDepartment,
}

impl From<TypeConstraintError> for FormError {
    fn from(err: TypeConstraintError) -> Self {
        match err {
            TypeConstraintError::EmptyString => FormError::EmptyValue,
            TypeConstraintError::PageSizeOutOfRange => FormError::InvalidPageSize,
            TypeConstraintError::InvalidGroupId => FormError::InvalidGroup,
        }
    }
}
