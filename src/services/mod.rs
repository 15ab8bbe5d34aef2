pub mod directory;
pub mod errors;
pub mod groups;

pub use errors::{ServiceError, ServiceResult};
