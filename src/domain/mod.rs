//! Domain entities exposed by the directory layer.

pub mod group;
pub mod person;
pub mod types;
