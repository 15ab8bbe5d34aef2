//! Directory search: observable state, the Graph-backed search engine and
//! the per-session controller composing them.

pub mod controller;
pub mod engine;
pub mod store;

pub use controller::{DirectoryController, DirectoryView};
pub use engine::{DirectoryScope, EngineState, FetchOutcome, PendingFetch, SearchEngine};
