//! CLI command implementations.

pub mod search;
pub mod template;

pub use search::SearchCommand;
