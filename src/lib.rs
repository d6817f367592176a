// Evolve Dashboard Library
// Generation timeline of a git repository, rendered in the terminal

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod timeline;
pub mod ui;

#[cfg(test)]
mod test_support;

pub use error::AppError;
pub use timeline::{TimelineEngine, TimelineSnapshot};
