//! Config loading errors
//!
//! None of these abort the program: `config::load` downgrades every one of
//! them to a warning and falls back to the built-in tracked file.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// No Evolve.toml at the project root
    #[error("no Evolve.toml found at {0}")]
    Missing(PathBuf),

    /// The file exists but could not be read
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or shape error
    #[error("error parsing Evolve.toml: {0}")]
    Malformed(#[from] toml::de::Error),

    /// Parsed fine but names no file to track
    #[error("Evolve.toml has no 'files' list")]
    NoTrackedFiles,
}
