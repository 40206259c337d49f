//! Loader failures (spec §4.B): compile errors carry a span, instantiation
//! errors carry the thrown message, and the two are kept distinct so a
//! caller can tell a syntax problem from a constructor that threw.

use std::path::PathBuf;

use thiserror::Error;

use crate::analyzer::AnalyzerError;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("analysis failed for {path}: {source}")]
    Analysis {
        path: PathBuf,
        #[source]
        source: AnalyzerError,
    },

    #[error("compilation failed for {path}: {message}")]
    Compile { path: PathBuf, message: String },

    #[error("constructor for '{class_name}' threw: {message}")]
    Instantiation { class_name: String, message: String },

    #[error("could not read source at {path}: {message}")]
    Io { path: PathBuf, message: String },
}

impl LoadError {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            LoadError::Analysis { path, .. }
            | LoadError::Compile { path, .. }
            | LoadError::Io { path, .. } => Some(path),
            LoadError::Instantiation { .. } => None,
        }
    }
}
