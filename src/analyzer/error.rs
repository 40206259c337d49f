//! Analyzer-specific failures, carrying a source span per spec §4.A.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
}

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("source has a syntax error at byte {0}..{1} (line {2})")]
    SyntaxError(usize, usize, usize),

    #[error("no default-exported class found in source")]
    MissingDefaultExport,

    #[error("class '{0}' has no usable constructor signature")]
    UnsupportedConstructor(String),
}

impl AnalyzerError {
    pub fn span(&self) -> Option<Span> {
        match self {
            AnalyzerError::SyntaxError(start_byte, end_byte, start_line) => Some(Span {
                start_byte: *start_byte,
                end_byte: *end_byte,
                start_line: *start_line,
            }),
            _ => None,
        }
    }
}
