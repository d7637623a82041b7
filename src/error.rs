//! Error and warning types.
//!
//! Mapping problems are fatal and surface before any text is touched.
//! Everything that can go wrong on a single line is a [`Warning`]: it is
//! collected next to the transformed text and never aborts the run.

use std::path::PathBuf;

/// A mapping document that cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("cannot read mapping {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed mapping document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("mapping document is missing the `{0}` section")]
    MissingSection(&'static str),

    #[error("{section}: empty key (mapped to {value:?})")]
    EmptyKeyword {
        section: &'static str,
        value: String,
    },

    #[error("{section}: `{key}` has an empty replacement")]
    EmptyReplacement { section: &'static str, key: String },

    #[error("{section}: duplicate key `{key}`")]
    DuplicateKey { section: &'static str, key: String },

    #[error("keywords: `{key}` cannot be compiled: {source}")]
    InvalidKeyword { key: String, source: regex::Error },

    #[error("special_patterns[{index}]: invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        source: regex::Error,
    },
}

/// A non-fatal problem found while rewriting one line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Warning {
    #[error(
        "line {line}: pattern `{pattern}` references group {group}, which is absent from this match; occurrence left unchanged"
    )]
    PatternApplication {
        line: usize,
        pattern: String,
        group: String,
    },

    #[error("line {line}: {reason}; indentation left unchanged")]
    ReconciliationAmbiguity { line: usize, reason: String },

    #[error("line {line}: decorator `{decorator}` is not followed by a definition")]
    DecoratorMisuse { line: usize, decorator: String },
}

impl Warning {
    /// 1-based line number the warning points at.
    pub fn line(&self) -> usize {
        match self {
            Warning::PatternApplication { line, .. }
            | Warning::ReconciliationAmbiguity { line, .. }
            | Warning::DecoratorMisuse { line, .. } => *line,
        }
    }
}
