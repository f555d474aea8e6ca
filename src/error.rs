//! Error types for the symbol graph normalization engine.
//!
//! Two layers are deliberately separate: `NormalizeError` is raised to the
//! caller only for invalid API use or storage failures, while
//! `NormalizeDiagnostic` records per-record and per-relationship problems
//! that never abort a batch and are collected into the result's error list.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for normalization and graph index operations
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// Invalid arguments to the public query API
    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// Batch was cancelled via its cancellation token
    #[error("Normalization cancelled before completion; partial state discarded")]
    Cancelled,

    #[error("Symbol '{name}' not found in the graph index")]
    SymbolNotFound { name: String },

    /// Storage errors
    #[error("Failed to persist index to '{path}': {source}")]
    Persistence {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to load index from '{path}': {source}")]
    Load {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Persisted index appears to be corrupted: {reason}")]
    IndexCorrupted { reason: String },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    /// General errors for cases where we need to preserve existing behavior
    #[error("{0}")]
    General(String),
}

impl NormalizeError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::InvalidQuery { .. } => "INVALID_QUERY",
            Self::Cancelled => "CANCELLED",
            Self::SymbolNotFound { .. } => "SYMBOL_NOT_FOUND",
            Self::Persistence { .. } => "PERSISTENCE_ERROR",
            Self::Load { .. } => "LOAD_ERROR",
            Self::IndexCorrupted { .. } => "INDEX_CORRUPTED",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::General(_) => "GENERAL_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::IndexCorrupted { .. } => vec![
                "Re-run 'symgraph normalize' to rebuild the index from facts",
                "Check for disk errors or filesystem corruption",
            ],
            Self::Load { .. } | Self::Persistence { .. } => vec![
                "Check disk space and permissions in the index directory",
                "Re-run 'symgraph normalize' if you continue to have issues",
            ],
            Self::SymbolNotFound { .. } => vec![
                "Use 'symgraph query search' or 'symgraph query fuzzy' to locate the symbol",
            ],
            _ => vec![],
        }
    }
}

/// Result type alias for normalization operations
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Category of a collected, non-fatal diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Malformed individual record (required field missing or empty)
    Validation,
    /// Failure while normalizing one record
    Processing,
    /// A superclass, mixin, or owner name not found in the index
    UnresolvedReference,
    /// An inheritance or dependency cycle; the graph stays usable
    CycleDetected,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Validation => "validation",
            DiagnosticKind::Processing => "processing",
            DiagnosticKind::UnresolvedReference => "unresolved_reference",
            DiagnosticKind::CycleDetected => "cycle_detected",
        }
    }
}

/// Structured per-record error collected into a `NormalizedResult`.
///
/// Never aborts the batch: a run always returns a usable result plus the
/// complete diagnostic list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeDiagnostic {
    #[serde(rename = "type")]
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

impl NormalizeDiagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: serde_json::Value::Null,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Validation, message)
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Processing, message)
    }

    pub fn unresolved(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::UnresolvedReference, message)
    }

    pub fn cycle(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::CycleDetected, message)
    }
}
