//! Error types for network construction and inference.

use thiserror::Error;

/// Errors that can occur while building a network, parsing a query, or
/// running exact or approximate inference.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in the future without breaking changes.
///
/// All failures are validation failures: none of them are retried, and the
/// engines either produce a fully valid distribution or return one of these.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferenceError {
    /// Adding the edge `parent -> child` would close a directed cycle.
    #[error("cycle error: edge {parent} -> {child} would create a cycle")]
    Cycle { parent: String, child: String },

    /// A variable was referenced by name or id but never declared.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// A CPT's shape does not match the variable's domain and parent domains.
    ///
    /// Rows must equal the variable's domain size and columns must equal the
    /// product of the parents' domain sizes.
    #[error(
        "dimension mismatch for '{variable}': expected {expected_rows}x{expected_cols}, got {actual_rows}x{actual_cols}"
    )]
    DimensionMismatch {
        variable: String,
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    /// A CPT column does not form a probability distribution.
    #[error("non-normalized CPT for '{variable}': column {column} sums to {sum}")]
    NonNormalized {
        variable: String,
        column: usize,
        sum: f64,
    },

    /// Evidence assigns a state outside the variable's domain.
    #[error("inconsistent evidence: {variable}={value} is outside domain of size {domain_size}")]
    InconsistentEvidence {
        variable: String,
        value: usize,
        domain_size: usize,
    },

    /// The evidence has zero prior probability, so P(evidence) cannot be divided out.
    #[error("evidence has zero probability")]
    ZeroProbabilityEvidence,

    /// No generated sample agreed with the evidence.
    #[error("insufficient samples: 0 of {total} samples are consistent with the evidence")]
    InsufficientSamples { total: usize },

    /// Syntax error in query notation such as `P(+A | -B)`.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Invalid configuration or API misuse (empty target set, target that is
    /// also evidence, duplicate variable names, zero-sized domains).
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Numerical stability error (NaN/Inf or negative factor entries).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// A configured resource bound was exceeded.
    #[error("resource limit: {0}")]
    ResourceLimit(String),

    /// Internal engine error (programmer error, not user error).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, InferenceError>;
