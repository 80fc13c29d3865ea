//! Error kinds raised by the enrichment scorer and the record layer.
//!
//! Public functions return `anyhow::Result`; the variants below are what they wrap, so callers
//! that need to branch on the failure can `downcast_ref::<EnrichmentError>()`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnrichmentError {
    #[error("Expression matrix is empty: {reason}")]
    EmptyMatrix { reason: String },

    #[error("Non-finite expression value {value} at gene {gene}, sample {sample}")]
    NonFiniteValue {
        gene: usize,
        sample: usize,
        value: f64,
    },

    #[error("Dimension mismatch for {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        got: usize,
    },

    #[error("No gene sets supplied")]
    NoGeneSets,

    #[error("Gene set '{name}' is defined more than once")]
    DuplicateGeneSet { name: String },

    #[error("Gene set '{name}' contains no gene identifiers")]
    EmptyGeneSet { name: String },

    #[error("Gene set '{name}' has an empty intersection with the matrix genes")]
    EmptyIntersection { name: String },

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Scores of gene set '{name}' have zero range across samples, cannot normalize")]
    ZeroRange { name: String },

    #[error("Duplicate join key '{key}'")]
    DuplicateKey { key: String },
}
