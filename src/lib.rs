//! # single-ssgsea
//!
//! Rank-based single-sample gene set enrichment (ssGSEA) for bulk tumor expression data, part
//! of the single-rust ecosystem.
//!
//! The crate scores gene sets (for example an immunoglobulin signature) in every sample of a
//! genes × samples matrix and provides the statistics typically run on those scores afterwards:
//! comparing them between treatment-response groups and correlating them with tumor
//! microenvironment composition estimates.
//!
//! ## Core Features
//!
//! - **ssGSEA scoring**: average-rank transform, rank-weighted random walk, optional scaling,
//!   range normalization and maximum-deviation mode
//! - **Dense and sparse input**: `ndarray::Array2`, and `CscMatrix` or `CsrMatrix` from
//!   nalgebra-sparse
//! - **Typed records**: sample-keyed clinical, score and cell-fraction records with explicit
//!   inner/left joins
//! - **Score statistics**: Mann-Whitney U and t-tests per gene set, multiple testing
//!   correction, Pearson and Spearman correlation
//!
//! ## Quick Start
//!
//! Build an [`enrichment::ExpressionMatrix`], describe signatures with
//! [`enrichment::GeneSets`] and call [`enrichment::ExpressionMatrix::ssgsea`]. The score
//! matrix behind [`enrichment::EnrichmentScores::scores`] is an `Array2`, which implements
//! [`testing::inference::ScoreStatTests`] for group comparisons.
//!
//! ## Module Organization
//!
//! - **[`enrichment`]**: ssGSEA scoring
//! - **[`records`]**: Typed per-sample records and joins
//! - **[`testing`]**: Group comparisons, multiple testing correction, correlation
//! - **[`error`]**: Error kinds

pub mod enrichment;
pub mod error;
pub mod records;
pub mod testing;

pub use error::EnrichmentError;
