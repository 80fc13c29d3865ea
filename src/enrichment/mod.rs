//! Single-sample gene set enrichment scoring for bulk expression data.
//!
//! Each sample (column) of a genes × samples matrix is ranked independently, genes are walked
//! from most to least expressed, and every gene set gets a score contrasting the rank-weighted
//! cumulative distribution of its members with the cumulative distribution of all other genes.
//!
//! ## Entry points
//!
//! - [`ExpressionMatrix::ssgsea`]: named matrix in, named [`EnrichmentScores`] out
//! - [`ssgsea_scores`]: any [`ExpressionColumns`] source (dense `Array2` or sparse `CsrMatrix`)
//!
//! ## Quick Example
//!
//! ```rust
//! use ndarray::array;
//! use single_ssgsea::enrichment::{ExpressionMatrix, GeneSets, SsgseaParams};
//!
//! let matrix = ExpressionMatrix::new(
//!     vec!["IGKC".into(), "IGHG1".into(), "CD3E".into(), "ACTB".into()],
//!     vec!["TCGA-A1-0001".into(), "TCGA-A1-0002".into()],
//!     array![[9.0, 1.0], [8.0, 2.0], [1.0, 7.0], [5.0, 5.0]],
//! )
//! .unwrap();
//! let sets = GeneSets::try_from_pairs([("IG", vec!["IGKC", "IGHG1"])]).unwrap();
//!
//! let scores = matrix.ssgsea(&sets, &SsgseaParams::default()).unwrap();
//! assert!(scores.get("IG", "TCGA-A1-0001").unwrap() > scores.get("IG", "TCGA-A1-0002").unwrap());
//! ```

use nalgebra_sparse::{CscMatrix, CsrMatrix};
use ndarray::{Array2, ArrayView1, Axis};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use single_utilities::traits::{FloatOps, FloatOpsTS};
use tracing::debug;

use crate::error::EnrichmentError;
use crate::records::{SampleId, ScoreRecord};

mod gene_sets;
pub mod ranking;
mod ssgsea;
pub(crate) mod utils;

pub use gene_sets::{GeneSet, GeneSets};

/// Scoring options. Defaults: `alpha = 0.25`, scaling on, normalization off, single-sample
/// (summed walk) mode on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SsgseaParams {
    /// Exponent applied to in-set ranks
    pub alpha: f64,
    /// Divide the walk by the number of genes
    pub scale: bool,
    /// Divide each gene set's scores by their range across samples
    pub normalize: bool,
    /// Sum the walk instead of taking its maximum deviation
    pub single_sample: bool,
}

impl Default for SsgseaParams {
    fn default() -> Self {
        SsgseaParams {
            alpha: 0.25,
            scale: true,
            normalize: false,
            single_sample: true,
        }
    }
}

impl SsgseaParams {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_scale(mut self, scale: bool) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_single_sample(mut self, single_sample: bool) -> Self {
        self.single_sample = single_sample;
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(EnrichmentError::InvalidParameter {
                name: "alpha".to_string(),
                reason: format!("must be finite and non-negative, got {}", self.alpha),
            }
            .into());
        }
        Ok(())
    }
}

/// Column access to a genes × samples expression source.
pub trait ExpressionColumns<T> {
    fn n_genes(&self) -> usize;

    fn n_samples(&self) -> usize;

    /// Expression of every gene in one sample, in row order.
    fn sample_values(&self, sample: usize) -> Vec<T>;
}

impl<T> ExpressionColumns<T> for Array2<T>
where
    T: FloatOps,
{
    fn n_genes(&self) -> usize {
        self.nrows()
    }

    fn n_samples(&self) -> usize {
        self.ncols()
    }

    fn sample_values(&self, sample: usize) -> Vec<T> {
        self.column(sample).to_vec()
    }
}

impl<T> ExpressionColumns<T> for CscMatrix<T>
where
    T: FloatOps,
{
    fn n_genes(&self) -> usize {
        self.nrows()
    }

    fn n_samples(&self) -> usize {
        self.ncols()
    }

    fn sample_values(&self, sample: usize) -> Vec<T> {
        let column = self.col(sample);
        let mut values = vec![T::zero(); self.nrows()];
        for (&gene, &value) in column.row_indices().iter().zip(column.values()) {
            values[gene] = value;
        }
        values
    }
}

/// Row-major input costs one lookup per gene and sample. Convert large matrices with
/// `CscMatrix::from(&csr)` first.
impl<T> ExpressionColumns<T> for CsrMatrix<T>
where
    T: FloatOps,
{
    fn n_genes(&self) -> usize {
        self.nrows()
    }

    fn n_samples(&self) -> usize {
        self.ncols()
    }

    fn sample_values(&self, sample: usize) -> Vec<T> {
        (0..self.nrows())
            .map(|gene| match self.get_entry(gene, sample) {
                Some(entry) => entry.into_value(),
                None => T::zero(),
            })
            .collect()
    }
}

/// Score every gene set in every sample of `matrix`.
///
/// `gene_ids` names the matrix rows. The result has one row per gene set (in `gene_sets`
/// order) and one column per sample (in matrix column order).
///
/// # Errors
///
/// Fails with an [`EnrichmentError`] when the matrix has no genes or no samples, contains a
/// non-finite value, `gene_ids` does not match the row count, there are no gene sets, a set is
/// empty or shares no gene with `gene_ids`, `alpha` is invalid, or normalization meets a gene
/// set whose scores do not vary across samples.
pub fn ssgsea_scores<T, M>(
    matrix: &M,
    gene_ids: &[String],
    gene_sets: &GeneSets,
    params: &SsgseaParams,
) -> anyhow::Result<Array2<T>>
where
    T: FloatOpsTS,
    M: ExpressionColumns<T> + Sync,
{
    params.validate()?;

    let n_genes = matrix.n_genes();
    let n_samples = matrix.n_samples();
    if n_genes == 0 {
        return Err(EnrichmentError::EmptyMatrix {
            reason: "no genes".to_string(),
        }
        .into());
    }
    if n_samples == 0 {
        return Err(EnrichmentError::EmptyMatrix {
            reason: "no samples".to_string(),
        }
        .into());
    }
    if gene_ids.len() != n_genes {
        return Err(EnrichmentError::DimensionMismatch {
            what: "gene identifiers".to_string(),
            expected: n_genes,
            got: gene_ids.len(),
        }
        .into());
    }

    let memberships = gene_sets.membership(gene_ids)?;
    let alpha: T = utils::cast(params.alpha)?;

    debug!(
        n_genes,
        n_samples,
        n_sets = gene_sets.len(),
        alpha = params.alpha,
        "Scoring gene sets"
    );

    let per_sample: Vec<Vec<T>> = (0..n_samples)
        .into_par_iter()
        .map(|sample| -> anyhow::Result<Vec<T>> {
            let values = matrix.sample_values(sample);
            utils::check_finite(&values, sample)?;
            ssgsea::score_sample(
                &values,
                &memberships,
                alpha,
                params.scale,
                params.single_sample,
            )
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut scores = Array2::zeros((gene_sets.len(), n_samples));
    for (sample, column) in per_sample.into_iter().enumerate() {
        for (set, score) in column.into_iter().enumerate() {
            scores[[set, sample]] = score;
        }
    }

    if params.normalize {
        ssgsea::normalize_by_range(&mut scores, &gene_sets.names())?;
    }

    Ok(scores)
}

/// Dense genes × samples expression with row and column identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionMatrix<T> {
    gene_ids: Vec<String>,
    sample_ids: Vec<String>,
    values: Array2<T>,
}

impl<T> ExpressionMatrix<T>
where
    T: FloatOpsTS,
{
    pub fn new(
        gene_ids: Vec<String>,
        sample_ids: Vec<String>,
        values: Array2<T>,
    ) -> anyhow::Result<Self> {
        if gene_ids.len() != values.nrows() {
            return Err(EnrichmentError::DimensionMismatch {
                what: "gene identifiers".to_string(),
                expected: values.nrows(),
                got: gene_ids.len(),
            }
            .into());
        }
        if sample_ids.len() != values.ncols() {
            return Err(EnrichmentError::DimensionMismatch {
                what: "sample identifiers".to_string(),
                expected: values.ncols(),
                got: sample_ids.len(),
            }
            .into());
        }
        Ok(ExpressionMatrix {
            gene_ids,
            sample_ids,
            values,
        })
    }

    pub fn gene_ids(&self) -> &[String] {
        &self.gene_ids
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    pub fn values(&self) -> &Array2<T> {
        &self.values
    }

    pub fn ssgsea(
        &self,
        gene_sets: &GeneSets,
        params: &SsgseaParams,
    ) -> anyhow::Result<EnrichmentScores<T>> {
        let scores = ssgsea_scores(&self.values, &self.gene_ids, gene_sets, params)?;
        Ok(EnrichmentScores {
            set_names: gene_sets.names(),
            sample_ids: self.sample_ids.clone(),
            scores,
        })
    }
}

/// Gene sets × samples score matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentScores<T> {
    set_names: Vec<String>,
    sample_ids: Vec<String>,
    scores: Array2<T>,
}

impl<T> EnrichmentScores<T>
where
    T: FloatOps,
{
    pub fn set_names(&self) -> &[String] {
        &self.set_names
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    pub fn scores(&self) -> &Array2<T> {
        &self.scores
    }

    pub fn into_scores(self) -> Array2<T> {
        self.scores
    }

    pub fn get(&self, set_name: &str, sample_id: &str) -> Option<T> {
        let row = self.set_names.iter().position(|s| s == set_name)?;
        let col = self.sample_ids.iter().position(|s| s == sample_id)?;
        Some(self.scores[[row, col]])
    }

    pub fn row(&self, set_name: &str) -> Option<ArrayView1<'_, T>> {
        let row = self.set_names.iter().position(|s| s == set_name)?;
        Some(self.scores.index_axis(Axis(0), row))
    }

    /// One record per sample for the named gene set.
    pub fn records(&self, set_name: &str) -> anyhow::Result<Vec<ScoreRecord<T>>> {
        let row = self
            .row(set_name)
            .ok_or_else(|| anyhow::anyhow!("Unknown gene set '{}'", set_name))?;

        Ok(self
            .sample_ids
            .iter()
            .zip(row.iter())
            .map(|(sample, &score)| ScoreRecord {
                sample_id: SampleId::new(sample.as_str()),
                gene_set: set_name.to_string(),
                score,
            })
            .collect())
    }
}
