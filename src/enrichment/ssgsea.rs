// Rank-based single-sample enrichment, following Barbie et al. (2009) as popularised by the
// GSVA `ssgsea` method: per-sample average ranks, rank^alpha weighted in-set CDF against the
// plain CDF of the complement.

use ndarray::{Array2, Axis};
use num_traits::Float;
use single_utilities::traits::FloatOps;

use crate::enrichment::ranking::{average_ranks, descending_order};
use crate::enrichment::utils::cast;
use crate::error::EnrichmentError;

pub(crate) struct SampleRanking<T> {
    ranks: Vec<T>,
    order: Vec<usize>,
}

pub(crate) fn rank_sample<T>(values: &[T]) -> anyhow::Result<SampleRanking<T>>
where
    T: FloatOps,
{
    let ranks = average_ranks(values)?;
    let order = descending_order(&ranks);
    Ok(SampleRanking { ranks, order })
}

/// In-set CDF minus complement CDF at every position of the descending gene ordering.
///
/// `membership[g]` tells whether matrix row `g` is in the set; at least one row must be.
/// Without complement genes the complement CDF is zero everywhere.
pub(crate) fn random_walk<T>(
    ranking: &SampleRanking<T>,
    membership: &[bool],
    alpha: T,
    scale: bool,
) -> anyhow::Result<Vec<T>>
where
    T: FloatOps,
{
    let n = ranking.order.len();

    let mut step_in = Vec::with_capacity(n);
    let mut step_out = Vec::with_capacity(n);
    let mut total_in = T::zero();
    let mut total_out = 0usize;
    for &gene in &ranking.order {
        if membership[gene] {
            let weight = Float::powf(ranking.ranks[gene], alpha);
            total_in += weight;
            step_in.push(weight);
            step_out.push(0usize);
        } else {
            total_out += 1;
            step_in.push(T::zero());
            step_out.push(1usize);
        }
    }

    if total_in <= T::zero() {
        return Err(anyhow::anyhow!(
            "Gene set has no weighted rank mass in this sample"
        ));
    }

    let n_genes: T = cast(n)?;
    let total_out_f: T = cast(total_out)?;

    let mut cum_in = T::zero();
    let mut cum_out = 0usize;
    let mut walk = Vec::with_capacity(n);
    for (&w, &o) in step_in.iter().zip(&step_out) {
        cum_in += w;
        cum_out += o;

        let cdf_in = cum_in / total_in;
        let cdf_out = if total_out == 0 {
            T::zero()
        } else {
            cast::<T, _>(cum_out)? / total_out_f
        };

        let mut diff = cdf_in - cdf_out;
        if scale {
            diff = diff / n_genes;
        }
        walk.push(diff);
    }

    Ok(walk)
}

/// Collapse a walk into a score: its sum, or the signed value of largest magnitude.
pub(crate) fn walk_score<T>(walk: &[T], single_sample: bool) -> T
where
    T: FloatOps,
{
    if single_sample {
        return walk.iter().fold(T::zero(), |acc, &v| acc + v);
    }

    let mut best = T::zero();
    for &v in walk {
        // strict comparison keeps the first position on ties
        if Float::abs(v) > Float::abs(best) {
            best = v;
        }
    }
    best
}

/// Scores of one sample against every set mask.
pub(crate) fn score_sample<T>(
    values: &[T],
    memberships: &[Vec<bool>],
    alpha: T,
    scale: bool,
    single_sample: bool,
) -> anyhow::Result<Vec<T>>
where
    T: FloatOps,
{
    let ranking = rank_sample(values)?;
    memberships
        .iter()
        .map(|mask| -> anyhow::Result<T> {
            let walk = random_walk(&ranking, mask, alpha, scale)?;
            Ok(walk_score(&walk, single_sample))
        })
        .collect()
}

/// Divide each row (gene set) by the range of its scores across samples.
pub(crate) fn normalize_by_range<T>(
    scores: &mut Array2<T>,
    set_names: &[String],
) -> anyhow::Result<()>
where
    T: FloatOps,
{
    for (mut row, name) in scores.axis_iter_mut(Axis(0)).zip(set_names) {
        let mut min: T = Float::infinity();
        let mut max: T = Float::neg_infinity();
        for &v in row.iter() {
            min = Float::min(min, v);
            max = Float::max(max, v);
        }

        let range = max - min;
        if !(range > T::zero()) {
            return Err(EnrichmentError::ZeroRange { name: name.clone() }.into());
        }
        row.mapv_inplace(|v| v / range);
    }
    Ok(())
}
