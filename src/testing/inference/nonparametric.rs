use crate::enrichment::ranking::average_ranks;
use crate::testing::utils::gather;
use crate::testing::{Alternative, TestResult};
use ndarray::{Array2, Axis};
use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator;
use single_utilities::traits::FloatOpsTS;
use statrs::distribution::{ContinuousCDF, Normal};
use std::cmp::Ordering;

pub fn mann_whitney_score_groups<T>(
    scores: &Array2<T>,
    group1_indices: &[usize],
    group2_indices: &[usize],
    alternative: Alternative,
) -> anyhow::Result<Vec<TestResult<f64>>>
where
    T: FloatOpsTS,
{
    if group1_indices.is_empty() || group2_indices.is_empty() {
        return Err(anyhow::anyhow!("Group indices cannot be empty"));
    }

    (0..scores.nrows())
        .into_par_iter()
        .map(|set| -> anyhow::Result<TestResult<f64>> {
            let row = scores.index_axis(Axis(0), set);
            let group1_values = gather(row, group1_indices)?;
            let group2_values = gather(row, group2_indices)?;
            mann_whitney(&group1_values, &group2_values, alternative)
        })
        .collect()
}

/// Mann-Whitney U test of `x` against `y`.
///
/// The statistic is U for `x`. P-values use the normal approximation with tie-corrected
/// variance and a 0.5 continuity correction. `Greater` tests whether `x` tends to exceed `y`.
pub fn mann_whitney(
    x: &[f64],
    y: &[f64],
    alternative: Alternative,
) -> anyhow::Result<TestResult<f64>> {
    let nx = x.len();
    let ny = y.len();

    if nx == 0 || ny == 0 {
        return Err(anyhow::anyhow!("Both samples need at least one observation"));
    }

    let mut combined: Vec<f64> = Vec::with_capacity(nx + ny);
    combined.extend_from_slice(x);
    combined.extend_from_slice(y);

    let ranks = average_ranks(&combined)?;
    let rank_sum_x: f64 = ranks[..nx].iter().sum();

    let n = (nx + ny) as f64;
    let nx_f = nx as f64;
    let ny_f = ny as f64;

    let u_x = rank_sum_x - nx_f * (nx_f + 1.0) / 2.0;
    let mean_u = nx_f * ny_f / 2.0;

    let tie_term = tie_correction(&mut combined);
    let var_u = nx_f * ny_f / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));

    // Rank-biserial correlation, positive when x tends to be larger
    let effect_size = 2.0 * u_x / (nx_f * ny_f) - 1.0;

    if !(var_u > 0.0) {
        // Every observation tied
        return Ok(TestResult::with_effect_size(u_x, 1.0, effect_size)
            .with_metadata("mean_u", mean_u)
            .with_metadata("var_u", 0.0));
    }

    let sd_u = var_u.sqrt();
    let normal = Normal::new(0.0, 1.0)?;

    let (z, p_value) = match alternative {
        Alternative::TwoSided => {
            let z = ((u_x - mean_u).abs() - 0.5).max(0.0) / sd_u;
            (z, (2.0 * normal.sf(z)).min(1.0))
        }
        Alternative::Greater => {
            let z = (u_x - mean_u - 0.5) / sd_u;
            (z, normal.sf(z))
        }
        Alternative::Less => {
            let z = (u_x - mean_u + 0.5) / sd_u;
            (z, normal.cdf(z))
        }
    };

    Ok(TestResult::with_effect_size(u_x, p_value, effect_size)
        .with_standard_error(sd_u)
        .with_metadata("z_score", z)
        .with_metadata("mean_u", mean_u)
        .with_metadata("var_u", var_u)
        .with_metadata("nx", nx_f)
        .with_metadata("ny", ny_f))
}

/// Sum of t^3 - t over tie groups. Sorts `values` in place.
fn tie_correction(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mut total = 0.0;
    let mut i = 0;
    while i < values.len() {
        let mut j = i + 1;
        while j < values.len() && values[j] == values[i] {
            j += 1;
        }
        let t = (j - i) as f64;
        total += t * t * t - t;
        i = j;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn separated_groups_give_extreme_u() {
        let x = [5.0, 6.0, 7.0, 8.0];
        let y = [1.0, 2.0, 3.0, 4.0];
        let result = mann_whitney(&x, &y, Alternative::TwoSided).unwrap();
        assert_eq!(result.statistic, 16.0);
        assert_eq!(result.effect_size, Some(1.0));
        // z = (8 - 0.5) / sqrt(16 * 9 / 12)
        assert_relative_eq!(result.metadata["z_score"], 7.5 / 12.0_f64.sqrt(), epsilon = 1e-12);
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn one_sided_alternatives_point_opposite_ways() {
        let x = [5.0, 6.0, 7.0, 8.0];
        let y = [1.0, 2.0, 3.0, 4.0];
        let greater = mann_whitney(&x, &y, Alternative::Greater).unwrap();
        let less = mann_whitney(&x, &y, Alternative::Less).unwrap();
        assert!(greater.p_value < 0.05);
        assert!(less.p_value > 0.95);
    }

    #[test]
    fn ties_reduce_the_variance() {
        let x = [1.0, 1.0, 2.0];
        let y = [1.0, 2.0, 2.0];
        let result = mann_whitney(&x, &y, Alternative::TwoSided).unwrap();
        // ties: three 1s and three 2s -> sum(t^3 - t) = 48
        let expected_var = 9.0 / 12.0 * (7.0 - 48.0 / 30.0);
        assert_relative_eq!(result.metadata["var_u"], expected_var, epsilon = 1e-12);
        assert_relative_eq!(result.statistic, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn all_tied_values_are_not_significant() {
        let result = mann_whitney(&[3.0, 3.0], &[3.0, 3.0, 3.0], Alternative::TwoSided).unwrap();
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn non_finite_observations_are_rejected() {
        let y = [1.0, 2.0, 3.0];
        assert!(mann_whitney(&[f64::NAN, 5.0, 6.0], &y, Alternative::TwoSided).is_err());
        assert!(mann_whitney(&[4.0, 5.0], &[1.0, f64::INFINITY], Alternative::Greater).is_err());
    }

    #[test]
    fn empty_sample_is_an_error() {
        assert!(mann_whitney(&[], &[1.0], Alternative::TwoSided).is_err());
    }
}
