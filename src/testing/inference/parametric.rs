//! Parametric two-group tests on enrichment scores.
//!
//! Scores are compared between two groups of samples (e.g. responders and non-responders)
//! with Student's or Welch's t-test, one test per gene set.

use crate::testing::utils::gather;
use crate::testing::{TTestType, TestResult};
use ndarray::{Array2, Axis};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use single_utilities::traits::FloatOpsTS;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Perform t-tests on all gene sets comparing two groups of samples.
///
/// # Arguments
///
/// * `scores` - Score matrix (gene sets × samples)
/// * `group1_indices` - Column indices for the first group of samples
/// * `group2_indices` - Column indices for the second group of samples
/// * `test_type` - Type of t-test to perform (Student's or Welch's)
///
/// # Returns
///
/// Vector of `TestResult` objects, one per gene set, containing t-statistics and p-values.
pub fn t_test_score_groups<T>(
    scores: &Array2<T>,
    group1_indices: &[usize],
    group2_indices: &[usize],
    test_type: TTestType,
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
            let x = gather(row, group1_indices)?;
            let y = gather(row, group2_indices)?;
            Ok(t_test(&x, &y, test_type))
        })
        .collect()
}

/// Perform a t-test comparing two samples.
///
/// Returns a neutral result (statistic 0, p-value 1) when either sample has fewer than two
/// observations.
pub fn t_test(x: &[f64], y: &[f64], test_type: TTestType) -> TestResult<f64> {
    let (sum_x, sum_sq_x) = sums(x);
    let (sum_y, sum_sq_y) = sums(y);

    fast_t_test_from_sums(
        sum_x,
        sum_sq_x,
        x.len() as f64,
        sum_y,
        sum_sq_y,
        y.len() as f64,
        test_type,
    )
}

fn sums(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((0.0, 0.0), |(s, sq), &v| (s + v, sq + v * v))
}

/// Perform a t-test using precomputed summary statistics.
///
/// # Arguments
///
/// * `sum1`, `sum_sq1`, `n1` - Sum, sum of squares, and count for group 1
/// * `sum2`, `sum_sq2`, `n2` - Sum, sum of squares, and count for group 2
/// * `test_type` - Type of t-test to perform (Student's or Welch's)
///
/// # Returns
///
/// `TestResult` containing the t-statistic, two-sided p-value, degrees of freedom and the
/// mean difference as effect size.
pub fn fast_t_test_from_sums(
    sum1: f64,
    sum_sq1: f64,
    n1: f64,
    sum2: f64,
    sum_sq2: f64,
    n2: f64,
    test_type: TTestType,
) -> TestResult<f64> {
    if n1 < 2.0 || n2 < 2.0 {
        return TestResult::new(0.0, 1.0);
    }

    let mean1 = sum1 / n1;
    let mean2 = sum2 / n2;

    // Computational formula, clamped against tiny negative round-off
    let var1 = ((sum_sq1 - sum1 * sum1 / n1) / (n1 - 1.0)).max(0.0);
    let var2 = ((sum_sq2 - sum2 * sum2 / n2) / (n2 - 1.0)).max(0.0);

    let mean_diff = mean1 - mean2;

    let (std_err, df) = match test_type {
        TTestType::Student => {
            let pooled_var = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / (n1 + n2 - 2.0);
            ((pooled_var * (1.0 / n1 + 1.0 / n2)).sqrt(), n1 + n2 - 2.0)
        }
        TTestType::Welch => {
            let term1 = var1 / n1;
            let term2 = var2 / n2;
            let combined_var = term1 + term2;

            // Welch-Satterthwaite equation for degrees of freedom
            let df = combined_var * combined_var
                / (term1 * term1 / (n1 - 1.0) + term2 * term2 / (n2 - 1.0));
            (combined_var.sqrt(), df)
        }
    };

    let t_stat = if std_err > 0.0 {
        mean_diff / std_err
    } else if mean_diff == 0.0 {
        0.0
    } else {
        mean_diff.signum() * f64::INFINITY
    };

    let p_value = t_test_p_value(t_stat, df);
    TestResult::with_effect_size(t_stat, p_value, mean_diff)
        .with_degrees_of_freedom(df)
        .with_standard_error(std_err)
}

/// Two-sided p-value of a t statistic.
pub(crate) fn t_test_p_value(t_stat: f64, df: f64) -> f64 {
    if t_stat.is_infinite() {
        return 0.0;
    }
    if t_stat.is_nan() || df <= 0.0 || !df.is_finite() {
        return 1.0;
    }

    match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => (2.0 * t_dist.sf(t_stat.abs())).min(1.0),
        Err(_) => 1.0,
    }
}
