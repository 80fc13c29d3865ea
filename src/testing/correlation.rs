//! Correlation of enrichment scores with a per-sample covariate, such as a deconvolved cell
//! fraction.
//!
//! Both coefficients come with a two-sided p-value from Student's t distribution on
//! `n - 2` degrees of freedom.

use anyhow::{Result, anyhow};

use crate::enrichment::ranking::average_ranks;
use crate::records::{CellFraction, JoinKind, Keyed, ScoreRecord, join};
use crate::testing::TestResult;
use crate::testing::inference::parametric::t_test_p_value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
}

pub fn correlation(x: &[f64], y: &[f64], method: CorrelationMethod) -> Result<TestResult<f64>> {
    match method {
        CorrelationMethod::Pearson => pearson(x, y),
        CorrelationMethod::Spearman => spearman(x, y),
    }
}

/// Pearson product-moment correlation.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<TestResult<f64>> {
    if x.len() != y.len() {
        return Err(anyhow!(
            "Paired samples must have equal length, got {} and {}",
            x.len(),
            y.len()
        ));
    }
    let n = x.len();
    if n < 3 {
        return Err(anyhow!("Correlation needs at least 3 paired observations, got {}", n));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(anyhow!("Correlation input contains non-finite values"));
    }

    let nf = n as f64;
    let mean_x = x.iter().sum::<f64>() / nf;
    let mean_y = y.iter().sum::<f64>() / nf;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return Err(anyhow!("Correlation is undefined for a constant sample"));
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let df = nf - 2.0;
    let p_value = if r.abs() == 1.0 {
        0.0
    } else {
        let t = r * (df / (1.0 - r * r)).sqrt();
        t_test_p_value(t, df)
    };

    Ok(TestResult::new(r, p_value)
        .with_degrees_of_freedom(df)
        .with_metadata("n", nf))
}

/// Spearman rank correlation: Pearson correlation of average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<TestResult<f64>> {
    if x.len() != y.len() {
        return Err(anyhow!(
            "Paired samples must have equal length, got {} and {}",
            x.len(),
            y.len()
        ));
    }
    let rx = average_ranks(x)?;
    let ry = average_ranks(y)?;
    pearson(&rx, &ry)
}

/// Correlate one gene set's scores with one cell type's fractions, pairing samples by id.
/// Samples missing from either side are dropped.
pub fn correlate_with_fractions(
    scores: &[ScoreRecord<f64>],
    fractions: &[CellFraction],
    method: CorrelationMethod,
) -> Result<TestResult<f64>> {
    let joined = join(scores, fractions, JoinKind::Inner)?;
    if joined.len() < scores.len() {
        tracing::warn!(
            dropped = scores.len() - joined.len(),
            "Samples without a cell fraction were left out of the correlation"
        );
    }

    let mut x = Vec::with_capacity(joined.len());
    let mut y = Vec::with_capacity(joined.len());
    for row in &joined {
        if let Some(fraction) = &row.right {
            debug_assert_eq!(row.left.key(), fraction.key());
            x.push(row.left.score);
            y.push(fraction.fraction);
        }
    }

    correlation(&x, &y, method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SampleId;
    use approx::assert_relative_eq;

    #[test]
    fn pearson_of_a_line_is_one() {
        let result = pearson(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert_relative_eq!(result.statistic, 1.0, epsilon = 1e-12);
        assert!(result.p_value < 1e-6);
    }

    #[test]
    fn pearson_matches_reference_value() {
        // r = 0.8 for this classic textbook pair
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        let result = pearson(&x, &y).unwrap();
        assert_relative_eq!(result.statistic, 0.8, epsilon = 1e-12);
        assert_eq!(result.degrees_of_freedom, Some(3.0));
        assert!(result.p_value > 0.05 && result.p_value < 0.2);
    }

    #[test]
    fn spearman_of_a_monotone_relation_is_one() {
        let x = [0.1, 0.5, 0.9, 1.3];
        let y = [1.0, 10.0, 100.0, 1000.0];
        let result = spearman(&x, &y).unwrap();
        assert_relative_eq!(result.statistic, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn spearman_is_negative_for_decreasing_relation() {
        let result = spearman(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert_relative_eq!(result.statistic, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert!(pearson(&[1.0, 2.0], &[1.0, 2.0]).is_err());
        assert!(pearson(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_err());
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn spearman_rejects_non_finite_values() {
        let y = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(spearman(&[1.0, f64::NAN, 3.0, 4.0, 5.0], &y).is_err());
        assert!(spearman(&y, &[1.0, 2.0, f64::INFINITY, 4.0, 5.0]).is_err());
    }

    #[test]
    fn nan_fraction_fails_the_correlation() {
        let ids = ["a", "b", "c", "d"];
        let scores: Vec<ScoreRecord<f64>> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| ScoreRecord {
                sample_id: SampleId::new(*id),
                gene_set: "IG".to_string(),
                score: i as f64,
            })
            .collect();
        let fractions: Vec<CellFraction> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| CellFraction {
                sample_id: SampleId::new(*id),
                cell_type: "Plasma cell".to_string(),
                fraction: if i == 1 { f64::NAN } else { i as f64 },
            })
            .collect();

        for method in [CorrelationMethod::Pearson, CorrelationMethod::Spearman] {
            assert!(correlate_with_fractions(&scores, &fractions, method).is_err());
        }
    }

    #[test]
    fn fractions_are_paired_by_sample_id() {
        let score = |id: &str, s: f64| ScoreRecord {
            sample_id: SampleId::new(id),
            gene_set: "IG".to_string(),
            score: s,
        };
        let fraction = |id: &str, f: f64| CellFraction {
            sample_id: SampleId::new(id),
            cell_type: "Plasma cell".to_string(),
            fraction: f,
        };

        let scores = vec![score("a", 0.1), score("b", 0.2), score("c", 0.3), score("d", 0.4)];
        // shuffled, and "b" missing
        let fractions = vec![fraction("d", 0.9), fraction("a", 0.1), fraction("c", 0.5)];

        let result =
            correlate_with_fractions(&scores, &fractions, CorrelationMethod::Spearman).unwrap();
        assert_relative_eq!(result.statistic, 1.0, epsilon = 1e-12);
        assert_eq!(result.metadata["n"], 3.0);
    }
}
