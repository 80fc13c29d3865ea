use anyhow::{Result, anyhow};
use std::cmp::Ordering;

/// Multiple testing correction applied across gene sets when their scores are compared
/// between groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionMethod {
    Bonferroni,
    Holm,
    BenjaminiHochberg,
}

/// Adjust `p_values` with the chosen method.
pub fn adjust_p_values(p_values: &[f64], method: CorrectionMethod) -> Result<Vec<f64>> {
    match method {
        CorrectionMethod::Bonferroni => bonferroni_correction(p_values),
        CorrectionMethod::Holm => holm_bonferroni_correction(p_values),
        CorrectionMethod::BenjaminiHochberg => benjamini_hochberg_correction(p_values),
    }
}

fn validate_p_values(p_values: &[f64]) -> Result<()> {
    if p_values.is_empty() {
        return Err(anyhow!("Empty p-value array"));
    }

    for (i, &p) in p_values.iter().enumerate() {
        if !(0.0..=1.0).contains(&p) {
            return Err(anyhow!("Invalid p-value at index {}: {}", i, p));
        }
    }
    Ok(())
}

fn ascending_order(p_values: &[f64]) -> Vec<(usize, f64)> {
    let mut indexed: Vec<(usize, f64)> = p_values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    indexed
}

/// Apply Bonferroni correction to p-values
///
/// Multiplies each p-value by the number of tests, capping at 1.
///
/// # Arguments
/// * `p_values` - A slice of p-values to adjust
///
/// # Returns
/// * `Result<Vec<f64>>` - Vector of adjusted p-values
///
/// # Example
/// ```
/// use single_ssgsea::testing::correction::bonferroni_correction;
///
/// let adjusted = bonferroni_correction(&[0.01, 0.03, 0.5]).unwrap();
/// assert_eq!(adjusted, vec![0.03, 0.09, 1.0]);
/// ```
pub fn bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len() as f64;
    Ok(p_values.iter().map(|&p| (p * n).min(1.0)).collect())
}

/// Apply Holm's step-down method for controlling family-wise error rate
///
/// The i-th smallest p-value is multiplied by `n - i` and adjusted values are made
/// monotone non-decreasing in p-value order.
///
/// # Arguments
/// * `p_values` - A slice of p-values to adjust
///
/// # Returns
/// * `Result<Vec<f64>>` - Vector of adjusted p-values
pub fn holm_bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len();

    let mut adjusted_p_values = vec![0.0; n];
    let mut running_max: f64 = 0.0;
    for (i, (orig_idx, p_val)) in ascending_order(p_values).into_iter().enumerate() {
        let adjustment = (p_val * (n - i) as f64).min(1.0);
        running_max = running_max.max(adjustment);
        adjusted_p_values[orig_idx] = running_max;
    }

    Ok(adjusted_p_values)
}

/// Apply Benjamini-Hochberg (BH) procedure for controlling false discovery rate
///
/// The BH procedure controls the expected proportion of false positives among all rejected
/// null hypotheses.
///
/// # Arguments
/// * `p_values` - A slice of p-values to adjust
///
/// # Returns
/// * `Result<Vec<f64>>` - Vector of adjusted p-values
pub fn benjamini_hochberg_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len();
    let indexed_p_values = ascending_order(p_values);

    let mut adjusted_p_values = vec![0.0; n];
    let mut current_min = 1.0;

    // Process from largest to smallest p-value
    for i in (0..n).rev() {
        let (orig_idx, p_val) = indexed_p_values[i];
        let rank = i + 1;

        let adjustment = (p_val * n as f64 / rank as f64).min(1.0);
        current_min = adjustment.min(current_min);
        adjusted_p_values[orig_idx] = current_min;
    }

    Ok(adjusted_p_values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_vec_relative_eq(a: &[f64], b: &[f64], epsilon: f64) {
        assert_eq!(a.len(), b.len(), "Vectors have different lengths");
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            if (x - y).abs() > epsilon {
                panic!("Vectors differ at index {}: {} != {}", i, x, y);
            }
        }
    }

    #[test]
    fn test_bonferroni() {
        let p_values = vec![0.01, 0.02, 0.03, 0.1, 0.2];
        let expected = vec![0.05, 0.1, 0.15, 0.5, 1.0];
        let adjusted = bonferroni_correction(&p_values).unwrap();
        assert_vec_relative_eq(&adjusted, &expected, 1e-10);
    }

    #[test]
    fn test_benjamini_hochberg_empty_input() {
        let result = benjamini_hochberg_correction(&[]);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().to_string(), "Empty p-value array");
    }

    #[test]
    fn test_benjamini_hochberg_invalid_pvalues() {
        let result = benjamini_hochberg_correction(&[0.01, -0.5, 0.03]);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid p-value at index 1")
        );

        let result = benjamini_hochberg_correction(&[0.01, 1.5, 0.03]);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid p-value at index 1")
        );
    }

    #[test]
    fn test_benjamini_hochberg_unordered_pvalues() {
        let p_values = vec![0.05, 0.01, 0.1, 0.04, 0.02];
        let expected = vec![0.0625, 0.05, 0.1, 0.0625, 0.05];
        let adjusted = benjamini_hochberg_correction(&p_values).unwrap();
        assert_vec_relative_eq(&adjusted, &expected, 1e-10);
    }

    #[test]
    fn test_benjamini_hochberg_is_monotone_and_not_below_raw() {
        let p_values = vec![0.2, 0.001, 0.04, 0.03, 0.5, 0.01];
        let adjusted = benjamini_hochberg_correction(&p_values).unwrap();

        for (p, q) in p_values.iter().zip(&adjusted) {
            assert!(q >= p);
        }
        let order = ascending_order(&p_values);
        for pair in order.windows(2) {
            assert!(adjusted[pair[0].0] <= adjusted[pair[1].0]);
        }
    }

    #[test]
    fn test_benjamini_hochberg_single_pvalue() {
        let adjusted = benjamini_hochberg_correction(&[0.025]).unwrap();
        assert_relative_eq!(adjusted[0], 0.025, epsilon = 1e-10);
    }

    #[test]
    fn test_holm_bonferroni() {
        let p_values = vec![0.01, 0.02, 0.03];
        let expected = vec![0.03, 0.04, 0.04];
        let adjusted = holm_bonferroni_correction(&p_values).unwrap();
        assert_vec_relative_eq(&adjusted, &expected, 1e-10);
    }

    #[test]
    fn test_adjust_dispatches_by_method() {
        let p_values = [0.01, 0.04];
        assert_eq!(
            adjust_p_values(&p_values, CorrectionMethod::Bonferroni).unwrap(),
            bonferroni_correction(&p_values).unwrap()
        );
        assert_eq!(
            adjust_p_values(&p_values, CorrectionMethod::BenjaminiHochberg).unwrap(),
            benjamini_hochberg_correction(&p_values).unwrap()
        );
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(bonferroni_correction(&[]).is_err());
        assert!(holm_bonferroni_correction(&[]).is_err());

        let invalid_p = vec![-0.1, 0.5, 1.1];
        assert!(bonferroni_correction(&invalid_p).is_err());
        assert!(holm_bonferroni_correction(&invalid_p).is_err());
    }
}
