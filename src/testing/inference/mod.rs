use ndarray::Array2;
use single_utilities::traits::FloatOpsTS;
use tracing::debug;
use crate::testing::{
    Alternative, MultipleTestResults, TTestType, TestMethod, TestResult, correction,
};
use crate::testing::utils::{extract_unique_groups, get_group_indices};

pub mod parametric;

pub mod nonparametric;

/// Two-group tests over a score matrix whose rows are gene sets and columns are samples.
pub trait ScoreStatTests<T>
where
    T: FloatOpsTS,
{
    fn t_test(
        &self,
        group1_indices: &[usize],
        group2_indices: &[usize],
        test_type: TTestType,
    ) -> anyhow::Result<Vec<TestResult<f64>>>;

    fn mann_whitney_test(
        &self,
        group1_indices: &[usize],
        group2_indices: &[usize],
        alternative: Alternative,
    ) -> anyhow::Result<Vec<TestResult<f64>>>;

    /// Compare every gene set between the two groups in `group_ids` (one id per column) and
    /// attach Benjamini-Hochberg adjusted p-values.
    fn differential_enrichment(
        &self,
        group_ids: &[usize],
        test_method: TestMethod,
    ) -> anyhow::Result<MultipleTestResults<f64>>;
}

impl<T> ScoreStatTests<T> for Array2<T>
where
    T: FloatOpsTS,
{
    fn t_test(
        &self,
        group1_indices: &[usize],
        group2_indices: &[usize],
        test_type: TTestType,
    ) -> anyhow::Result<Vec<TestResult<f64>>> {
        parametric::t_test_score_groups(self, group1_indices, group2_indices, test_type)
    }

    fn mann_whitney_test(
        &self,
        group1_indices: &[usize],
        group2_indices: &[usize],
        alternative: Alternative,
    ) -> anyhow::Result<Vec<TestResult<f64>>> {
        nonparametric::mann_whitney_score_groups(self, group1_indices, group2_indices, alternative)
    }

    fn differential_enrichment(
        &self,
        group_ids: &[usize],
        test_method: TestMethod,
    ) -> anyhow::Result<MultipleTestResults<f64>> {
        if group_ids.len() != self.ncols() {
            return Err(anyhow::anyhow!(
                "Expected one group id per sample ({}), got {}",
                self.ncols(),
                group_ids.len()
            ));
        }

        let unique_groups = extract_unique_groups(group_ids);
        if unique_groups.len() != 2 {
            return Err(anyhow::anyhow!(
                "Currently only two-group comparisons are supported"
            ));
        }

        let (group1_indices, group2_indices) = get_group_indices(group_ids, &unique_groups);
        debug!(
            n_sets = self.nrows(),
            group1 = group1_indices.len(),
            group2 = group2_indices.len(),
            ?test_method,
            "Comparing enrichment scores between groups"
        );

        let (results, test_type) = match test_method {
            TestMethod::TTest(test_type) => (
                self.t_test(&group1_indices, &group2_indices, test_type)?,
                "t_test",
            ),
            TestMethod::MannWhitney => (
                self.mann_whitney_test(&group1_indices, &group2_indices, Alternative::TwoSided)?,
                "mann_whitney",
            ),
        };

        let statistics: Vec<_> = results.iter().map(|r| r.statistic).collect();
        let p_values: Vec<_> = results.iter().map(|r| r.p_value).collect();
        let adjusted_p_values = correction::benjamini_hochberg_correction(&p_values)?;

        let mut result = MultipleTestResults::new(statistics, p_values)
            .with_adjusted_p_values(adjusted_p_values)
            .with_global_metadata("test_type", test_type)
            .with_global_metadata("correction", "benjamini_hochberg");

        let effect_sizes: Option<Vec<f64>> = results.iter().map(|r| r.effect_size).collect();
        if let Some(effect_sizes) = effect_sizes {
            result = result.with_effect_sizes(effect_sizes);
        }

        Ok(result)
    }
}
