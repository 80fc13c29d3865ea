use ndarray::ArrayView1;
use num_traits::ToPrimitive;
use single_utilities::traits::FloatOps;

pub fn extract_unique_groups(group_ids: &[usize]) -> Vec<usize> {
    let mut unique_groups = group_ids.to_vec();
    unique_groups.sort();
    unique_groups.dedup();
    unique_groups
}

/// Get column indices for each of the first two groups
pub fn get_group_indices(group_ids: &[usize], unique_groups: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let group1 = unique_groups[0];
    let group2 = unique_groups[1];

    let group1_indices = group_ids.iter()
        .enumerate()
        .filter_map(|(i, &g)| if g == group1 { Some(i) } else { None })
        .collect();

    let group2_indices = group_ids.iter()
        .enumerate()
        .filter_map(|(i, &g)| if g == group2 { Some(i) } else { None })
        .collect();

    (group1_indices, group2_indices)
}

/// Values of one score row at the given columns, as f64.
pub(crate) fn gather<T>(row: ArrayView1<'_, T>, columns: &[usize]) -> anyhow::Result<Vec<f64>>
where
    T: FloatOps,
{
    columns
        .iter()
        .map(|&col| -> anyhow::Result<f64> {
            let value = row.get(col).ok_or_else(|| {
                anyhow::anyhow!("Column index {} out of bounds ({})", col, row.len())
            })?;
            ToPrimitive::to_f64(value).ok_or_else(|| {
                anyhow::anyhow!("Score at column {} is not representable as f64", col)
            })
        })
        .collect()
}
