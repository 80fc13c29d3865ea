use std::cmp::Ordering;

use num_traits::Float;
use single_utilities::traits::FloatOps;

use crate::enrichment::utils::cast;

/// Ranks `values` in ascending order, assigning tied values the average of the ranks they
/// would occupy under strict ordering. Ranks start at 1.
///
/// # Errors
///
/// Fails if any value is NaN or infinite.
///
/// # Example
///
/// ```
/// use single_ssgsea::enrichment::ranking::average_ranks;
///
/// let ranks = average_ranks(&[10.0, 20.0, 20.0, 5.0]).unwrap();
/// assert_eq!(ranks, vec![2.0, 3.5, 3.5, 1.0]);
/// ```
pub fn average_ranks<T>(values: &[T]) -> anyhow::Result<Vec<T>>
where
    T: FloatOps,
{
    if let Some(pos) = values.iter().position(|v| !Float::is_finite(*v)) {
        return Err(anyhow::anyhow!(
            "Cannot rank non-finite value {:?} at position {}",
            values[pos],
            pos
        ));
    }

    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let two: T = cast(2.0)?;
    let mut ranks = vec![T::zero(); n];
    let mut i = 0;
    while i < n {
        let val = values[order[i]];
        let mut j = i + 1;

        while j < n && values[order[j]] == val {
            j += 1;
        }

        // Positions i..j share the mean of ranks i+1..=j
        let rank = cast::<T, _>(i + j - 1)? / two + T::one();
        for &idx in &order[i..j] {
            ranks[idx] = rank;
        }

        i = j;
    }

    Ok(ranks)
}

/// Gene indices ordered from highest to lowest rank. Equal ranks keep their row order.
pub fn descending_order<T>(ranks: &[T]) -> Vec<usize>
where
    T: FloatOps,
{
    let mut indices: Vec<usize> = (0..ranks.len()).collect();
    indices.sort_by(|&a, &b| ranks[b].partial_cmp(&ranks[a]).unwrap_or(Ordering::Equal));
    indices
}
