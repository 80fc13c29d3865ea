use num_traits::{NumCast, ToPrimitive};
use single_utilities::traits::FloatOps;

use crate::error::EnrichmentError;

/// Converts a primitive into the working float type, failing instead of panicking.
pub(crate) fn cast<T, V>(value: V) -> anyhow::Result<T>
where
    T: FloatOps,
    V: ToPrimitive + Copy + std::fmt::Debug,
{
    <T as NumCast>::from(value)
        .ok_or_else(|| anyhow::anyhow!("Cannot represent {:?} in the working float type", value))
}

pub(crate) fn to_f64<T>(value: T) -> f64
where
    T: FloatOps,
{
    ToPrimitive::to_f64(&value).unwrap_or(f64::NAN)
}

pub(crate) fn check_finite<T>(values: &[T], sample: usize) -> anyhow::Result<()>
where
    T: FloatOps,
{
    for (gene, &value) in values.iter().enumerate() {
        if !num_traits::Float::is_finite(value) {
            return Err(EnrichmentError::NonFiniteValue {
                gene,
                sample,
                value: to_f64(value),
            }
            .into());
        }
    }
    Ok(())
}
