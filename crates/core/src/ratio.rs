//! Integer rounding helpers shared by the report builders.
//!
//! All rounding is half-up on non-negative values, so `2.5` becomes `3`.

/// `round(numerator / denominator)` without going through floating point.
///
/// Returns `None` when `denominator` is zero.
#[must_use]
pub fn round_div(numerator: u64, denominator: u64) -> Option<u64> {
    if denominator == 0 {
        return None;
    }
    Some((numerator * 2 + denominator) / (denominator * 2))
}

/// `round(part / whole * 100)`, or `None` when `whole` is zero.
#[must_use]
pub fn percentage(part: u64, whole: u64) -> Option<u64> {
    round_div(part * 100, whole)
}

/// Rounded arithmetic mean, or `None` for an empty input.
#[must_use]
pub fn rounded_mean<I>(values: I) -> Option<u64>
where
    I: IntoIterator<Item = u64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0_u64, 0_u64), |(sum, count), v| (sum + v, count + 1));
    round_div(sum, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up() {
        assert_eq!(round_div(5, 2), Some(3));
        assert_eq!(round_div(7, 3), Some(2));
        assert_eq!(round_div(0, 4), Some(0));
    }

    #[test]
    fn percentage_of_zero_total_is_undefined() {
        assert_eq!(percentage(0, 0), None);
        assert_eq!(percentage(1, 3), Some(33));
        assert_eq!(percentage(2, 3), Some(67));
        assert_eq!(percentage(5, 10), Some(50));
    }

    #[test]
    fn mean_of_scores() {
        assert_eq!(rounded_mean([85, 92]), Some(89));
        assert_eq!(rounded_mean([90, 91]), Some(91));
        assert_eq!(rounded_mean(std::iter::empty()), None);
    }
}
