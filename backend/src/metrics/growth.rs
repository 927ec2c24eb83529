//! Growth-rate helpers.

/// Percentage change from each value to the next, in slice order.
///
/// The first entry is always `None`. An entry is also `None` when either
/// neighbour is missing or the previous value is zero.
pub fn pct_change(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    for pair in values.windows(2) {
        let change = match (pair[0], pair[1]) {
            (Some(prev), Some(cur)) if prev != 0.0 => Some((cur - prev) / prev * 100.0),
            _ => None,
        };
        out.push(change);
    }
    out
}

/// Arithmetic mean, or `None` for an empty input.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_change_basic() {
        let out = pct_change(&[Some(100.0), Some(50.0), Some(100.0)]);
        assert_eq!(out, vec![None, Some(-50.0), Some(100.0)]);
    }

    #[test]
    fn test_pct_change_gaps_and_zero() {
        let out = pct_change(&[Some(0.0), Some(10.0), None, Some(20.0), Some(30.0)]);
        assert_eq!(out, vec![None, None, None, None, Some(50.0)]);
    }

    #[test]
    fn test_pct_change_empty_and_single() {
        assert!(pct_change(&[]).is_empty());
        assert_eq!(pct_change(&[Some(5.0)]), vec![None]);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(vec![1.0, 2.0, 6.0]), Some(3.0));
        assert_eq!(mean(Vec::<f64>::new()), None);
    }
}
