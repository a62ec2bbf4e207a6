//! Small statistics helpers shared by the scoring crates.
//!
//! Empty inputs yield 0.0 rather than NaN so downstream scores never carry
//! NaN into a report.

/// Compute the mean of a data slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Fraction of `true` flags (0.0 to 1.0).
pub fn share<I>(flags: I) -> f64
where
    I: IntoIterator<Item = bool>,
{
    let mut total = 0usize;
    let mut hits = 0usize;
    for flag in flags {
        total += 1;
        if flag {
            hits += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    hits as f64 / total as f64
}

/// Period-over-period percentage change. The first element has no
/// predecessor and is `None`, as is any step off a zero base.
pub fn pct_change(series: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(series.len());
    for (i, value) in series.iter().enumerate() {
        if i == 0 {
            out.push(None);
            continue;
        }
        let prev = series[i - 1];
        let change = (value - prev) / prev;
        out.push(if change.is_finite() { Some(change) } else { None });
    }
    out
}

/// Round to a fixed number of decimal places for display.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean() {
        let data = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        assert_relative_eq!(mean(&data), 30.0);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_share() {
        assert_relative_eq!(share(vec![true, false, true, true]), 0.75);
        assert_eq!(share(Vec::<bool>::new()), 0.0);
    }

    #[test]
    fn test_pct_change() {
        let changes = pct_change(&[2.0, 3.0, 1.5, 0.0, 4.0]);
        assert_eq!(changes[0], None);
        assert_relative_eq!(changes[1].unwrap(), 0.5);
        assert_relative_eq!(changes[2].unwrap(), -0.5);
        assert_relative_eq!(changes[3].unwrap(), -1.0);
        // step off a zero base is undefined
        assert_eq!(changes[4], None);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(27.36, 1), 27.4);
    }
}
