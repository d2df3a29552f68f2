/// Ratio of `part` to `total`. Returns 0.0 when `total` is zero.
pub fn share(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// [`share`] expressed as a percentage.
pub fn pct(part: usize, total: usize) -> f64 {
    share(part, total) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(pct(10, 0), 0.0);
        assert_eq!(share(0, 0), 0.0);
    }

    #[test]
    fn test_pct_normal_values() {
        assert_eq!(pct(50, 100), 50.0);
        assert_eq!(pct(1, 4), 25.0);
        assert_eq!(share(3, 4), 0.75);
    }
}
