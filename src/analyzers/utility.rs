/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    mean_of(values.iter().copied())
}

/// Mean of an iterator of values, with the same empty-input convention as [`mean`].
///
/// Accumulated incrementally so that finite inputs near `f64::MAX` never
/// overflow to infinity.
pub fn mean_of(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut mean = 0.0;
    let mut count = 0usize;
    for v in values {
        count += 1;
        let n = count as f64;
        mean += v / n - mean / n;
    }
    mean
}
