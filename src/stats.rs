//! Descriptive statistics shared by the metric extractor and trend engine
//!
//! Thin wrappers over `statrs` that pin down the degenerate cases (empty
//! input, single sample, non-positive mean) so callers never see NaN.

use statrs::statistics::{Data, Median, Statistics};

/// Coefficient of variation reported when a signal has no usable spread
pub const UNSTABLE_CV: f64 = 100.0;

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().mean())
    }
}

/// Mean with zero substituted for an empty slice
pub fn mean_or_zero(values: &[f64]) -> f64 {
    mean(values).unwrap_or(0.0)
}

/// Sample standard deviation (n - 1); zero below two samples
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        0.0
    } else {
        values.iter().std_dev()
    }
}

/// Population standard deviation (n); zero for an empty slice
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().population_std_dev()
    }
}

/// std / mean * 100, or [`UNSTABLE_CV`] when the mean is not positive
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    match mean(values) {
        Some(m) if m > 0.0 => sample_std(values) / m * 100.0,
        _ => UNSTABLE_CV,
    }
}

/// Split at the midpoint; the second half holds the extra element
pub fn split_halves(values: &[f64]) -> (&[f64], &[f64]) {
    values.split_at(values.len() / 2)
}

/// Means of the leading and trailing `1/divisor` windows.
///
/// The leading window is `len / divisor` samples and the trailing window is
/// `ceil(len / divisor)` samples, so the tail never comes up short.
pub fn head_tail_means(values: &[f64], divisor: usize) -> Option<(f64, f64)> {
    if divisor == 0 {
        return None;
    }
    let len = values.len();
    let head = len / divisor;
    let tail = (len + divisor - 1) / divisor;
    if head == 0 || tail == 0 {
        return None;
    }
    let first = mean(&values[..head])?;
    let last = mean(&values[len - tail..])?;
    Some((first, last))
}

/// Median, `None` for an empty slice
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(Data::new(values.to_vec()).median())
    }
}

/// Pearson correlation over two equal-length series
pub fn correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let sx = sample_std(x);
    let sy = sample_std(y);
    if sx == 0.0 || sy == 0.0 {
        return None;
    }
    let cov = x.iter().covariance(y.iter());
    let r = cov / (sx * sy);
    r.is_finite().then_some(r)
}

/// Least-squares line `y = slope * x + intercept`
///
/// `None` below two points or when `x` has no spread.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let var_x = x.iter().variance();
    if var_x.is_nan() || var_x <= 0.0 {
        return None;
    }
    let slope = x.iter().covariance(y.iter()) / var_x;
    let intercept = y.iter().mean() - slope * x.iter().mean();
    (slope.is_finite() && intercept.is_finite()).then_some((slope, intercept))
}

/// Quantile with linear interpolation between closest ranks
///
/// Matches the common spreadsheet/dataframe definition: position
/// `q * (n - 1)` in the sorted data.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
