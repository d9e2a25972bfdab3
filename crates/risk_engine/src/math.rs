//! Small statistics helpers shared by the VaR and ratio modules.
//!
//! All functions are total: empty or degenerate inputs return 0 rather
//! than NaN, matching the engine-wide guard against non-finite output.

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator); 0 with fewer than two points.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Sample skewness; 0 when the deviation is 0 or there are fewer than
/// three points.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return 0.0;
    }
    let m = mean(values);
    let s = std_dev(values);
    if s == 0.0 {
        return 0.0;
    }
    let nf = n as f64;
    let m3 = values.iter().map(|v| ((v - m) / s).powi(3)).sum::<f64>();
    nf / ((nf - 1.0) * (nf - 2.0)) * m3
}

/// Excess kurtosis (normal distribution maps to 0); 0 when degenerate.
pub fn excess_kurtosis(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 4 {
        return 0.0;
    }
    let m = mean(values);
    let s = std_dev(values);
    if s == 0.0 {
        return 0.0;
    }
    let nf = n as f64;
    let m4 = values.iter().map(|v| ((v - m) / s).powi(4)).sum::<f64>();
    let a = nf * (nf + 1.0) / ((nf - 1.0) * (nf - 2.0) * (nf - 3.0));
    let b = 3.0 * (nf - 1.0).powi(2) / ((nf - 2.0) * (nf - 3.0));
    a * m4 - b
}

/// Index of the `(1 - confidence)` quantile in an ascending-sorted series.
///
/// Clamped to the last valid index so a 100% confidence request cannot
/// read out of bounds.
pub fn tail_index(len: usize, confidence: f64) -> usize {
    let idx = (len as f64 * (1.0 - confidence)).floor() as usize;
    idx.min(len.saturating_sub(1))
}
