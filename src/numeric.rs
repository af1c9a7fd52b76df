//! Small numeric helpers shared by the Lorenz and fractal pipelines.

/// Evenly spaced samples over `[start, end]`, endpoints included.
///
/// Follows the usual `linspace` conventions: `n == 0` yields an empty vector,
/// `n == 1` yields `[start]`, and the last sample is exactly `end`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut samples: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            samples[n - 1] = end;
            samples
        }
    }
}
