// Level estimation - windowed RMS energy

/// Root-mean-square energy of a sample window
///
/// Formula: `sqrt((1/N) * sum(x[i]^2))`. Pure function of the window;
/// an empty window reports 0.
pub fn rms(window: &[f32]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = window.iter().map(|&x| x * x).sum();
    (sum_squares / window.len() as f32).sqrt()
}
