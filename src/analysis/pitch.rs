// Pitch estimation - time-domain autocorrelation
//
// Estimates the dominant period of the window by scanning integer lags
// and picking the lag whose delayed copy correlates best with the
// original. Cost is O(window * lag_range); the lag range derived from a
// usable vocal pitch band is a few hundred lags at most, so the per-tick
// cost stays bounded and predictable for windows up to 2048 samples.

use crate::analysis::level;

/// Detect the dominant pitch of `window` in Hz
///
/// Returns 0 for silence (windowed RMS below `noise_gate`) and when no
/// lag in range produces a positive correlation; both conditions are
/// ordinary outcomes on quiet or noise-only input, not errors.
///
/// # Arguments
/// * `window` - time-domain samples, most recent capture window
/// * `sample_rate` - capture rate in Hz
/// * `noise_gate` - RMS floor below which the scan is skipped entirely
/// * `min_pitch_hz` / `max_pitch_hz` - detectable pitch band; the band
///   bounds the lag scan to `[rate/max_pitch, min(rate/min_pitch, N/2)]`
pub fn detect(
    window: &[f32],
    sample_rate: u32,
    noise_gate: f32,
    min_pitch_hz: f32,
    max_pitch_hz: f32,
) -> f32 {
    // Silence short-circuit: pitch locks on the noise floor are unstable,
    // so near-silent windows skip the scan instead of being scaled down.
    if level::rms(window) < noise_gate {
        return 0.0;
    }

    let min_lag = ((sample_rate as f32 / max_pitch_hz) as usize).max(1);
    let max_lag = ((sample_rate as f32 / min_pitch_hz) as usize).min(window.len() / 2);
    if min_lag > max_lag {
        return 0.0;
    }

    let mut best_correlation = 0.0_f32;
    let mut best_lag: Option<usize> = None;

    for lag in min_lag..=max_lag {
        let mut correlation = 0.0_f32;
        for i in 0..window.len() - lag {
            correlation += window[i] * window[i + lag];
        }

        // Strict comparison: the first lag to reach a maximum keeps it,
        // so ties resolve toward the shorter lag (higher pitch).
        if correlation > best_correlation {
            best_correlation = correlation;
            best_lag = Some(lag);
        }
    }

    match best_lag {
        Some(lag) => sample_rate as f32 / lag as f32,
        None => 0.0,
    }
}

/// Map a detected pitch onto `[0, 1]` across the configured band
///
/// 0 stays 0 (silence), everything else is the clamped position of the
/// pitch between `min_pitch_hz` and `max_pitch_hz`.
pub fn normalized_target(pitch_hz: f32, min_pitch_hz: f32, max_pitch_hz: f32) -> f32 {
    if pitch_hz <= 0.0 {
        0.0
    } else {
        ((pitch_hz - min_pitch_hz) / (max_pitch_hz - min_pitch_hz)).clamp(0.0, 1.0)
    }
}
