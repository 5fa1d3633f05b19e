//! Detector configuration with clamped writes
//!
//! All tunable parameters live in [`DetectorConfig`]. Writes go through
//! setters that clamp out-of-range values to the nearest valid bound
//! instead of failing, so a settings surface can forward user input
//! directly. Configuration may change between ticks; the engine reads the
//! current values on each tick and requires no restart.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Sample rate requested from the capture backend, in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Capacity of the rolling-average ring, and the upper bound on
/// `smoothing_window`
pub const MAX_SMOOTHING_WINDOW: usize = 30;

/// Seconds of audio retained by the capture ring
pub const CAPTURE_SECONDS: f32 = 10.0;

const SENSITIVITY_RANGE: (f32, f32) = (1.0, 200.0);
const NOISE_GATE_RANGE: (f32, f32) = (0.0, 0.05);
const SPEED_RANGE: (f32, f32) = (1.0, 30.0);
const THRESHOLD_MARGIN: f32 = 1e-3;

/// Which raw estimate drives the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// RMS energy of the window, scaled by sensitivity
    #[default]
    Volume,
    /// Dominant periodicity of the window, mapped onto the pitch range
    Pitch,
}

/// Envelope follower strategy
///
/// Exactly one strategy shapes the level per tick; the rolling average is
/// a separate layer applied to the raw target before the follower runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Smoothing {
    /// Linear approach with independent rise and fall rates (units of
    /// level per second, applied against the tick's delta time)
    RiseFall { rise: f32, fall: f32 },
    /// Single exponential blend toward the target; `factor` is the share
    /// of the previous level retained each tick
    Exponential { factor: f32 },
}

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing::RiseFall {
            rise: 10.0,
            fall: 5.0,
        }
    }
}

impl Smoothing {
    fn clamped(self) -> Self {
        match self {
            Smoothing::RiseFall { rise, fall } => Smoothing::RiseFall {
                rise: rise.clamp(SPEED_RANGE.0, SPEED_RANGE.1),
                fall: fall.clamp(SPEED_RANGE.0, SPEED_RANGE.1),
            },
            Smoothing::Exponential { factor } => Smoothing::Exponential {
                factor: factor.clamp(0.0, 1.0),
            },
        }
    }
}

/// Complete detector configuration
///
/// Invariants maintained by the setters and by [`DetectorConfig::load_from_file`]:
/// `0 <= noise_gate <= 0.05`, `0 < yellow_threshold < red_threshold <= 1`,
/// `min_pitch_hz < max_pitch_hz`, `1 <= smoothing_window <= 30`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default)]
    mode: DetectionMode,
    #[serde(default = "default_sensitivity")]
    sensitivity: f32,
    #[serde(default = "default_noise_gate")]
    noise_gate: f32,
    #[serde(default = "default_min_pitch")]
    min_pitch_hz: f32,
    #[serde(default = "default_max_pitch")]
    max_pitch_hz: f32,
    #[serde(default)]
    smoothing: Smoothing,
    #[serde(default = "default_smoothing_window")]
    smoothing_window: usize,
    #[serde(default = "default_yellow_threshold")]
    yellow_threshold: f32,
    #[serde(default = "default_red_threshold")]
    red_threshold: f32,
    /// Samples per analysis window. Fixed for the lifetime of an engine
    /// instance; the capture ring and lag bounds are sized from it.
    #[serde(default = "default_window_size")]
    window_size: usize,
}

fn default_sensitivity() -> f32 {
    45.0
}
fn default_noise_gate() -> f32 {
    0.005
}
fn default_min_pitch() -> f32 {
    80.0
}
fn default_max_pitch() -> f32 {
    800.0
}
fn default_smoothing_window() -> usize {
    5
}
fn default_yellow_threshold() -> f32 {
    0.33
}
fn default_red_threshold() -> f32 {
    0.66
}
fn default_window_size() -> usize {
    2048
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            mode: DetectionMode::default(),
            sensitivity: default_sensitivity(),
            noise_gate: default_noise_gate(),
            min_pitch_hz: default_min_pitch(),
            max_pitch_hz: default_max_pitch(),
            smoothing: Smoothing::default(),
            smoothing_window: default_smoothing_window(),
            yellow_threshold: default_yellow_threshold(),
            red_threshold: default_red_threshold(),
            window_size: default_window_size(),
        }
    }
}

impl DetectorConfig {
    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DetectionMode) {
        self.mode = mode;
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, value: f32) {
        self.sensitivity = value.clamp(SENSITIVITY_RANGE.0, SENSITIVITY_RANGE.1);
    }

    pub fn noise_gate(&self) -> f32 {
        self.noise_gate
    }

    pub fn set_noise_gate(&mut self, value: f32) {
        self.noise_gate = value.clamp(NOISE_GATE_RANGE.0, NOISE_GATE_RANGE.1);
    }

    pub fn min_pitch_hz(&self) -> f32 {
        self.min_pitch_hz
    }

    pub fn max_pitch_hz(&self) -> f32 {
        self.max_pitch_hz
    }

    /// Set the detectable pitch range. `min` is floored at 1 Hz and `max`
    /// is pushed above `min` when the pair would be degenerate.
    pub fn set_pitch_range(&mut self, min: f32, max: f32) {
        self.min_pitch_hz = min.max(1.0);
        self.max_pitch_hz = max.max(self.min_pitch_hz + 1.0);
    }

    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    pub fn set_smoothing(&mut self, smoothing: Smoothing) {
        self.smoothing = smoothing.clamped();
    }

    pub fn smoothing_window(&self) -> usize {
        self.smoothing_window
    }

    pub fn set_smoothing_window(&mut self, value: usize) {
        self.smoothing_window = value.clamp(1, MAX_SMOOTHING_WINDOW);
    }

    pub fn yellow_threshold(&self) -> f32 {
        self.yellow_threshold
    }

    pub fn red_threshold(&self) -> f32 {
        self.red_threshold
    }

    /// Set both zone thresholds, preserving `0 < yellow < red <= 1`
    pub fn set_thresholds(&mut self, yellow: f32, red: f32) {
        self.yellow_threshold = yellow.clamp(THRESHOLD_MARGIN, 1.0 - THRESHOLD_MARGIN);
        self.red_threshold = red.clamp(self.yellow_threshold + THRESHOLD_MARGIN, 1.0);
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Re-apply every clamp, restoring the documented invariants on a
    /// value that bypassed the setters (deserialization, struct update)
    fn sanitize(&mut self) {
        self.set_sensitivity(self.sensitivity);
        self.set_noise_gate(self.noise_gate);
        self.set_pitch_range(self.min_pitch_hz, self.max_pitch_hz);
        self.set_smoothing(self.smoothing);
        self.set_smoothing_window(self.smoothing_window);
        self.set_thresholds(self.yellow_threshold, self.red_threshold);
        self.window_size = self.window_size.max(2);
    }

    /// Load configuration from a JSON file
    ///
    /// Falls back to defaults when the file is missing or malformed, so a
    /// host can always obtain a usable configuration. Loaded values pass
    /// through the same clamps as setter writes.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<DetectorConfig>(&contents) {
                Ok(mut config) => {
                    config.sanitize();
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert_eq!(config.mode(), DetectionMode::Volume);
        assert_eq!(config.sensitivity(), 45.0);
        assert_eq!(config.noise_gate(), 0.005);
        assert_eq!(config.min_pitch_hz(), 80.0);
        assert_eq!(config.max_pitch_hz(), 800.0);
        assert_eq!(config.smoothing_window(), 5);
        assert_eq!(config.yellow_threshold(), 0.33);
        assert_eq!(config.red_threshold(), 0.66);
        assert_eq!(config.window_size(), 2048);
    }

    #[test]
    fn test_setters_clamp_out_of_range_writes() {
        let mut config = DetectorConfig::default();

        config.set_sensitivity(500.0);
        assert_eq!(config.sensitivity(), 200.0);
        config.set_sensitivity(0.0);
        assert_eq!(config.sensitivity(), 1.0);

        config.set_noise_gate(0.2);
        assert_eq!(config.noise_gate(), 0.05);
        config.set_noise_gate(-1.0);
        assert_eq!(config.noise_gate(), 0.0);

        config.set_smoothing_window(0);
        assert_eq!(config.smoothing_window(), 1);
        config.set_smoothing_window(100);
        assert_eq!(config.smoothing_window(), MAX_SMOOTHING_WINDOW);
    }

    #[test]
    fn test_threshold_ordering_preserved() {
        let mut config = DetectorConfig::default();

        // red forced above yellow even when the write inverts them
        config.set_thresholds(0.8, 0.2);
        assert!(config.yellow_threshold() < config.red_threshold());
        assert!(config.red_threshold() <= 1.0);

        config.set_thresholds(0.0, 1.0);
        assert!(config.yellow_threshold() > 0.0);
        assert_eq!(config.red_threshold(), 1.0);
    }

    #[test]
    fn test_pitch_range_degenerate_write() {
        let mut config = DetectorConfig::default();
        config.set_pitch_range(300.0, 100.0);
        assert!(config.min_pitch_hz() < config.max_pitch_hz());
    }

    #[test]
    fn test_smoothing_clamp() {
        let mut config = DetectorConfig::default();

        config.set_smoothing(Smoothing::RiseFall {
            rise: 100.0,
            fall: 0.0,
        });
        assert_eq!(
            config.smoothing(),
            Smoothing::RiseFall {
                rise: 30.0,
                fall: 1.0
            }
        );

        config.set_smoothing(Smoothing::Exponential { factor: 1.5 });
        assert_eq!(config.smoothing(), Smoothing::Exponential { factor: 1.0 });
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = DetectorConfig::default();
        config.set_mode(DetectionMode::Pitch);
        config.set_sensitivity(80.0);

        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: DetectorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = DetectorConfig::load_from_file("/nonexistent/voicezone.json");
        assert_eq!(config, DetectorConfig::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let parsed: DetectorConfig =
            serde_json::from_str(r#"{"mode": "pitch", "sensitivity": 60.0}"#).unwrap();
        assert_eq!(parsed.mode(), DetectionMode::Pitch);
        assert_eq!(parsed.sensitivity(), 60.0);
        assert_eq!(parsed.red_threshold(), 0.66);
    }
}
