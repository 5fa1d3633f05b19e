// Analysis module - the per-tick classification pipeline
//
// Pipeline order per tick: capture window → level/pitch estimate →
// noise gate → rolling average → envelope follower → zone thresholds.
// The debug override, when active, replaces the first three stages with a
// fixed synthetic target; shaping and classification run identically.
//
// The engine is driven by its host loop through `tick(dt)` and never
// blocks; `dt` is the host's measured delta time and all rate-based math
// uses it directly. State is confined to one engine instance. Concurrent
// consumers read the published ClassificationResult, never the internals.

pub mod classifier;
pub mod debug_override;
pub mod envelope;
pub mod gate;
pub mod level;
pub mod pitch;

pub use classifier::Zone;
pub use debug_override::{DebugOverride, HeldLevel};

use crate::audio::capture::WindowSource;
use crate::audio::mic::MicSource;
use crate::config::{DetectionMode, DetectorConfig, DEFAULT_SAMPLE_RATE};
use envelope::{EnvelopeFollower, RollingAverage};

/// Published output of one tick
///
/// Overwrites the previous result each tick; the engine keeps no history.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct ClassificationResult {
    /// Shaped, smoothed level in [0, 1]
    pub level: f32,
    /// Zone of the current level against the configured thresholds
    pub zone: Zone,
    /// Detected pitch in Hz; 0 outside pitch mode and on silence
    pub pitch_hz: f32,
    /// Whether the debug override produced this result
    pub debug_active: bool,
}

/// Microphone-to-zone classification engine
///
/// Owns the capture source, the per-tick pipeline and all envelope state.
/// Construct once per session; a session whose capture device was absent
/// at initialization stays disabled (frozen output) until a new session.
pub struct ZoneEngine {
    config: DetectorConfig,
    source: Option<Box<dyn WindowSource>>,
    sample_rate: u32,
    window: Vec<f32>,
    smoother: RollingAverage,
    follower: EnvelopeFollower,
    debug: DebugOverride,
    last: ClassificationResult,
}

impl ZoneEngine {
    /// Build an engine over any window source (live capture or fixture)
    pub fn new(config: DetectorConfig, source: Box<dyn WindowSource>) -> Self {
        let sample_rate = source.sample_rate();
        let window = vec![0.0; config.window_size()];
        Self {
            config,
            source: Some(source),
            sample_rate,
            window,
            smoother: RollingAverage::new(),
            follower: EnvelopeFollower::new(),
            debug: DebugOverride::new(),
            last: ClassificationResult::default(),
        }
    }

    /// Build a disabled engine for a session with no capture device
    ///
    /// Live output stays frozen at `level = 0, zone = 0`; the debug
    /// override still drives the full shaping path, since it bypasses
    /// capture by design.
    pub fn disabled(config: DetectorConfig) -> Self {
        let window = vec![0.0; config.window_size()];
        Self {
            config,
            source: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            window,
            smoother: RollingAverage::new(),
            follower: EnvelopeFollower::new(),
            debug: DebugOverride::new(),
            last: ClassificationResult::default(),
        }
    }

    /// Open the default capture device, falling back to a disabled
    /// session when none exists
    pub fn from_default_device(config: DetectorConfig) -> Self {
        Self::from_device(None, config)
    }

    /// Open a capture device by enumeration index (`None` = default),
    /// falling back to a disabled session when capture cannot start
    pub fn from_device(device_index: Option<usize>, config: DetectorConfig) -> Self {
        match MicSource::open(device_index) {
            Ok(source) => Self::new(config, Box::new(source)),
            Err(err) => {
                // One-time report; the condition is terminal for the session
                tracing::warn!("capture unavailable, zone detection disabled: {}", err);
                Self::disabled(config)
            }
        }
    }

    /// Whether a live capture source backs this session
    pub fn is_capture_available(&self) -> bool {
        self.source.is_some()
    }

    /// Release the capture source, ending the session's live input
    ///
    /// Idempotent and safe to call on a session that never had capture;
    /// output freezes at the last published result. Dropping the engine
    /// releases capture the same way.
    pub fn release_capture(&mut self) {
        if self.source.take().is_some() {
            tracing::info!("capture released, session input closed");
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Mutable configuration surface; writes clamp and take effect on the
    /// next tick
    pub fn config_mut(&mut self) -> &mut DetectorConfig {
        &mut self.config
    }

    pub fn debug_override(&self) -> &DebugOverride {
        &self.debug
    }

    pub fn debug_override_mut(&mut self) -> &mut DebugOverride {
        &mut self.debug
    }

    /// Most recently published result
    pub fn latest(&self) -> ClassificationResult {
        self.last
    }

    /// Run one pipeline pass and publish the result
    ///
    /// `dt` is the seconds elapsed since the previous tick as measured by
    /// the host; tick rate may vary freely. On a disabled session with the
    /// override inactive the previous result is returned unchanged.
    pub fn tick(&mut self, dt: f32) -> ClassificationResult {
        let (target, pitch_hz) = if self.debug.is_active() {
            (self.debug.target(&self.config), 0.0)
        } else if let Some(source) = self.source.as_mut() {
            source.latest_window(&mut self.window);
            match self.config.mode() {
                DetectionMode::Volume => {
                    let raw = level::rms(&self.window);
                    let gated = gate::apply(raw, self.config.noise_gate());
                    let target = (gated * self.config.sensitivity()).clamp(0.0, 1.0);
                    (target, 0.0)
                }
                DetectionMode::Pitch => {
                    let pitch_hz = pitch::detect(
                        &self.window,
                        self.sample_rate,
                        self.config.noise_gate(),
                        self.config.min_pitch_hz(),
                        self.config.max_pitch_hz(),
                    );
                    let target = pitch::normalized_target(
                        pitch_hz,
                        self.config.min_pitch_hz(),
                        self.config.max_pitch_hz(),
                    );
                    (target, pitch_hz)
                }
            }
        } else {
            return self.last;
        };

        let averaged = self.smoother.push(target, self.config.smoothing_window());
        let level = self
            .follower
            .advance(averaged, dt, self.config.smoothing());
        let zone = Zone::classify(
            level,
            self.config.yellow_threshold(),
            self.config.red_threshold(),
        );

        self.last = ClassificationResult {
            level,
            zone,
            pitch_hz,
            debug_active: self.debug.is_active(),
        };
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Window source that plays the same constant sample forever
    struct ConstSource {
        value: f32,
    }

    impl WindowSource for ConstSource {
        fn latest_window(&mut self, out: &mut [f32]) {
            out.fill(self.value);
        }

        fn sample_rate(&self) -> u32 {
            DEFAULT_SAMPLE_RATE
        }
    }

    fn run_ticks(engine: &mut ZoneEngine, count: usize) -> ClassificationResult {
        let mut last = engine.latest();
        for _ in 0..count {
            last = engine.tick(1.0 / 60.0);
        }
        last
    }

    #[test]
    fn test_disabled_session_output_frozen() {
        let mut engine = ZoneEngine::disabled(DetectorConfig::default());
        for dt in [0.016, 0.2, 1.0] {
            let result = engine.tick(dt);
            assert_eq!(result.level, 0.0);
            assert_eq!(result.zone, Zone::Green);
            assert_eq!(result.pitch_hz, 0.0);
        }
    }

    #[test]
    fn test_debug_override_runs_on_disabled_session() {
        let mut engine = ZoneEngine::disabled(DetectorConfig::default());
        engine.debug_override_mut().set_active(true);
        engine.debug_override_mut().hold(HeldLevel::High);

        let result = run_ticks(&mut engine, 120);
        assert!(result.debug_active);
        assert_eq!(result.zone, Zone::Red);
    }

    #[test]
    fn test_volume_mode_reaches_red_zone() {
        // Constant 0.02 amplitude: rms 0.02, above the 0.005 gate,
        // target 0.02 * 45 = 0.9
        let mut engine = ZoneEngine::new(
            DetectorConfig::default(),
            Box::new(ConstSource { value: 0.02 }),
        );

        let result = run_ticks(&mut engine, 120);
        assert!((result.level - 0.9).abs() < 1e-3);
        assert_eq!(result.zone, Zone::Red);
        assert_eq!(result.pitch_hz, 0.0);
        assert!(!result.debug_active);
    }

    #[test]
    fn test_volume_below_gate_stays_silent() {
        let mut engine = ZoneEngine::new(
            DetectorConfig::default(),
            Box::new(ConstSource { value: 0.004 }),
        );

        let result = run_ticks(&mut engine, 60);
        assert_eq!(result.level, 0.0);
        assert_eq!(result.zone, Zone::Green);
    }

    #[test]
    fn test_sensitivity_change_applies_next_tick() {
        let mut engine = ZoneEngine::new(
            DetectorConfig::default(),
            Box::new(ConstSource { value: 0.02 }),
        );
        run_ticks(&mut engine, 120);
        assert_eq!(engine.latest().zone, Zone::Red);

        // Dropping sensitivity mid-session pulls the target down to
        // 0.02 * 10 = 0.2 with no restart
        engine.config_mut().set_sensitivity(10.0);
        let result = run_ticks(&mut engine, 120);
        assert!((result.level - 0.2).abs() < 1e-3);
        assert_eq!(result.zone, Zone::Green);
    }

    #[test]
    fn test_debug_override_short_circuits_live_input() {
        let mut engine = ZoneEngine::new(
            DetectorConfig::default(),
            Box::new(ConstSource { value: 0.02 }),
        );
        run_ticks(&mut engine, 120);
        assert_eq!(engine.latest().zone, Zone::Red);

        // Override released: target 0 beats the loud live signal
        engine.debug_override_mut().set_active(true);
        let result = run_ticks(&mut engine, 240);
        assert!(result.debug_active);
        assert_eq!(result.level, 0.0);
        assert_eq!(result.zone, Zone::Green);
    }

    #[test]
    fn test_release_capture_is_idempotent_and_freezes_output() {
        let mut engine = ZoneEngine::new(
            DetectorConfig::default(),
            Box::new(ConstSource { value: 0.02 }),
        );
        let before = run_ticks(&mut engine, 120);
        assert_eq!(before.zone, Zone::Red);

        engine.release_capture();
        engine.release_capture();
        assert!(!engine.is_capture_available());

        // Frozen at the last published result, not reset
        let after = run_ticks(&mut engine, 10);
        assert_eq!(after, before);

        // Safe on a session that never had capture
        let mut never_started = ZoneEngine::disabled(DetectorConfig::default());
        never_started.release_capture();
    }

    #[test]
    fn test_published_result_overwritten_each_tick() {
        let mut engine = ZoneEngine::new(
            DetectorConfig::default(),
            Box::new(ConstSource { value: 0.02 }),
        );
        let first = engine.tick(1.0 / 60.0);
        let second = engine.tick(1.0 / 60.0);
        assert!(second.level > first.level);
        assert_eq!(engine.latest(), second);
    }
}
