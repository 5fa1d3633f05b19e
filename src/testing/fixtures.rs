// Fixture window sources
//
// Deterministic PCM sources that feed the classification pipeline through
// the same `WindowSource` seam as live capture, so tests and the
// zone-meter binary can exercise every stage with no audio hardware
// present. Synthetic patterns are phase-continuous across calls; noise is
// generated from a fixed seed so repeated runs see identical windows.

use std::f32::consts::PI;
use std::path::Path;
use std::str::FromStr;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::audio::capture::WindowSource;
use crate::config::DEFAULT_SAMPLE_RATE;
use crate::error::EngineError;

const NOISE_SEED: u64 = 0x5EED_1234;

/// Supported deterministic waveform patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticPattern {
    Sine,
    Square,
    WhiteNoise,
    Silence,
}

/// Procedurally generated window source
#[derive(Debug)]
pub struct SyntheticSource {
    pattern: SyntheticPattern,
    frequency_hz: f32,
    amplitude: f32,
    sample_rate: u32,
    position: u64,
    rng: StdRng,
}

impl SyntheticSource {
    pub fn new(
        pattern: SyntheticPattern,
        frequency_hz: f32,
        amplitude: f32,
        sample_rate: u32,
    ) -> Self {
        Self {
            pattern,
            frequency_hz,
            amplitude,
            sample_rate,
            position: 0,
            rng: StdRng::seed_from_u64(NOISE_SEED),
        }
    }

    pub fn sine(frequency_hz: f32, amplitude: f32) -> Self {
        Self::new(
            SyntheticPattern::Sine,
            frequency_hz,
            amplitude,
            DEFAULT_SAMPLE_RATE,
        )
    }

    pub fn square(frequency_hz: f32, amplitude: f32) -> Self {
        Self::new(
            SyntheticPattern::Square,
            frequency_hz,
            amplitude,
            DEFAULT_SAMPLE_RATE,
        )
    }

    pub fn white_noise(amplitude: f32) -> Self {
        Self::new(
            SyntheticPattern::WhiteNoise,
            0.0,
            amplitude,
            DEFAULT_SAMPLE_RATE,
        )
    }

    pub fn silence() -> Self {
        Self::new(SyntheticPattern::Silence, 0.0, 0.0, DEFAULT_SAMPLE_RATE)
    }

    fn sample_at(&mut self, index: u64) -> f32 {
        match self.pattern {
            SyntheticPattern::Sine => {
                let phase =
                    2.0 * PI * self.frequency_hz * index as f32 / self.sample_rate as f32;
                self.amplitude * phase.sin()
            }
            SyntheticPattern::Square => {
                let phase =
                    2.0 * PI * self.frequency_hz * index as f32 / self.sample_rate as f32;
                if phase.sin() >= 0.0 {
                    self.amplitude
                } else {
                    -self.amplitude
                }
            }
            SyntheticPattern::WhiteNoise => self.rng.gen_range(-1.0..=1.0) * self.amplitude,
            SyntheticPattern::Silence => 0.0,
        }
    }
}

impl WindowSource for SyntheticSource {
    fn latest_window(&mut self, out: &mut [f32]) {
        let base = self.position;
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.sample_at(base + i as u64);
        }
        self.position = base + out.len() as u64;
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Parse a fixture spec string: `pattern[:frequency[:amplitude]]`
///
/// Examples: `sine:220`, `sine:220:0.5`, `square:110`, `noise:0.3`,
/// `silence`. Frequency defaults to 220 Hz and amplitude to 0.5.
impl FromStr for SyntheticSource {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut parts = spec.split(':');
        let pattern = parts.next().unwrap_or_default();

        let parse_f32 = |part: Option<&str>, default: f32, what: &str| -> Result<f32, String> {
            match part {
                Some(text) => text
                    .parse::<f32>()
                    .map_err(|_| format!("invalid {} in fixture spec: {:?}", what, text)),
                None => Ok(default),
            }
        };

        match pattern {
            "sine" | "square" => {
                let frequency = parse_f32(parts.next(), 220.0, "frequency")?;
                let amplitude = parse_f32(parts.next(), 0.5, "amplitude")?;
                if pattern == "sine" {
                    Ok(Self::sine(frequency, amplitude))
                } else {
                    Ok(Self::square(frequency, amplitude))
                }
            }
            "noise" => {
                let amplitude = parse_f32(parts.next(), 0.5, "amplitude")?;
                Ok(Self::white_noise(amplitude))
            }
            "silence" => Ok(Self::silence()),
            other => Err(format!(
                "unknown fixture pattern {:?} (expected sine, square, noise or silence)",
                other
            )),
        }
    }
}

/// Window source backed by a WAV file, looping at the end
#[derive(Debug)]
pub struct WavSource {
    samples: Vec<f32>,
    sample_rate: u32,
    position: usize,
}

impl WavSource {
    /// Load a WAV file, keeping channel 0 of interleaved data
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let mut reader =
            hound::WavReader::open(&path).map_err(|e| EngineError::StreamOpenFailed {
                reason: format!("failed to open {:?}: {}", path.as_ref(), e),
            })?;

        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .step_by(channels)
                .collect::<Result<_, _>>(),
            hound::SampleFormat::Int => {
                let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .step_by(channels)
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()
            }
        }
        .map_err(|e| EngineError::StreamOpenFailed {
            reason: format!("failed to decode {:?}: {}", path.as_ref(), e),
        })?;

        if samples.is_empty() {
            return Err(EngineError::StreamOpenFailed {
                reason: format!("{:?} contains no samples", path.as_ref()),
            });
        }

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
            position: 0,
        })
    }
}

impl WindowSource for WavSource {
    fn latest_window(&mut self, out: &mut [f32]) {
        for slot in out.iter_mut() {
            *slot = self.samples[self.position];
            self.position = (self.position + 1) % self.samples.len();
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
