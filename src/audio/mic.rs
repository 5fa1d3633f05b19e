// MicSource - cpal-backed live capture feeding the sample ring
//
// The cpal callback runs on the backend's audio thread and must never
// block or allocate, so samples cross to the engine thread through a
// lock-free SPSC ring. The engine drains pending samples into its
// CaptureBuffer at the top of each tick and reads the analysis window
// from there.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, RingBuffer};

use crate::audio::capture::{CaptureBuffer, WindowSource};
use crate::config::CAPTURE_SECONDS;
use crate::error::EngineError;

/// Samples of backlog the SPSC ring holds between ticks (one second at
/// 48 kHz covers any realistic tick gap)
const TRANSFER_CAPACITY: usize = 48_000;

/// Live microphone window source
///
/// Owns the cpal input stream for its lifetime. Not `Send`: the engine
/// and its sources are confined to one logical thread of control, and
/// consumers read the published classification result instead of sharing
/// this state.
pub struct MicSource {
    stream: Option<cpal::Stream>,
    consumer: Consumer<f32>,
    buffer: CaptureBuffer,
    sample_rate: u32,
}

/// Names of the host's input devices, in enumeration order
///
/// The index into this list is the index accepted by [`MicSource::open`].
pub fn input_device_names() -> Vec<String> {
    let host = cpal::default_host();
    match host.input_devices() {
        Ok(devices) => devices
            .map(|d| d.name().unwrap_or_else(|_| "<unknown>".to_string()))
            .collect(),
        Err(_) => Vec::new(),
    }
}

impl MicSource {
    /// Open the host's default input device
    pub fn open_default() -> Result<Self, EngineError> {
        Self::open(None)
    }

    /// Open an input device by enumeration index, or the default device
    /// when `device_index` is `None`
    ///
    /// # Errors
    /// `DeviceUnavailable` when the host has no input device (or the
    /// index is past the end of the list); `StreamOpenFailed` when the
    /// device exists but a stream could not be started.
    pub fn open(device_index: Option<usize>) -> Result<Self, EngineError> {
        let host = cpal::default_host();

        let device = match device_index {
            Some(index) => host
                .input_devices()
                .map_err(|e| EngineError::StreamOpenFailed {
                    reason: format!("failed to enumerate input devices: {}", e),
                })?
                .nth(index)
                .ok_or(EngineError::DeviceUnavailable)?,
            None => host
                .default_input_device()
                .ok_or(EngineError::DeviceUnavailable)?,
        };

        let name = device.name().unwrap_or_else(|_| "<unknown>".to_string());

        let config = device
            .default_input_config()
            .map_err(|e| EngineError::StreamOpenFailed {
                reason: format!("failed to get default input config: {:?}", e),
            })?;

        let stream_config: cpal::StreamConfig = config.clone().into();
        let sample_rate = stream_config.sample_rate.0;
        let channels_count = stream_config.channels as usize;

        let (mut producer, consumer) = RingBuffer::<f32>::new(TRANSFER_CAPACITY);

        let err_fn = |err| tracing::warn!("input stream error: {}", err);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // De-interleave: take the first channel. Samples that
                    // do not fit are dropped; the engine drains the ring
                    // every tick, so overflow means the host stopped
                    // ticking.
                    for frame in data.chunks(channels_count) {
                        if producer.push(frame[0]).is_err() {
                            break;
                        }
                    }
                },
                err_fn,
                None,
            ),
            other => {
                return Err(EngineError::StreamOpenFailed {
                    reason: format!("unsupported input sample format {:?}", other),
                })
            }
        }
        .map_err(|e| EngineError::StreamOpenFailed {
            reason: format!("{:?}", e),
        })?;

        stream.play().map_err(|e| EngineError::StreamOpenFailed {
            reason: format!("input start failed: {}", e),
        })?;

        let capacity = (sample_rate as f32 * CAPTURE_SECONDS) as usize;
        tracing::info!(
            "capture started on \"{}\" ({} Hz, {} channel(s))",
            name,
            sample_rate,
            channels_count
        );

        Ok(Self {
            stream: Some(stream),
            consumer,
            buffer: CaptureBuffer::new(capacity),
            sample_rate,
        })
    }

    /// Stop capture and release the stream. Safe to call repeatedly, and
    /// safe if the stream already failed; dropping the source does the
    /// same implicitly.
    pub fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::info!("capture stream released");
        }
    }

    /// Move samples queued by the audio callback into the capture ring
    fn drain_pending(&mut self) {
        let pending = self.consumer.slots();
        if pending == 0 {
            return;
        }
        if let Ok(chunk) = self.consumer.read_chunk(pending) {
            let (first, second) = chunk.as_slices();
            self.buffer.push_slice(first);
            self.buffer.push_slice(second);
            chunk.commit_all();
        }
    }
}

impl WindowSource for MicSource {
    fn latest_window(&mut self, out: &mut [f32]) {
        self.drain_pending();
        self.buffer.latest_window(out);
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
