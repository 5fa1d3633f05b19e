// Audio capture side of the engine
//
// `capture` holds the circular sample ring and the `WindowSource` seam the
// DSP pipeline reads through; `mic` is the cpal-backed live implementation.

pub mod capture;
pub mod mic;

pub use capture::{CaptureBuffer, WindowSource};
pub use mic::MicSource;
