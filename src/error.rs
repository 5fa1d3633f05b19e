// Error types for the voicezone engine
//
// Capture-side failures are the only conditions surfaced to the host.
// Everything inside the DSP pipeline (degenerate correlation, buffer
// wraparound, out-of-range configuration writes) is handled in place and
// never reaches this type.

use std::fmt;

/// Capture and engine lifecycle errors
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// No capture device was present at initialization.
    ///
    /// Terminal for the session: the engine runs disabled with frozen
    /// output. A new session (and a new device) is the only recovery.
    DeviceUnavailable,

    /// The capture device exists but the input stream could not be opened
    StreamOpenFailed { reason: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::DeviceUnavailable => {
                write!(f, "no audio capture device available")
            }
            EngineError::StreamOpenFailed { reason } => {
                write!(f, "failed to open capture stream: {}", reason)
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::StreamOpenFailed {
            reason: err.to_string(),
        }
    }
}
