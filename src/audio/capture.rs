// CaptureBuffer - fixed circular buffer of recent capture samples
//
// The capture backend writes samples at a hardware-driven pace; the engine
// reads a bounded window ending at the current write cursor once per tick.
// The buffer is pre-allocated and never grows, so writes stay allocation-free
// after construction.

/// Source of the most recent analysis window
///
/// Implemented by the live microphone path and by the deterministic
/// fixture sources, so the estimation pipeline runs identically against
/// either. Implementations fill `out` with the most recent `out.len()`
/// samples each call.
pub trait WindowSource {
    fn latest_window(&mut self, out: &mut [f32]);

    /// Sample rate of the produced windows, in Hz
    fn sample_rate(&self) -> u32;
}

/// Fixed-size circular buffer of f32 samples with a movable write cursor
#[derive(Debug)]
pub struct CaptureBuffer {
    samples: Vec<f32>,
    /// Next write index, in `[0, capacity)`
    write_pos: usize,
}

impl CaptureBuffer {
    /// Create a buffer holding `capacity` samples, zero-filled
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        Self {
            samples: vec![0.0; capacity],
            write_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Index of the most recently written sample
    pub fn cursor(&self) -> usize {
        let capacity = self.samples.len();
        (self.write_pos + capacity - 1) % capacity
    }

    /// Append samples, overwriting the oldest data once the buffer wraps
    pub fn push_slice(&mut self, chunk: &[f32]) {
        let capacity = self.samples.len();
        for &sample in chunk {
            self.samples[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % capacity;
        }
    }

    /// Copy the most recent `out.len()` samples, ending at the cursor,
    /// into `out`
    ///
    /// The read start is `cursor - out.len() + 1`, corrected by the buffer
    /// capacity when it goes negative, so a window straddling the wrap
    /// point comes out in order. Windows longer than the buffer are capped
    /// at one full revolution.
    pub fn latest_window(&self, out: &mut [f32]) {
        let capacity = self.samples.len();
        let window = out.len().min(capacity);

        let cursor = self.cursor() as isize;
        let mut start = cursor - window as isize + 1;
        if start < 0 {
            start += capacity as isize;
        }

        for (i, slot) in out.iter_mut().take(window).enumerate() {
            *slot = self.samples[(start as usize + i) % capacity];
        }
    }
}
