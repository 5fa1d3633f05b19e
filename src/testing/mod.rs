// Deterministic window sources for exercising the pipeline without a
// capture backend

pub mod fixtures;

pub use fixtures::{SyntheticPattern, SyntheticSource, WavSource};
