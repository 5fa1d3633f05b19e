// Zone classification - two ordered thresholds over the shaped level
//
// The mapping is re-evaluated from scratch every tick with no hysteresis
// band, so a level resting exactly on a threshold can flicker between
// adjacent zones tick-to-tick. Hosts that need stable transitions debounce
// on their side.

use serde::{Deserialize, Serialize};

/// Discrete classification of the current level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Zone {
    /// Below the yellow threshold (quiet / low pitch)
    #[default]
    Green,
    /// Between the yellow and red thresholds
    Yellow,
    /// At or above the red threshold (loud / high pitch)
    Red,
}

impl Zone {
    /// Map a shaped level onto a zone. Thresholds are inclusive on the
    /// upper side: a level exactly at a threshold belongs to the zone
    /// above it.
    pub fn classify(level: f32, yellow_threshold: f32, red_threshold: f32) -> Zone {
        if level >= red_threshold {
            Zone::Red
        } else if level >= yellow_threshold {
            Zone::Yellow
        } else {
            Zone::Green
        }
    }

    /// Numeric form: Green = 0, Yellow = 1, Red = 2
    pub fn index(self) -> u8 {
        match self {
            Zone::Green => 0,
            Zone::Yellow => 1,
            Zone::Red => 2,
        }
    }
}
