// DebugOverride - operator-forced targets replacing live input
//
// When active, capture and estimation are bypassed entirely and the held
// control picks a fixed synthetic target that feeds straight into the
// envelope shaper. Smoothing and classification run unchanged, which makes
// this the seam for exercising the full pipeline with no microphone.

use serde::{Deserialize, Serialize};

use crate::config::DetectorConfig;

/// Which synthetic target the operator is holding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HeldLevel {
    /// Nothing held: target 0, level decays to silence
    #[default]
    Released,
    /// Midpoint of the yellow band; settles in zone 1
    Medium,
    /// Midpoint between the red threshold and full scale; settles in zone 2
    High,
}

/// Override state carried by the engine
#[derive(Debug, Default)]
pub struct DebugOverride {
    active: bool,
    held: HeldLevel,
}

impl DebugOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn held(&self) -> HeldLevel {
        self.held
    }

    pub fn hold(&mut self, held: HeldLevel) {
        self.held = held;
    }

    /// Synthetic target for the current hold, derived from the configured
    /// thresholds so the forced levels land inside the intended zones
    pub fn target(&self, config: &DetectorConfig) -> f32 {
        match self.held {
            HeldLevel::Released => 0.0,
            HeldLevel::Medium => (config.yellow_threshold() + config.red_threshold()) / 2.0,
            HeldLevel::High => (config.red_threshold() + 1.0) / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classifier::Zone;

    #[test]
    fn test_targets_land_in_their_zones() {
        let config = DetectorConfig::default();
        let mut debug = DebugOverride::new();

        assert_eq!(debug.target(&config), 0.0);

        debug.hold(HeldLevel::Medium);
        let medium = debug.target(&config);
        assert_eq!(
            Zone::classify(medium, config.yellow_threshold(), config.red_threshold()),
            Zone::Yellow
        );

        debug.hold(HeldLevel::High);
        let high = debug.target(&config);
        assert_eq!(
            Zone::classify(high, config.yellow_threshold(), config.red_threshold()),
            Zone::Red
        );
        assert!(high <= 1.0);
    }

    #[test]
    fn test_targets_follow_threshold_changes() {
        let mut config = DetectorConfig::default();
        let mut debug = DebugOverride::new();
        debug.hold(HeldLevel::Medium);

        let before = debug.target(&config);
        config.set_thresholds(0.5, 0.9);
        let after = debug.target(&config);

        assert!((before - (0.33 + 0.66) / 2.0).abs() < 1e-6);
        assert!((after - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_inactive_by_default() {
        let debug = DebugOverride::new();
        assert!(!debug.is_active());
        assert_eq!(debug.held(), HeldLevel::Released);
    }
}
