//! Tunable game settings.
//!
//! Nothing here changes game balance. The contract constants live in
//! [`crate::rules`].

use crate::error::{ConfigError, GeohuntError, GeohuntResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing settings for the scanner, GPS watch and flavor collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Pause after a rejected scan before decoding resumes.
    pub scanner_cooldown: Duration,
    /// Delay before the camera-less fallback auto-accepts.
    pub simulation_delay: Duration,
    /// Interval between frame grabs.
    pub frame_interval: Duration,
    /// A position fix older than this is stale.
    pub gps_staleness: Duration,
    /// Longest wait for the first fix before reporting "no fix yet".
    pub gps_first_fix_timeout: Duration,
    /// Budget for one flavor-text generation.
    pub flavor_timeout: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            scanner_cooldown: Duration::from_secs(2),
            simulation_delay: Duration::from_secs(3),
            frame_interval: Duration::from_millis(100),
            gps_staleness: Duration::from_secs(30),
            gps_first_fix_timeout: Duration::from_secs(15),
            flavor_timeout: Duration::from_secs(5),
        }
    }
}

impl GameConfig {
    /// Validate that every duration is positive.
    pub fn validate(&self) -> GeohuntResult<()> {
        let fields = [
            ("scanner_cooldown", self.scanner_cooldown),
            ("simulation_delay", self.simulation_delay),
            ("frame_interval", self.frame_interval),
            ("gps_staleness", self.gps_staleness),
            ("gps_first_fix_timeout", self.gps_first_fix_timeout),
            ("flavor_timeout", self.flavor_timeout),
        ];
        for (field, value) in fields {
            if value.is_zero() {
                return Err(GeohuntError::Config(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: format!("{:?}", value),
                    reason: format!("{} must be greater than 0", field),
                }));
            }
        }
        Ok(())
    }
}
