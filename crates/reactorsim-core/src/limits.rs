//! Tunable thresholds for runs and classification.

use serde::{Deserialize, Serialize};

/// Grid height. Width is `BASE_WIDTH + extra chambers`.
pub const GRID_HEIGHT: usize = 6;
pub const BASE_WIDTH: usize = 3;
pub const MAX_EXTRA_CHAMBERS: usize = 6;

/// Energy generated by one accepted pulse in the power phase.
pub const EU_PER_PULSE: i64 = 5;

/// Heat-phase passes after which a fuel cell stops pulsing.
pub const FUEL_CELL_MAX_USAGE: i32 = 10_000;

/// Thresholds for the run-until loop and the classifier.
///
/// Every device carries one of these; copies made for probes inherit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimLimits {
    /// Ticks in one fuel cycle.
    pub fuel_ticks: u32,
    /// Absolute tick cap for any run.
    pub timeout_ticks: u32,
    /// Committed ticks between stagnation checkpoints during cooldown.
    pub cooldown_check_interval: u32,
    /// Total heat below which an unchanged reading counts as cooled down.
    pub residual_heat_threshold: i32,
    /// Core heat capacity before plating bonuses.
    pub base_max_heat: i32,
    /// Share of a fuel cycle (percent) a run must survive to rate above mark V.
    pub min_cycle_percent: u32,
}

impl SimLimits {
    pub const DEFAULT: SimLimits = SimLimits {
        fuel_ticks: 10_000,
        timeout_ticks: 50_000,
        cooldown_check_interval: 8,
        residual_heat_threshold: 100,
        base_max_heat: 10_000,
        min_cycle_percent: 10,
    };

    /// Whether a run lasting `ticks` covered the minimum share of a cycle.
    pub fn reached_min_cycle(&self, ticks: u32) -> bool {
        if self.fuel_ticks == 0 {
            return true;
        }
        u64::from(ticks) * 100 / u64::from(self.fuel_ticks) >= u64::from(self.min_cycle_percent)
    }
}

impl Default for SimLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}
