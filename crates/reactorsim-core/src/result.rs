//! The summary a classification produces.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sustainability rating, best (I) to worst (V).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// Runs indefinitely without failure.
    I,
    /// Completes one or more full cycles, then something overheats.
    II,
    /// Fails (component or meltdown) after at least the minimum share of a cycle.
    III,
    /// A component fails early, but the core survives the minimum share.
    IV,
    /// Fails before the minimum share of a cycle.
    V,
}

impl Mark {
    /// Numeric level, 1 through 5.
    pub fn level(self) -> u8 {
        match self {
            Mark::I => 1,
            Mark::II => 2,
            Mark::III => 3,
            Mark::IV => 4,
            Mark::V => 5,
        }
    }

    pub fn from_level(level: u8) -> Option<Mark> {
        match level {
            1 => Some(Mark::I),
            2 => Some(Mark::II),
            3 => Some(Mark::III),
            4 => Some(Mark::IV),
            5 => Some(Mark::V),
            _ => None,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numeral = match self {
            Mark::I => "I",
            Mark::II => "II",
            Mark::III => "III",
            Mark::IV => "IV",
            Mark::V => "V",
        };
        write!(f, "Mark {numeral}")
    }
}

/// Outcome of [`crate::classify`]. Built once and never mutated afterward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Energy per tick, per pulse yield, per fuel unit.
    pub efficiency: f64,
    /// Energy generated over the first operating run.
    pub total_eu_per_cycle: f64,
    /// Energy per tick while operating.
    pub eu_per_tick: i32,
    /// Energy per tick averaged over operation plus cooldown.
    pub overall_eu_per_tick: i32,
    pub uses_single_use_coolant: bool,
    /// The cooldown probe hit the tick cap or gave up.
    pub timed_out: bool,
    pub cooldown_ticks: u32,
    /// Operation plus cooldown. `None` when the cooldown timed out.
    pub cycle_ticks: Option<u32>,
    /// `None` for layouts without fuel.
    pub mark: Option<Mark>,
    /// Full cycles sustained before something overheats (mark II and
    /// component-failure outcomes).
    pub num_iterations_before_failure: Option<u32>,
    pub ticks_until_meltdown: Option<u32>,
    pub ticks_until_component_failure: Option<u32>,
    pub total_cost: i32,
}

impl RunResult {
    /// Mark level, or 0 when the layout was not simulated.
    pub fn mark_level(&self) -> u8 {
        self.mark.map_or(0, Mark::level)
    }
}
