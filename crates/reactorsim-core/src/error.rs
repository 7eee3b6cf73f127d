use std::fmt;

use crate::limits::{BASE_WIDTH, GRID_HEIGHT, MAX_EXTRA_CHAMBERS};
use crate::run::StopReason;

/// A flat layout that cannot become a device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("extra chamber count {0} is outside 0..={max}", max = MAX_EXTRA_CHAMBERS)]
    ChamberCount(usize),

    #[error(
        "layout has {actual} cells, a {width}x{height} grid needs {expected}",
        height = GRID_HEIGHT
    )]
    CellCount {
        actual: usize,
        expected: usize,
        width: usize,
    },

    #[error(
        "{0} cells does not describe a grid {min}..={max} wide and {height} high",
        min = BASE_WIDTH,
        max = BASE_WIDTH + MAX_EXTRA_CHAMBERS,
        height = GRID_HEIGHT
    )]
    FlatLength(usize),
}

/// The run within a classification that misbehaved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// First fuel cycle from a cold start.
    Operating,
    /// Fuel removed, waiting for the device to cool.
    Cooldown,
    /// Continued past a component failure to meltdown or fuel end.
    ToCompletion,
    /// Second fuel cycle starting from the first cycle's heat.
    Rerun,
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Probe::Operating => "operating",
            Probe::Cooldown => "cooldown",
            Probe::ToCompletion => "run-to-completion",
            Probe::Rerun => "rerun",
        };
        f.write_str(name)
    }
}

/// Classification aborted on a logic defect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("{probe} probe stopped on unmonitored reason: {reason}")]
    UnexpectedStop { probe: Probe, reason: StopReason },
}
