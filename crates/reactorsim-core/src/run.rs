//! The run-until loop: advance ticks until a monitored stop condition fires.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::device::Device;

/// Why a run stopped. Exactly one per `run_until` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopReason {
    Meltdown,
    FuelUsed,
    CooledDown,
    ComponentFailed,
    /// Absolute timeout, or the cooldown stagnation check gave up.
    MaxTicks,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StopReason::Meltdown => "meltdown",
            StopReason::FuelUsed => "fuel used",
            StopReason::CooledDown => "cooled down",
            StopReason::ComponentFailed => "component failed",
            StopReason::MaxTicks => "max ticks",
        };
        f.write_str(name)
    }
}

/// Which stop reasons a run monitors. The timeout is always monitored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StopConditions {
    pub meltdown: bool,
    pub fuel_used: bool,
    pub cooled_down: bool,
    pub component_failed: bool,
}

impl StopConditions {
    /// Normal operation: stop on the first failure or when the fuel runs out.
    pub const OPERATING: StopConditions = StopConditions {
        meltdown: true,
        fuel_used: true,
        cooled_down: false,
        component_failed: true,
    };

    /// Fuel removed, waiting for residual heat to leave the device.
    pub const COOLDOWN: StopConditions = StopConditions {
        meltdown: false,
        fuel_used: false,
        cooled_down: true,
        component_failed: false,
    };

    /// Keep running through component failures until meltdown or fuel end.
    pub const TO_COMPLETION: StopConditions = StopConditions {
        meltdown: true,
        fuel_used: true,
        cooled_down: false,
        component_failed: false,
    };
}

/// Periodic check that committed heat keeps falling during cooldown.
#[derive(Debug, Default)]
struct Stagnation {
    last_tick: Option<u32>,
    last_total: Option<i32>,
}

impl Stagnation {
    /// Returns true when the committed total failed to drop since the
    /// previous checkpoint. Each checkpoint tick is evaluated once.
    fn stalled(&mut self, tick: u32, total_heat: i32, interval: u32) -> bool {
        if interval == 0 || tick % interval != 0 || self.last_tick == Some(tick) {
            return false;
        }
        self.last_tick = Some(tick);
        let stalled = self.last_total.is_some_and(|last| last <= total_heat);
        trace!(tick, total_heat, last = ?self.last_total, stalled, "cooldown checkpoint");
        self.last_total = Some(total_heat);
        stalled
    }
}

impl Device {
    /// Advance ticks until one of `stop` (or the timeout) fires.
    ///
    /// Each iteration checks the pending state first, then commits the
    /// previous tick and runs the next. The very first iteration skips the
    /// commit, so the device always returns holding one uncommitted tick
    /// that shows the stopping condition.
    pub fn run_until(&mut self, stop: StopConditions) -> StopReason {
        let limits = *self.limits();
        let mut stagnation = Stagnation::default();
        let mut first = true;

        loop {
            let pending = *self.pending();
            let committed = *self.committed();

            let reason = if stop.meltdown && pending.meltdown {
                Some(StopReason::Meltdown)
            } else if stop.component_failed && pending.component_failed {
                Some(StopReason::ComponentFailed)
            } else if stop.fuel_used && pending.tick >= limits.fuel_ticks {
                Some(StopReason::FuelUsed)
            } else if stop.cooled_down && pending.total_heat <= 0 {
                Some(StopReason::CooledDown)
            } else if stop.cooled_down
                && pending.total_heat < limits.residual_heat_threshold
                && pending.total_heat == committed.total_heat
            {
                Some(StopReason::CooledDown)
            } else if pending.tick >= limits.timeout_ticks {
                Some(StopReason::MaxTicks)
            } else if stop.cooled_down
                && stagnation.stalled(
                    committed.tick,
                    committed.total_heat,
                    limits.cooldown_check_interval,
                )
            {
                Some(StopReason::MaxTicks)
            } else {
                None
            };

            if let Some(reason) = reason {
                debug!(
                    %reason,
                    tick = pending.tick,
                    total_heat = pending.total_heat,
                    core_heat = pending.core_heat,
                    "run stopped"
                );
                return reason;
            }

            if !first {
                self.commit();
            }
            first = false;
            self.run_tick();
            self.pending_mut().tick += 1;
        }
    }
}
