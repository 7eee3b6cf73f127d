//! Multi-probe classification of a device layout.
//!
//! One operating run from a cold start decides the branch. Each branch then
//! runs further probes over independent copies of the device:
//!
//! - **Cooldown**: fuel removed, failures suppressed, run until the heat is
//!   gone (or the loop gives up). Feeds cooldown and lifecycle figures.
//! - **Run to completion**: after an early component failure, keep going
//!   to see whether the core itself survives.
//! - **Rerun**: after a clean cycle that left heat behind, run a second
//!   cycle from that heat and extrapolate when something overflows.

use tracing::debug;

use crate::device::Device;
use crate::error::{Probe, SimError};
use crate::limits::EU_PER_PULSE;
use crate::result::{Mark, RunResult};
use crate::run::{StopConditions, StopReason};

/// Cycles a heat store survives when each cycle adds `second - first` heat.
///
/// Returns the smallest `n >= 1` with `first + n * (second - first)` above
/// `capacity - 1`, or `None` when capacity is non-positive or heat is not
/// rising.
pub fn cycles_until_failure(first: i32, second: i32, capacity: i32) -> Option<u32> {
    if capacity <= 0 {
        return None;
    }
    let rise = i64::from(second) - i64::from(first);
    if rise <= 0 {
        return None;
    }
    let headroom = i64::from(capacity) - i64::from(first) - 1;
    if headroom < 0 {
        return Some(1);
    }
    u32::try_from(headroom / rise + 1).ok()
}

/// Run every probe over copies of `device` and summarise the outcome.
///
/// `device` itself is never mutated. A device without fuel is not simulated
/// and yields a cost-only result.
pub fn classify(device: &Device) -> Result<RunResult, SimError> {
    let mut initial = device.clone();
    initial.initialize_simulation();

    let mut result = RunResult {
        total_cost: initial.total_cost(),
        ..RunResult::default()
    };

    let fuel_units = initial.fuel_units();
    if fuel_units == 0 {
        debug!(total_cost = result.total_cost, "no fuel, skipping simulation");
        return Ok(result);
    }
    result.uses_single_use_coolant = initial.uses_single_use_coolant();

    let limits = *initial.limits();
    let first_stop = initial.run_until(StopConditions::OPERATING);
    if first_stop == StopReason::FuelUsed {
        initial.commit();
    }

    let operated = *initial.committed();
    let total_eu = operated.eu_generated;
    let eu_per_tick = per_tick(total_eu, operated.tick);
    result.total_eu_per_cycle = total_eu as f64;
    result.eu_per_tick = eu_per_tick;
    result.efficiency = f64::from(eu_per_tick) / EU_PER_PULSE as f64 / f64::from(fuel_units);

    debug!(
        reason = %first_stop,
        tick = operated.tick,
        eu_per_tick,
        "operating run finished"
    );

    match first_stop {
        StopReason::ComponentFailed => {
            result.num_iterations_before_failure = Some(0);
            result.ticks_until_component_failure = Some(operated.tick);

            let (cooldown, completion) = join(
                || cooldown_probe(&initial, true, true),
                || completion_probe(&initial),
            );
            apply_cooldown(&mut result, cooldown, &initial, total_eu)?;
            let completion = completion?;

            result.mark = Some(if limits.reached_min_cycle(operated.tick) {
                Mark::III
            } else if limits.reached_min_cycle(completion.tick) {
                Mark::IV
            } else {
                Mark::V
            });
            if completion.reason == StopReason::Meltdown {
                result.ticks_until_meltdown = Some(completion.tick);
            }
        }
        StopReason::Meltdown => {
            result.num_iterations_before_failure = Some(0);
            result.ticks_until_meltdown = Some(operated.tick);
            result.mark = Some(if limits.reached_min_cycle(operated.tick) {
                Mark::III
            } else {
                Mark::V
            });
            let cooldown = cooldown_probe(&initial, true, false);
            apply_cooldown(&mut result, cooldown, &initial, total_eu)?;
        }
        StopReason::FuelUsed if operated.total_heat <= 0 => {
            result.mark = Some(Mark::I);
            result.overall_eu_per_tick = eu_per_tick;
            result.cycle_ticks = Some(limits.fuel_ticks);
        }
        StopReason::FuelUsed => {
            let (cooldown, rerun) = join(
                || cooldown_probe(&initial, false, false),
                || rerun_probe(&initial),
            );
            apply_cooldown(&mut result, cooldown, &initial, total_eu)?;

            match rerun? {
                None => {
                    result.mark = Some(Mark::I);
                    result.overall_eu_per_tick = eu_per_tick;
                    result.cycle_ticks = Some(limits.fuel_ticks);
                }
                Some(cycles) => {
                    result.mark = Some(Mark::II);
                    result.num_iterations_before_failure = Some(cycles);
                }
            }
        }
        reason => {
            return Err(SimError::UnexpectedStop {
                probe: Probe::Operating,
                reason,
            });
        }
    }

    debug!(
        mark = ?result.mark,
        timed_out = result.timed_out,
        cycle_ticks = ?result.cycle_ticks,
        "classification finished"
    );
    Ok(result)
}

/// Integer energy per tick, zero for a run that never ticked.
fn per_tick(eu: i64, ticks: u32) -> i32 {
    if ticks == 0 {
        return 0;
    }
    i32::try_from(eu / i64::from(ticks)).unwrap_or(i32::MAX)
}

/// Stop reason and committed tick of a finished probe.
#[derive(Debug, Clone, Copy)]
struct ProbeEnd {
    reason: StopReason,
    tick: u32,
}

/// Strip fuel from a copy and run it until it cools down. With `rollback`,
/// the copy first discards the tick that stopped the operating run. With
/// `commit_on_stop`, the stopping tick is committed and counted.
fn cooldown_probe(initial: &Device, rollback: bool, commit_on_stop: bool) -> ProbeEnd {
    let mut device = initial.clone();
    if rollback {
        device.rollback();
    }
    device.remove_fuel();
    device.set_suppress_failures(true);
    let reason = device.run_until(StopConditions::COOLDOWN);
    if commit_on_stop {
        device.commit();
    }
    ProbeEnd {
        reason,
        tick: device.committed().tick,
    }
}

fn apply_cooldown(
    result: &mut RunResult,
    cooldown: ProbeEnd,
    initial: &Device,
    total_eu: i64,
) -> Result<(), SimError> {
    match cooldown.reason {
        StopReason::CooledDown => {
            result.cooldown_ticks = cooldown.tick.saturating_sub(initial.pending().tick);
            result.cycle_ticks = Some(cooldown.tick);
            result.overall_eu_per_tick = per_tick(total_eu, cooldown.tick);
        }
        StopReason::MaxTicks => {
            result.timed_out = true;
            result.cycle_ticks = None;
        }
        reason => {
            return Err(SimError::UnexpectedStop {
                probe: Probe::Cooldown,
                reason,
            });
        }
    }
    debug!(
        reason = %cooldown.reason,
        tick = cooldown.tick,
        "cooldown probe finished"
    );
    Ok(())
}

/// Keep the failing tick and run on, ignoring further component failures.
fn completion_probe(initial: &Device) -> Result<ProbeEnd, SimError> {
    let mut device = initial.clone();
    device.commit();
    let reason = device.run_until(StopConditions::TO_COMPLETION);
    match reason {
        StopReason::Meltdown | StopReason::FuelUsed => {
            debug!(%reason, tick = device.committed().tick, "completion probe finished");
            Ok(ProbeEnd {
                reason,
                tick: device.committed().tick,
            })
        }
        reason => Err(SimError::UnexpectedStop {
            probe: Probe::ToCompletion,
            reason,
        }),
    }
}

/// Run a second cycle from the heat the first one left behind.
///
/// Returns the fewest further cycles before the core or any component
/// overflows, `Some(1)` if the second cycle already fails, or `None` if
/// nothing is heating up.
fn rerun_probe(initial: &Device) -> Result<Option<u32>, SimError> {
    let mut rerun = initial.clone();
    rerun.reset_usage();
    let reason = rerun.run_until(StopConditions::OPERATING);
    debug!(%reason, tick = rerun.pending().tick, "rerun probe finished");

    match reason {
        StopReason::Meltdown | StopReason::ComponentFailed => Ok(Some(1)),
        StopReason::FuelUsed => {
            rerun.commit();
            let core = cycles_until_failure(
                initial.core_heat(),
                rerun.core_heat(),
                initial.max_heat(),
            );
            let cells = initial
                .cells()
                .iter()
                .zip(rerun.cells())
                .filter_map(|(before, after)| {
                    let (before, after) = (before.as_ref()?, after.as_ref()?);
                    cycles_until_failure(
                        before.current_heat(),
                        after.current_heat(),
                        before.max_heat(),
                    )
                });
            Ok(core.into_iter().chain(cells).min())
        }
        reason => Err(SimError::UnexpectedStop {
            probe: Probe::Rerun,
            reason,
        }),
    }
}

/// Run two independent probes, concurrently with the `parallel` feature.
fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    #[cfg(feature = "parallel")]
    {
        rayon::join(a, b)
    }
    #[cfg(not(feature = "parallel"))]
    {
        (a(), b())
    }
}
