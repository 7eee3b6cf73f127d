//! Reactorsim Core -- the simulation engine for grid-based reactor layouts.
//!
//! This crate owns the component model, the device grid with its
//! transactional run state, the two-phase tick engine, the run-until loop,
//! and the classifier that turns a layout into a compact [`RunResult`].
//!
//! # Tick Pipeline
//!
//! Each call to [`device::Device::run_tick`] advances the simulation by one
//! tick:
//!
//! 1. **Reset** -- The device's max heat returns to its base value.
//! 2. **Heat** -- Every live cell ticks in row-major order: vents drain and
//!    dissipate, exchangers equalise, fuel cells burn and spread heat,
//!    platings raise capacity.
//! 3. **Power** -- Every live cell ticks again: fuel cells pulse and energy
//!    is accounted.
//! 4. **Bookkeeping** -- Total system heat is recomputed into pending state.
//!
//! # Commit / Rollback
//!
//! All mutation lands in *pending* state. [`device::Device::commit`] promotes
//! it to *committed* (and clears destroyed cells),
//! [`device::Device::rollback`] discards it. The run-until loop always returns
//! with the tick that triggered the stop left uncommitted, so callers can
//! either keep it or replay from just before it.
//!
//! # Key Types
//!
//! - [`kind::ComponentKind`] -- Closed set of cell kinds.
//! - [`component::Component`] -- One grid cell's state and heat semantics.
//! - [`device::Device`] -- The grid, its counters, and its run state.
//! - [`run::StopReason`] / [`run::StopConditions`] -- Run-until control.
//! - [`classify::classify`] -- Multi-probe classification entry point.
//! - [`result::RunResult`] -- Immutable classification summary.

pub mod classify;
pub mod component;
pub mod device;
pub mod error;
pub mod kind;
pub mod limits;
pub mod result;
pub mod run;
pub mod tick;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use classify::{classify, cycles_until_failure};
pub use device::Device;
pub use error::{LayoutError, Probe, SimError};
pub use kind::ComponentKind;
pub use limits::SimLimits;
pub use result::{Mark, RunResult};
pub use run::{StopConditions, StopReason};
