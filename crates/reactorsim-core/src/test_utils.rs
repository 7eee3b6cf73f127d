//! Shared layout builders for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::device::Device;
use crate::kind::ComponentKind;
use crate::limits::SimLimits;

/// A device with `extra_chambers` and the listed `(x, y, kind)` placements.
///
/// # Panics
///
/// Panics if `extra_chambers` is out of range.
pub fn device_with(extra_chambers: usize, cells: &[(usize, usize, ComponentKind)]) -> Device {
    let mut device = Device::new(extra_chambers).expect("valid chamber count");
    for &(x, y, kind) in cells {
        device.set(x, y, kind);
    }
    device
}

/// A base-width device with `center` at (1, 1) and `neighbor` on all four sides.
pub fn surrounded(center: ComponentKind, neighbor: ComponentKind) -> Device {
    device_with(
        0,
        &[
            (1, 1, center),
            (1, 0, neighbor),
            (0, 1, neighbor),
            (2, 1, neighbor),
            (1, 2, neighbor),
        ],
    )
}

/// Every cell of a device filled with `kind`.
pub fn filled(extra_chambers: usize, kind: ComponentKind) -> Device {
    let mut device = Device::new(extra_chambers).expect("valid chamber count");
    for y in 0..device.height() {
        for x in 0..device.width() {
            device.set(x, y, kind);
        }
    }
    device
}

/// Build a device from rows of kinds, top row first. The first row's length
/// sets the width.
///
/// # Panics
///
/// Panics if the rows are ragged or do not form a valid grid.
pub fn from_rows(rows: &[&[ComponentKind]]) -> Device {
    let width = rows.first().map_or(3, |r| r.len());
    let kinds: Vec<ComponentKind> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    let extra = width.saturating_sub(3);
    Device::from_kinds(extra, &kinds).expect("rectangular layout")
}

/// Short cycles for tests that only care about relative outcomes.
pub fn fast_limits(fuel_ticks: u32) -> SimLimits {
    SimLimits {
        fuel_ticks,
        timeout_ticks: fuel_ticks.saturating_mul(5),
        ..SimLimits::default()
    }
}
