//! Property-based tests for the reactorsim core.
//!
//! Random layouts and heat deltas are generated with proptest, then
//! structural invariants of heat accounting, commit/rollback, and the
//! run-until loop are checked.

use proptest::prelude::*;
use reactorsim_core::component::{CellState, Component};
use reactorsim_core::device::RunState;
use reactorsim_core::kind::Variant;
use reactorsim_core::test_utils::*;
use reactorsim_core::{ComponentKind, Device, StopConditions, StopReason, cycles_until_failure};

// ===========================================================================
// Generators
// ===========================================================================

fn arb_kind() -> impl Strategy<Value = ComponentKind> {
    (0u8..23).prop_map(ComponentKind::from_index)
}

fn arb_non_empty_kind() -> impl Strategy<Value = ComponentKind> {
    (1u8..23).prop_map(ComponentKind::from_index)
}

/// A random layout for 0..=2 extra chambers.
fn arb_layout() -> impl Strategy<Value = (usize, Vec<ComponentKind>)> {
    (0usize..=2).prop_flat_map(|extra| {
        let cells = (3 + extra) * 6;
        (Just(extra), proptest::collection::vec(arb_kind(), cells))
    })
}

/// Everything commit/rollback is supposed to restore.
fn snapshot(device: &Device) -> (RunState, Vec<Option<(ComponentKind, CellState)>>) {
    let cells = device
        .cells()
        .iter()
        .map(|c| c.as_ref().map(|c| (c.kind(), c.pending_state())))
        .collect();
    (*device.pending(), cells)
}

fn is_heat_store(kind: ComponentKind) -> bool {
    matches!(
        kind.variant(),
        Some(Variant::HeatVent { .. } | Variant::Exchanger { .. } | Variant::Coolant { .. })
    )
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Within capacity, `delta == applied + residual` for every kind.
    #[test]
    fn alter_heat_conserves_within_capacity(
        kind in arb_non_empty_kind(),
        start in 0i32..5_000,
        delta in -10_000i32..10_000,
    ) {
        let mut component = Component::new(kind, 0, 0).unwrap();
        component.alter_heat(start, true);
        let before = component.pending_state().heat;
        let change = component.alter_heat(delta, false);
        let applied = component.pending_state().heat - before;

        if is_heat_store(kind) && before + delta > component.max_heat() {
            prop_assert!(change.destroyed);
            prop_assert_eq!(applied, 0);
            prop_assert!(change.residual <= 0);
        } else {
            prop_assert!(!change.destroyed);
            prop_assert_eq!(applied + change.residual, delta);
        }
    }

    /// Commit immediately followed by rollback changes nothing.
    #[test]
    fn commit_then_rollback_is_a_no_op((extra, kinds) in arb_layout(), ticks in 0usize..20) {
        let mut device = Device::from_kinds(extra, &kinds).unwrap();
        device.initialize_simulation();
        for _ in 0..ticks {
            device.run_tick();
        }
        device.commit();
        let committed = snapshot(&device);
        device.rollback();
        prop_assert_eq!(snapshot(&device), committed);
    }

    /// Rollback restores the committed snapshot however much pending work piled up.
    #[test]
    fn rollback_restores_last_commit((extra, kinds) in arb_layout(), ticks in 1usize..30) {
        let mut device = Device::from_kinds(extra, &kinds).unwrap();
        device.initialize_simulation();
        device.run_tick();
        device.commit();
        let committed = snapshot(&device);

        for _ in 0..ticks {
            device.run_tick();
        }
        device.set_core_heat(123_456);
        device.rollback();
        prop_assert_eq!(snapshot(&device), committed);
    }

    /// The extrapolated cycle count is the first cycle past capacity.
    #[test]
    fn cycles_until_failure_is_first_overflow(
        first in 0i32..100_000,
        second in 0i32..100_000,
        capacity in -10i32..100_000,
    ) {
        match cycles_until_failure(first, second, capacity) {
            None => prop_assert!(capacity <= 0 || second <= first),
            Some(n) => {
                prop_assert!(n >= 1);
                let rise = i64::from(second - first);
                let limit = i64::from(capacity) - 1;
                let n = i64::from(n);
                prop_assert!(i64::from(first) + n * rise > limit);
                if n > 1 {
                    prop_assert!(i64::from(first) + (n - 1) * rise <= limit);
                }
            }
        }
    }

    /// Kinds survive a device round trip regardless of heat state.
    #[test]
    fn kind_list_round_trips((extra, kinds) in arb_layout(), ticks in 0usize..5) {
        let mut device = Device::from_kinds(extra, &kinds).unwrap();
        for _ in 0..ticks {
            device.run_tick();
        }
        device.rollback();
        let rebuilt = Device::from_kinds(extra, &device.kinds()).unwrap();
        prop_assert_eq!(rebuilt.kinds(), kinds.clone());
        for y in 0..rebuilt.height() {
            for x in 0..rebuilt.width() {
                let kind = rebuilt.cell(x, y).map_or(ComponentKind::Empty, |c| c.kind());
                prop_assert_eq!(kind, kinds[y * rebuilt.width() + x]);
            }
        }
    }

    /// Outside cooldown, the loop only gives up at the absolute timeout.
    #[test]
    fn max_ticks_only_at_timeout((extra, kinds) in arb_layout()) {
        let mut limits = fast_limits(400);
        limits.timeout_ticks = 200;
        let mut device = Device::from_kinds(extra, &kinds).unwrap().with_limits(limits);
        device.initialize_simulation();
        let reason = device.run_until(StopConditions::TO_COMPLETION);
        if reason == StopReason::MaxTicks {
            prop_assert_eq!(device.pending().tick, 200);
        } else {
            prop_assert_eq!(reason, StopReason::Meltdown);
        }
    }
}
