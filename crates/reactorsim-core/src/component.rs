//! One grid cell: identity, committed/pending state, and heat semantics.
//!
//! Components never hold a reference to their device. Operations that need
//! the rest of the grid (ticks, pulses) live on [`crate::device::Device`] and
//! address components by index; the methods here only touch the cell itself.

use crate::kind::{ComponentKind, Variant};

/// Mutable per-cell state. One copy is committed, one is pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellState {
    pub destroyed: bool,
    /// Stored heat. For condensators, the fill of the single-use counter.
    pub heat: i32,
    /// Pulse/burn usage for fuel cells and reflectors.
    pub usage: i32,
}

/// Outcome of [`Component::alter_heat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatChange {
    /// Heat that could not be applied. Positive for unmet additions on
    /// non-storing cells, negative for unmet removals, and
    /// `capacity - new_heat + 1` on overflow.
    pub residual: i32,
    /// The call destroyed the component.
    pub destroyed: bool,
}

impl HeatChange {
    fn absorbed(residual: i32) -> Self {
        Self {
            residual,
            destroyed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    kind: ComponentKind,
    variant: Variant,
    x: usize,
    y: usize,
    pub(crate) committed: CellState,
    pub(crate) pending: CellState,
}

impl Component {
    /// Create a fresh component, or `None` for the empty kind.
    pub fn new(kind: ComponentKind, x: usize, y: usize) -> Option<Self> {
        let variant = kind.variant()?;
        Some(Self {
            kind,
            variant,
            x,
            y,
            committed: CellState::default(),
            pending: CellState::default(),
        })
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn x(&self) -> usize {
        self.x
    }

    pub fn y(&self) -> usize {
        self.y
    }

    pub fn cost(&self) -> i32 {
        self.kind.cost()
    }

    /// Pending destroyed flag.
    pub fn is_destroyed(&self) -> bool {
        self.pending.destroyed
    }

    pub fn pending_state(&self) -> CellState {
        self.pending
    }

    pub fn committed_state(&self) -> CellState {
        self.committed
    }

    /// Whether neighbours may push heat into (or pull heat out of) this cell.
    pub fn can_store_heat(&self) -> bool {
        match self.variant {
            Variant::HeatVent { .. } | Variant::Exchanger { .. } | Variant::Coolant { .. } => true,
            Variant::Condensator { capacity } => self.pending.heat < capacity,
            _ => false,
        }
    }

    pub fn max_heat(&self) -> i32 {
        match self.variant {
            Variant::HeatVent { max_heat, .. }
            | Variant::Exchanger { max_heat, .. }
            | Variant::Coolant { max_heat } => max_heat,
            Variant::Condensator { capacity } => capacity,
            _ => 0,
        }
    }

    /// Visible stored heat. Condensators always report zero.
    pub fn current_heat(&self) -> i32 {
        match self.variant {
            Variant::HeatVent { .. } | Variant::Exchanger { .. } | Variant::Coolant { .. } => {
                self.pending.heat
            }
            _ => 0,
        }
    }

    /// Condensator fill, zero for everything else.
    pub fn stored_coolant(&self) -> i32 {
        match self.variant {
            Variant::Condensator { .. } => self.pending.heat,
            _ => 0,
        }
    }

    pub fn usage(&self) -> i32 {
        self.pending.usage
    }

    /// Add `delta` to pending stored heat and report what could not be applied.
    ///
    /// Heat stores clamp at zero and return the unmet deficit; exceeding
    /// capacity leaves the store untouched, destroys the component (unless
    /// `suppress_destruction`), and returns `capacity - new_heat + 1`.
    /// Condensators absorb up to their remaining capacity. Every other kind
    /// hands the whole delta back.
    pub fn alter_heat(&mut self, delta: i32, suppress_destruction: bool) -> HeatChange {
        match self.variant {
            Variant::HeatVent { max_heat, .. }
            | Variant::Exchanger { max_heat, .. }
            | Variant::Coolant { max_heat } => {
                let new_heat = self.pending.heat + delta;
                if new_heat > max_heat {
                    let destroyed = self.mark_destroyed(suppress_destruction);
                    HeatChange {
                        residual: max_heat - new_heat + 1,
                        destroyed,
                    }
                } else if new_heat < 0 {
                    self.pending.heat = 0;
                    HeatChange::absorbed(new_heat)
                } else {
                    self.pending.heat = new_heat;
                    HeatChange::absorbed(0)
                }
            }
            Variant::Condensator { capacity } => {
                let accepted = (capacity - self.pending.heat).min(delta);
                self.pending.heat += accepted;
                HeatChange::absorbed(delta - accepted)
            }
            _ => HeatChange::absorbed(delta),
        }
    }

    /// Flag the component destroyed. Returns true only on the transition.
    pub(crate) fn mark_destroyed(&mut self, suppress: bool) -> bool {
        if suppress || self.pending.destroyed {
            return false;
        }
        self.pending.destroyed = true;
        true
    }

    /// Clear fuel/reflector usage and condensator fill, keeping heat.
    pub fn reset_usage(&mut self) {
        match self.variant {
            Variant::FuelCell { .. } | Variant::Reflector { .. } => {
                self.pending.usage = 0;
                self.committed.usage = 0;
            }
            Variant::Condensator { .. } => {
                self.pending.heat = 0;
                self.committed.heat = 0;
            }
            _ => {}
        }
    }

    pub fn commit(&mut self) {
        self.committed = self.pending;
    }

    pub fn rollback(&mut self) {
        self.pending = self.committed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(kind: ComponentKind) -> Component {
        Component::new(kind, 0, 0).unwrap()
    }

    #[test]
    fn empty_kind_builds_nothing() {
        assert!(Component::new(ComponentKind::Empty, 1, 1).is_none());
    }

    #[test]
    fn heat_store_absorbs_within_capacity() {
        let mut cell = make(ComponentKind::CoolantCell10k);
        let change = cell.alter_heat(500, false);
        assert_eq!(change, HeatChange::absorbed(0));
        assert_eq!(cell.current_heat(), 500);
    }

    #[test]
    fn heat_store_clamps_at_zero_and_returns_deficit() {
        let mut cell = make(ComponentKind::HeatVent);
        cell.alter_heat(4, false);
        let change = cell.alter_heat(-10, false);
        assert_eq!(change.residual, -6);
        assert_eq!(cell.current_heat(), 0);
    }

    #[test]
    fn overflow_destroys_and_leaves_store_untouched() {
        let mut cell = make(ComponentKind::CoolantCell10k);
        cell.alter_heat(9_999, false);
        let change = cell.alter_heat(5, false);
        assert!(change.destroyed);
        assert_eq!(change.residual, 10_000 - 10_004 + 1);
        assert_eq!(cell.current_heat(), 9_999);
        assert!(cell.is_destroyed());
    }

    #[test]
    fn exactly_full_is_not_overflow() {
        let mut cell = make(ComponentKind::HeatVent);
        let change = cell.alter_heat(1000, false);
        assert_eq!(change.residual, 0);
        assert!(!cell.is_destroyed());
    }

    #[test]
    fn suppressed_overflow_does_not_destroy() {
        let mut cell = make(ComponentKind::HeatVent);
        let change = cell.alter_heat(1500, true);
        assert!(!change.destroyed);
        assert!(!cell.is_destroyed());
        assert_eq!(cell.current_heat(), 0);
    }

    #[test]
    fn destruction_reported_once() {
        let mut cell = make(ComponentKind::HeatVent);
        assert!(cell.alter_heat(2000, false).destroyed);
        assert!(!cell.alter_heat(2000, false).destroyed);
    }

    #[test]
    fn condensator_hides_heat_and_returns_overflow() {
        let mut cell = make(ComponentKind::RshCondensator);
        assert!(cell.can_store_heat());
        let change = cell.alter_heat(25_000, false);
        assert_eq!(change.residual, 5_000);
        assert!(!change.destroyed);
        assert_eq!(cell.current_heat(), 0);
        assert_eq!(cell.stored_coolant(), 20_000);
        assert_eq!(cell.max_heat(), 20_000);
        assert!(!cell.can_store_heat());
        assert_eq!(cell.alter_heat(10, false).residual, 10);
    }

    #[test]
    fn non_storing_kinds_return_delta() {
        for kind in [
            ComponentKind::FuelCell,
            ComponentKind::NeutronReflector,
            ComponentKind::Plating,
            ComponentKind::ComponentHeatVent,
        ] {
            let mut cell = make(kind);
            assert!(!cell.can_store_heat());
            assert_eq!(cell.alter_heat(37, false).residual, 37);
            assert_eq!(cell.max_heat(), 0);
        }
    }

    #[test]
    fn rollback_restores_committed_state() {
        let mut cell = make(ComponentKind::CoolantCell30k);
        cell.alter_heat(100, false);
        cell.commit();
        cell.alter_heat(50, false);
        cell.alter_heat(50, false);
        cell.mark_destroyed(false);
        cell.rollback();
        assert_eq!(cell.current_heat(), 100);
        assert!(!cell.is_destroyed());
    }

    #[test]
    fn reset_usage_clears_condensator_but_not_heat_stores() {
        let mut condensator = make(ComponentKind::LzhCondensator);
        condensator.alter_heat(300, false);
        condensator.commit();
        condensator.reset_usage();
        assert_eq!(condensator.stored_coolant(), 0);
        assert_eq!(condensator.committed_state().heat, 0);

        let mut coolant = make(ComponentKind::CoolantCell10k);
        coolant.alter_heat(300, false);
        coolant.reset_usage();
        assert_eq!(coolant.current_heat(), 300);
    }
}
