//! The device grid: cells, aggregate counters, and transactional run state.

use serde::{Deserialize, Serialize};

use crate::component::Component;
use crate::error::LayoutError;
use crate::kind::ComponentKind;
use crate::limits::{BASE_WIDTH, GRID_HEIGHT, MAX_EXTRA_CHAMBERS, SimLimits};

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// The unit of commit/rollback at the device level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    /// Ticks run so far.
    pub tick: u32,
    /// Core heat reached max heat at some point. Never cleared by ticking.
    pub meltdown: bool,
    /// Some component was destroyed while failures were being reported.
    pub component_failed: bool,
    /// Energy generated since the last reset.
    pub eu_generated: i64,
    /// Core heat plus every present component's visible heat.
    pub total_heat: i32,
    /// Heat held by the device core itself.
    pub core_heat: i32,
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

/// A `width` x 6 grid of optional components with committed and pending
/// run state.
///
/// Cloning a device deep-copies every component, so clones share nothing
/// and can run divergent simulations (or run on other threads).
#[derive(Debug, Clone)]
pub struct Device {
    width: usize,
    height: usize,
    extra_chambers: usize,
    cells: Vec<Option<Component>>,
    max_heat: i32,
    suppress_failures: bool,
    fuel_units: u32,
    uses_single_use_coolant: bool,
    committed: RunState,
    pending: RunState,
    limits: SimLimits,
}

impl Device {
    /// Create an empty device with `extra_chambers` columns beyond the base three.
    pub fn new(extra_chambers: usize) -> Result<Self, LayoutError> {
        if extra_chambers > MAX_EXTRA_CHAMBERS {
            return Err(LayoutError::ChamberCount(extra_chambers));
        }
        let width = BASE_WIDTH + extra_chambers;
        let limits = SimLimits::default();
        Ok(Self {
            width,
            height: GRID_HEIGHT,
            extra_chambers,
            cells: vec![None; width * GRID_HEIGHT],
            max_heat: limits.base_max_heat,
            suppress_failures: false,
            fuel_units: 0,
            uses_single_use_coolant: false,
            committed: RunState::default(),
            pending: RunState::default(),
            limits,
        })
    }

    /// Build a device from a row-major kind list sized exactly width x height.
    pub fn from_kinds(extra_chambers: usize, kinds: &[ComponentKind]) -> Result<Self, LayoutError> {
        let mut device = Self::new(extra_chambers)?;
        let expected = device.width * device.height;
        if kinds.len() != expected {
            return Err(LayoutError::CellCount {
                actual: kinds.len(),
                expected,
                width: device.width,
            });
        }
        for (i, &kind) in kinds.iter().enumerate() {
            device.set(i % device.width, i / device.width, kind);
        }
        Ok(device)
    }

    /// Build a device from a flat list, inferring the chamber count from its length.
    pub fn from_flat(kinds: &[ComponentKind]) -> Result<Self, LayoutError> {
        let extra = Self::extra_chambers_for_len(kinds.len())?;
        Self::from_kinds(extra, kinds)
    }

    /// The chamber count whose grid holds exactly `len` cells.
    pub fn extra_chambers_for_len(len: usize) -> Result<usize, LayoutError> {
        let min = BASE_WIDTH * GRID_HEIGHT;
        let max = (BASE_WIDTH + MAX_EXTRA_CHAMBERS) * GRID_HEIGHT;
        if len % GRID_HEIGHT != 0 || !(min..=max).contains(&len) {
            return Err(LayoutError::FlatLength(len));
        }
        Ok(len / GRID_HEIGHT - BASE_WIDTH)
    }

    /// Replace this device's limits. The current max heat follows the new base.
    pub fn with_limits(mut self, limits: SimLimits) -> Self {
        self.set_limits(limits);
        self
    }

    pub fn set_limits(&mut self, limits: SimLimits) {
        self.limits = limits;
        self.max_heat = limits.base_max_heat;
    }

    pub fn limits(&self) -> &SimLimits {
        &self.limits
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn extra_chambers(&self) -> usize {
        self.extra_chambers
    }

    // -- Cells --

    /// Row-major index for an in-bounds coordinate.
    pub fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Place a fresh component of `kind` (or clear the cell for `Empty`).
    /// Out-of-bounds coordinates are ignored.
    pub fn set(&mut self, x: usize, y: usize, kind: ComponentKind) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = Component::new(kind, x, y);
        }
    }

    pub fn clear(&mut self, x: usize, y: usize) {
        self.set(x, y, ComponentKind::Empty);
    }

    /// All cells in row-major order, including destroyed components that
    /// have not been committed away yet.
    pub fn cells(&self) -> &[Option<Component>] {
        &self.cells
    }

    /// The component at a coordinate, destroyed or not.
    pub fn cell(&self, x: usize, y: usize) -> Option<&Component> {
        self.index(x, y).and_then(|i| self.cells[i].as_ref())
    }

    /// The live component at a coordinate: present and not destroyed.
    pub fn get(&self, x: usize, y: usize) -> Option<&Component> {
        self.cell(x, y).filter(|c| !c.is_destroyed())
    }

    /// The kind in every cell, row-major, `Empty` for vacant cells.
    pub fn kinds(&self) -> Vec<ComponentKind> {
        self.cells
            .iter()
            .map(|c| c.as_ref().map_or(ComponentKind::Empty, Component::kind))
            .collect()
    }

    pub(crate) fn component(&self, index: usize) -> Option<&Component> {
        self.cells[index].as_ref()
    }

    pub(crate) fn component_mut(&mut self, index: usize) -> Option<&mut Component> {
        self.cells[index].as_mut()
    }

    pub(crate) fn is_live(&self, index: usize) -> bool {
        self.cells[index].as_ref().is_some_and(|c| !c.is_destroyed())
    }

    /// Live orthogonal neighbours of `(x, y)` in left, right, above, below order.
    pub fn neighbors(&self, x: usize, y: usize) -> [Option<usize>; 4] {
        let live = |nx: Option<usize>, ny: Option<usize>| {
            let i = self.index(nx?, ny?)?;
            self.is_live(i).then_some(i)
        };
        [
            live(x.checked_sub(1), Some(y)),
            live(x.checked_add(1), Some(y)),
            live(Some(x), y.checked_sub(1)),
            live(Some(x), y.checked_add(1)),
        ]
    }

    // -- Heat and energy --

    pub fn core_heat(&self) -> i32 {
        self.pending.core_heat
    }

    /// Set core heat, flagging meltdown once it reaches max heat.
    pub fn set_core_heat(&mut self, heat: i32) {
        self.pending.core_heat = heat;
        if self.pending.core_heat >= self.max_heat {
            self.pending.meltdown = true;
        }
    }

    pub fn add_core_heat(&mut self, heat: i32) {
        self.set_core_heat(self.pending.core_heat + heat);
    }

    /// Current core heat capacity, including this tick's plating bonuses.
    pub fn max_heat(&self) -> i32 {
        self.max_heat
    }

    pub(crate) fn reset_max_heat(&mut self) {
        self.max_heat = self.limits.base_max_heat;
    }

    pub(crate) fn raise_max_heat(&mut self, bonus: i32) {
        self.max_heat += bonus;
    }

    pub(crate) fn generate_eu(&mut self, eu: i64) {
        self.pending.eu_generated += eu;
    }

    /// Apply `delta` to the component at `index`, reporting any destruction.
    /// Vacant cells hand the whole delta back.
    pub(crate) fn alter_cell_heat(&mut self, index: usize, delta: i32) -> i32 {
        let suppress = self.suppress_failures;
        let Some(component) = self.cells[index].as_mut() else {
            return delta;
        };
        let change = component.alter_heat(delta, suppress);
        if change.destroyed {
            self.pending.component_failed = true;
        }
        change.residual
    }

    /// Apply `delta` to the component at a coordinate and return the residual,
    /// or `None` if the cell is vacant or out of bounds.
    pub fn alter_heat_at(&mut self, x: usize, y: usize, delta: i32) -> Option<i32> {
        let index = self.index(x, y)?;
        self.cells[index].as_ref()?;
        Some(self.alter_cell_heat(index, delta))
    }

    /// Mark the component at `index` destroyed, reporting the failure.
    pub(crate) fn destroy_cell(&mut self, index: usize) {
        let suppress = self.suppress_failures;
        if let Some(component) = self.cells[index].as_mut() {
            if component.mark_destroyed(suppress) {
                self.pending.component_failed = true;
            }
        }
    }

    /// Recompute total heat from the core and every present component.
    pub(crate) fn recompute_total_heat(&mut self) {
        let components: i32 = self
            .cells
            .iter()
            .flatten()
            .map(Component::current_heat)
            .sum();
        self.pending.total_heat = self.pending.core_heat + components;
    }

    // -- Failure reporting --

    /// When set, components in this device are never destroyed and no
    /// component failure is reported.
    pub fn set_suppress_failures(&mut self, suppress: bool) {
        self.suppress_failures = suppress;
    }

    pub fn suppress_failures(&self) -> bool {
        self.suppress_failures
    }

    // -- Run state --

    pub fn committed(&self) -> &RunState {
        &self.committed
    }

    pub fn pending(&self) -> &RunState {
        &self.pending
    }

    pub(crate) fn pending_mut(&mut self) -> &mut RunState {
        &mut self.pending
    }

    /// Promote pending state to committed, dropping destroyed components.
    pub fn commit(&mut self) {
        self.committed = self.pending;
        for cell in &mut self.cells {
            if let Some(component) = cell {
                component.commit();
                if component.is_destroyed() {
                    *cell = None;
                }
            }
        }
    }

    /// Discard pending state for the device and every component.
    pub fn rollback(&mut self) {
        self.pending = self.committed;
        for component in self.cells.iter_mut().flatten() {
            component.rollback();
        }
    }

    /// Reset run state and recount fuel and single-use coolant.
    pub fn initialize_simulation(&mut self) {
        self.committed = RunState::default();
        self.pending = RunState::default();
        self.max_heat = self.limits.base_max_heat;

        self.fuel_units = 0;
        self.uses_single_use_coolant = false;
        for component in self.cells.iter().flatten() {
            self.fuel_units += component.kind().fuel_units();
            self.uses_single_use_coolant |= component.kind().is_single_use_coolant();
        }
    }

    /// Fuel-equivalent units counted by the last `initialize_simulation`.
    pub fn fuel_units(&self) -> u32 {
        self.fuel_units
    }

    pub fn uses_single_use_coolant(&self) -> bool {
        self.uses_single_use_coolant
    }

    /// Remove every fuel cell from the grid.
    pub fn remove_fuel(&mut self) {
        for cell in &mut self.cells {
            if cell.as_ref().is_some_and(|c| c.kind().is_fuel()) {
                *cell = None;
            }
        }
    }

    /// Clear fuel, reflector, and condensator usage plus the tick and energy
    /// counters, keeping all heat. Pending state becomes the committed state.
    pub fn reset_usage(&mut self) {
        for component in self.cells.iter_mut().flatten() {
            component.reset_usage();
        }
        self.committed.tick = 0;
        self.committed.eu_generated = 0;
        self.pending = self.committed;
    }

    /// Sum of component costs.
    pub fn total_cost(&self) -> i32 {
        self.cells.iter().flatten().map(Component::cost).sum()
    }
}
