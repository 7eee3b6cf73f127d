//! The tick engine: per-variant cell behaviour and the two-phase pipeline.

use crate::device::Device;
use crate::kind::Variant;
use crate::limits::{EU_PER_PULSE, FUEL_CELL_MAX_USAGE};

/// Half of a tick. Every live cell ticks once per phase, heat first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Thermal exchange, venting, fuel burn, plating bonus.
    Heat,
    /// Pulse-driven energy generation.
    Power,
}

/// `n(n+1)/2`.
fn triangular(n: i32) -> i32 {
    n * (n + 1) / 2
}

/// Fill ratio of a participant, 0 when its capacity is 0.
fn fill_ratio(current: i32, max: i32) -> f64 {
    if max <= 0 {
        0.0
    } else {
        f64::from(current) / f64::from(max)
    }
}

impl Device {
    /// Run one full tick: reset max heat, heat phase, power phase, then
    /// recompute total heat into pending state.
    pub fn run_tick(&mut self) {
        self.reset_max_heat();
        self.run_tick_phase(Phase::Heat);
        self.run_tick_phase(Phase::Power);
        self.recompute_total_heat();
    }

    /// Tick every live cell in row-major order.
    ///
    /// Liveness is checked as each cell is reached, so a cell destroyed
    /// earlier in the same phase does not tick.
    pub fn run_tick_phase(&mut self, phase: Phase) {
        for index in 0..self.cells().len() {
            if self.is_live(index) {
                self.tick_cell(index, phase);
            }
        }
    }

    fn tick_cell(&mut self, index: usize, phase: Phase) {
        let Some(component) = self.component(index) else {
            return;
        };
        let (x, y) = (component.x(), component.y());
        match component.variant() {
            Variant::HeatVent {
                dissipation,
                core_draw,
                ..
            } => {
                if phase == Phase::Heat {
                    self.tick_heat_vent(index, dissipation, core_draw);
                }
            }
            Variant::SpreadingVent { per_neighbor } => {
                if phase == Phase::Heat {
                    for neighbor in self.neighbors(x, y).into_iter().flatten() {
                        if self.component(neighbor).is_some_and(|c| c.can_store_heat()) {
                            self.alter_cell_heat(neighbor, -per_neighbor);
                        }
                    }
                }
            }
            Variant::Exchanger {
                adjacent_rate,
                core_rate,
                ..
            } => self.tick_exchanger(index, x, y, adjacent_rate, core_rate),
            Variant::FuelCell { sub_cells } => self.tick_fuel_cell(index, x, y, sub_cells, phase),
            Variant::Plating { heat_bonus } => {
                if phase == Phase::Heat {
                    self.raise_max_heat(heat_bonus);
                }
            }
            Variant::Coolant { .. } | Variant::Condensator { .. } | Variant::Reflector { .. } => {}
        }
    }

    fn tick_heat_vent(&mut self, index: usize, dissipation: i32, core_draw: i32) {
        if core_draw > 0 {
            let core = self.core_heat();
            let drained = core.min(core_draw);
            if self.alter_cell_heat(index, drained) > 0 {
                return;
            }
            self.set_core_heat(core - drained);
        }
        self.alter_cell_heat(index, -dissipation);
    }

    /// Pull this exchanger, the core, and heat-storing neighbours toward a
    /// common fill ratio, each link limited by its own rate.
    fn tick_exchanger(
        &mut self,
        index: usize,
        x: usize,
        y: usize,
        adjacent_rate: i32,
        core_rate: i32,
    ) {
        let Some(own) = self.component(index) else {
            return;
        };
        let mut target = fill_ratio(own.current_heat(), own.max_heat());
        let mut participants = 1;

        if core_rate > 0 {
            participants += 1;
            target += fill_ratio(self.core_heat(), self.max_heat());
        }

        let mut acceptors = Vec::with_capacity(4);
        if adjacent_rate > 0 {
            for neighbor in self.neighbors(x, y).into_iter().flatten() {
                if let Some(c) = self.component(neighbor).filter(|c| c.can_store_heat()) {
                    target += fill_ratio(c.current_heat(), c.max_heat());
                    acceptors.push(neighbor);
                }
            }
        }
        target /= f64::from(participants + acceptors.len() as i32);

        let mut own_delta = 0;
        for neighbor in acceptors {
            let Some(c) = self.component(neighbor) else {
                continue;
            };
            let desired = (target * f64::from(c.max_heat())) as i32 - c.current_heat();
            let transfer = desired.clamp(-adjacent_rate, adjacent_rate);
            own_delta -= transfer;
            own_delta += self.alter_cell_heat(neighbor, transfer);
        }

        if core_rate > 0 {
            let core = self.core_heat();
            let desired = (target * f64::from(self.max_heat())) as i32 - core;
            let transfer = desired.clamp(-core_rate, core_rate);
            own_delta -= transfer;
            self.set_core_heat(core + transfer);
        }

        self.alter_cell_heat(index, own_delta);
    }

    fn tick_fuel_cell(&mut self, index: usize, x: usize, y: usize, sub_cells: i32, phase: Phase) {
        if !self.fuel_cell_active(index) {
            return;
        }

        for _ in 0..sub_cells {
            let mut pulses = 1 + sub_cells / 2;
            match phase {
                Phase::Power => {
                    for _ in 0..pulses {
                        self.accept_pulse(index, phase);
                    }
                    self.pulse_neighbors(x, y, phase);
                }
                Phase::Heat => {
                    pulses += self.pulse_neighbors(x, y, phase);
                    let heat = 4 * triangular(pulses);
                    self.spread_fuel_heat(x, y, heat);
                }
            }
        }

        if phase == Phase::Heat {
            if let Some(component) = self.component_mut(index) {
                component.pending.usage += 1;
            }
        }
    }

    fn fuel_cell_active(&self, index: usize) -> bool {
        self.component(index)
            .is_some_and(|c| c.usage() <= FUEL_CELL_MAX_USAGE)
    }

    /// Offer one pulse to each live neighbour, returning how many accepted.
    fn pulse_neighbors(&mut self, x: usize, y: usize, phase: Phase) -> i32 {
        let mut accepted = 0;
        for neighbor in self.neighbors(x, y).into_iter().flatten() {
            if self.accept_pulse(neighbor, phase) {
                accepted += 1;
            }
        }
        accepted
    }

    /// Split `heat` across heat-storing neighbours, rolling each residual into
    /// the next share. Whatever is left goes to the core.
    fn spread_fuel_heat(&mut self, x: usize, y: usize, mut heat: i32) {
        let acceptors: Vec<usize> = self
            .neighbors(x, y)
            .into_iter()
            .flatten()
            .filter(|&n| self.component(n).is_some_and(|c| c.can_store_heat()))
            .collect();

        let count = acceptors.len() as i32;
        for (i, neighbor) in acceptors.into_iter().enumerate() {
            let share = heat / (count - i as i32);
            heat -= share;
            heat += self.alter_cell_heat(neighbor, share);
        }
        if heat > 0 {
            self.add_core_heat(heat);
        }
    }

    /// Offer a pulse to the cell at `index`.
    ///
    /// Active fuel cells accept and, in the power phase, generate energy.
    /// Reflectors always accept: energy in the power phase, wear in the heat
    /// phase (destroyed once wear exceeds durability).
    pub(crate) fn accept_pulse(&mut self, index: usize, phase: Phase) -> bool {
        let Some(component) = self.component(index) else {
            return false;
        };
        match component.variant() {
            Variant::FuelCell { .. } => {
                if !self.fuel_cell_active(index) {
                    return false;
                }
                if phase == Phase::Power {
                    self.generate_eu(EU_PER_PULSE);
                }
                true
            }
            Variant::Reflector { durability } => {
                match phase {
                    Phase::Power => self.generate_eu(EU_PER_PULSE),
                    Phase::Heat => {
                        let worn_out = match self.component_mut(index) {
                            Some(c) => {
                                c.pending.usage += 1;
                                c.pending.usage > durability
                            }
                            None => false,
                        };
                        if worn_out {
                            self.destroy_cell(index);
                        }
                    }
                }
                true
            }
            _ => false,
        }
    }
}
