//! The closed set of component kinds and their fixed parameters.

use serde::{Deserialize, Serialize};

/// Every kind of cell a device grid can hold, including the empty cell.
///
/// The discriminants are stable and double as the wire representation used
/// by bindings that pass kinds as small integers.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComponentKind {
    #[default]
    Empty = 0,

    HeatVent = 1,
    ReactorHeatVent = 2,
    AdvancedHeatVent = 3,
    ComponentHeatVent = 4,
    OverclockedHeatVent = 5,

    HeatExchanger = 6,
    AdvancedHeatExchanger = 7,
    CoreHeatExchanger = 8,
    ComponentHeatExchanger = 9,

    CoolantCell10k = 10,
    CoolantCell30k = 11,
    CoolantCell60k = 12,

    RshCondensator = 13,
    LzhCondensator = 14,

    FuelCell = 15,
    DualFuelCell = 16,
    QuadFuelCell = 17,

    NeutronReflector = 18,
    ThickNeutronReflector = 19,

    Plating = 20,
    ContainmentPlating = 21,
    HeatCapacityPlating = 22,
}

/// Behavioural family of a non-empty kind, with that kind's parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Drains up to `core_draw` from the core, then dissipates `dissipation`.
    HeatVent {
        dissipation: i32,
        core_draw: i32,
        max_heat: i32,
    },
    /// Removes `per_neighbor` from every heat-storing orthogonal neighbour.
    SpreadingVent { per_neighbor: i32 },
    /// Equalises fill ratios with neighbours and/or the core.
    Exchanger {
        adjacent_rate: i32,
        core_rate: i32,
        max_heat: i32,
    },
    /// Plain heat store.
    Coolant { max_heat: i32 },
    /// Single-use heat sink that never reports stored heat.
    Condensator { capacity: i32 },
    /// Fuel with `sub_cells` internal cells.
    FuelCell { sub_cells: i32 },
    /// Accepts pulses; wears out in the heat phase.
    Reflector { durability: i32 },
    /// Raises the device's max heat every heat phase.
    Plating { heat_bonus: i32 },
}

/// Cost of any non-empty component.
pub const COMPONENT_COST: i32 = 2;

impl ComponentKind {
    /// Every kind in discriminant order.
    pub const ALL: [ComponentKind; 23] = [
        ComponentKind::Empty,
        ComponentKind::HeatVent,
        ComponentKind::ReactorHeatVent,
        ComponentKind::AdvancedHeatVent,
        ComponentKind::ComponentHeatVent,
        ComponentKind::OverclockedHeatVent,
        ComponentKind::HeatExchanger,
        ComponentKind::AdvancedHeatExchanger,
        ComponentKind::CoreHeatExchanger,
        ComponentKind::ComponentHeatExchanger,
        ComponentKind::CoolantCell10k,
        ComponentKind::CoolantCell30k,
        ComponentKind::CoolantCell60k,
        ComponentKind::RshCondensator,
        ComponentKind::LzhCondensator,
        ComponentKind::FuelCell,
        ComponentKind::DualFuelCell,
        ComponentKind::QuadFuelCell,
        ComponentKind::NeutronReflector,
        ComponentKind::ThickNeutronReflector,
        ComponentKind::Plating,
        ComponentKind::ContainmentPlating,
        ComponentKind::HeatCapacityPlating,
    ];

    /// Map a raw discriminant to a kind. Unknown values become `Empty`.
    pub fn from_index(index: u8) -> ComponentKind {
        Self::ALL
            .get(index as usize)
            .copied()
            .unwrap_or(ComponentKind::Empty)
    }

    /// The raw discriminant.
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn is_empty(self) -> bool {
        self == ComponentKind::Empty
    }

    /// Behaviour and parameters for this kind, or `None` for `Empty`.
    pub fn variant(self) -> Option<Variant> {
        use ComponentKind::*;
        let variant = match self {
            Empty => return None,

            HeatVent => Variant::HeatVent {
                dissipation: 6,
                core_draw: 0,
                max_heat: 1000,
            },
            ReactorHeatVent => Variant::HeatVent {
                dissipation: 5,
                core_draw: 5,
                max_heat: 1000,
            },
            AdvancedHeatVent => Variant::HeatVent {
                dissipation: 12,
                core_draw: 0,
                max_heat: 1000,
            },
            OverclockedHeatVent => Variant::HeatVent {
                dissipation: 20,
                core_draw: 36,
                max_heat: 1000,
            },
            ComponentHeatVent => Variant::SpreadingVent { per_neighbor: 4 },

            HeatExchanger => Variant::Exchanger {
                adjacent_rate: 12,
                core_rate: 4,
                max_heat: 2500,
            },
            AdvancedHeatExchanger => Variant::Exchanger {
                adjacent_rate: 24,
                core_rate: 8,
                max_heat: 5000,
            },
            CoreHeatExchanger => Variant::Exchanger {
                adjacent_rate: 0,
                core_rate: 72,
                max_heat: 2500,
            },
            ComponentHeatExchanger => Variant::Exchanger {
                adjacent_rate: 36,
                core_rate: 0,
                max_heat: 5000,
            },

            CoolantCell10k => Variant::Coolant { max_heat: 10_000 },
            CoolantCell30k => Variant::Coolant { max_heat: 30_000 },
            CoolantCell60k => Variant::Coolant { max_heat: 60_000 },

            RshCondensator => Variant::Condensator { capacity: 20_000 },
            LzhCondensator => Variant::Condensator { capacity: 100_000 },

            FuelCell => Variant::FuelCell { sub_cells: 1 },
            DualFuelCell => Variant::FuelCell { sub_cells: 2 },
            QuadFuelCell => Variant::FuelCell { sub_cells: 4 },

            NeutronReflector => Variant::Reflector { durability: 10_000 },
            ThickNeutronReflector => Variant::Reflector { durability: 40_000 },

            Plating => Variant::Plating { heat_bonus: 1000 },
            ContainmentPlating => Variant::Plating { heat_bonus: 500 },
            HeatCapacityPlating => Variant::Plating { heat_bonus: 1700 },
        };
        Some(variant)
    }

    /// Fuel-equivalent units contributed by one cell of this kind.
    pub fn fuel_units(self) -> u32 {
        match self.variant() {
            Some(Variant::FuelCell { sub_cells }) => sub_cells as u32,
            _ => 0,
        }
    }

    pub fn is_fuel(self) -> bool {
        self.fuel_units() > 0
    }

    pub fn is_single_use_coolant(self) -> bool {
        matches!(self.variant(), Some(Variant::Condensator { .. }))
    }

    /// Build cost of one cell of this kind.
    pub fn cost(self) -> i32 {
        if self.is_empty() { 0 } else { COMPONENT_COST }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_in_discriminant_order() {
        for (i, kind) in ComponentKind::ALL.iter().enumerate() {
            assert_eq!(kind.index() as usize, i);
        }
    }

    #[test]
    fn unknown_index_is_empty() {
        assert_eq!(ComponentKind::from_index(23), ComponentKind::Empty);
        assert_eq!(ComponentKind::from_index(255), ComponentKind::Empty);
        assert_eq!(ComponentKind::from_index(17), ComponentKind::QuadFuelCell);
    }

    #[test]
    fn fuel_units_per_tier() {
        assert_eq!(ComponentKind::FuelCell.fuel_units(), 1);
        assert_eq!(ComponentKind::DualFuelCell.fuel_units(), 2);
        assert_eq!(ComponentKind::QuadFuelCell.fuel_units(), 4);
        assert_eq!(ComponentKind::NeutronReflector.fuel_units(), 0);
    }

    #[test]
    fn only_condensators_are_single_use() {
        let single_use: Vec<_> = ComponentKind::ALL
            .iter()
            .filter(|k| k.is_single_use_coolant())
            .collect();
        assert_eq!(
            single_use,
            vec![&ComponentKind::RshCondensator, &ComponentKind::LzhCondensator]
        );
    }

    #[test]
    fn empty_has_no_variant_or_cost() {
        assert!(ComponentKind::Empty.variant().is_none());
        assert_eq!(ComponentKind::Empty.cost(), 0);
        assert_eq!(ComponentKind::Plating.cost(), COMPONENT_COST);
    }
}
