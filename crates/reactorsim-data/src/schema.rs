//! Serde structs for layout documents.

use reactorsim_core::SimLimits;
use serde::Deserialize;

/// A layout document in RON, TOML, or JSON.
///
/// `rows` holds the same text a grid file would, one row per string.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutDocument {
    pub rows: Vec<String>,
    /// Overrides for the simulation thresholds. Missing fields keep their
    /// defaults.
    #[serde(default)]
    pub limits: Option<SimLimits>,
}
