//! Two-letter codes for every component kind.

use reactorsim_core::ComponentKind;

/// Code for each kind, indexed by discriminant.
const CODES: [&str; 23] = [
    "XX", // Empty
    "VV", "VR", "VA", "VC", "VO", // vents
    "EE", "EA", "ER", "EC", // exchangers
    "C1", "C3", "C6", // coolant cells
    "CR", "CL", // condensators
    "U1", "U2", "U4", // fuel cells
    "NN", "NT", // reflectors
    "PP", "PC", "PH", // platings
];

/// The code for `kind`.
pub fn code(kind: ComponentKind) -> &'static str {
    CODES[kind.index() as usize]
}

/// The kind for a code, or `None` if the code is unknown.
pub fn parse_code(code: &str) -> Option<ComponentKind> {
    CODES
        .iter()
        .position(|&c| c == code)
        .map(|i| ComponentKind::ALL[i])
}

/// Every code in discriminant order, starting with the empty cell.
pub fn all_codes() -> impl Iterator<Item = &'static str> {
    CODES.iter().copied()
}
