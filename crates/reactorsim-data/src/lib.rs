//! Layout files for the reactorsim engine.
//!
//! Two-letter component codes, the whitespace-separated text grid, a
//! diagnostic heat dump, and layout documents in RON, TOML, or JSON.

pub mod codes;
pub mod grid;
pub mod loader;
pub mod schema;

pub use codes::{code, parse_code};
pub use grid::{Layout, format_device, format_layout, parse_grid};
pub use loader::{DataLoadError, Format, LoadedLayout, detect_format, load_layout};
pub use schema::LayoutDocument;
