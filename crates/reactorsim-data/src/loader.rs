//! Layout loading: format detection, deserialization, and grid validation.
//!
//! Text grids (`.grid`, `.txt`) hold the rows directly. Documents (`.ron`,
//! `.toml`, `.json`) wrap the same rows in a [`LayoutDocument`] and may carry
//! simulation limit overrides.

use std::path::{Path, PathBuf};

use reactorsim_core::limits::{BASE_WIDTH, GRID_HEIGHT, MAX_EXTRA_CHAMBERS};
use reactorsim_core::{Device, LayoutError, SimLimits};
use tracing::debug;

use crate::grid::{Layout, parse_grid, parse_rows};
use crate::schema::LayoutDocument;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading a layout.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("line {line}: unknown component code '{token}'")]
    UnknownCode { line: usize, token: String },

    #[error("line {line}: row has {actual} cells, previous rows have {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("grid has {actual} rows, expected {height}", height = GRID_HEIGHT)]
    RowCount { actual: usize },

    #[error(
        "grid is {actual} cells wide, expected {min}..={max}",
        min = BASE_WIDTH,
        max = BASE_WIDTH + MAX_EXTRA_CHAMBERS
    )]
    Width { actual: usize },

    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported layout file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Grid,
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("grid" | "txt") => Ok(Format::Grid),
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Loading
// ===========================================================================

/// A validated layout plus the limits to simulate it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedLayout {
    pub layout: Layout,
    pub limits: SimLimits,
}

impl LoadedLayout {
    /// Build the device, carrying the loaded limits.
    pub fn to_device(&self) -> Result<Device, DataLoadError> {
        Ok(self.layout.to_device()?.with_limits(self.limits))
    }
}

/// Read and validate a layout file of any supported format.
pub fn load_layout(path: &Path) -> Result<LoadedLayout, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let loaded = parse_layout_str(&content, format, path)?;
    debug!(
        file = %path.display(),
        ?format,
        width = loaded.layout.width(),
        "layout loaded"
    );
    Ok(loaded)
}

/// Parse layout text already read from `path` (used only in error messages).
pub fn parse_layout_str(
    content: &str,
    format: Format,
    path: &Path,
) -> Result<LoadedLayout, DataLoadError> {
    let parse_error = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };

    let document: LayoutDocument = match format {
        Format::Grid => {
            return Ok(LoadedLayout {
                layout: parse_grid(content)?,
                limits: SimLimits::default(),
            });
        }
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string()))?,
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?,
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
    };

    Ok(LoadedLayout {
        layout: parse_rows(document.rows.iter().map(String::as_str))?,
        limits: document.limits.unwrap_or_default(),
    })
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use reactorsim_core::ComponentKind as K;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "reactorsim_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Clean up a test directory.
    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const ROWS: [&str; 6] = [
        "XX VV XX", "VV U1 VV", "XX VV XX", "XX XX XX", "XX XX XX", "XX XX XX",
    ];

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("a.grid")).unwrap(), Format::Grid);
        assert_eq!(detect_format(Path::new("a.txt")).unwrap(), Format::Grid);
        assert_eq!(detect_format(Path::new("a.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("a.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("a.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        for name in ["a.yaml", "a"] {
            assert!(matches!(
                detect_format(Path::new(name)),
                Err(DataLoadError::UnsupportedFormat { .. })
            ));
        }
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    #[test]
    fn json_document_with_limits() {
        let json = format!(
            r#"{{"rows": {}, "limits": {{"fuel_ticks": 200}}}}"#,
            serde_json::to_string(&ROWS).unwrap()
        );
        let loaded = parse_layout_str(&json, Format::Json, Path::new("a.json")).unwrap();
        assert_eq!(loaded.limits.fuel_ticks, 200);
        assert_eq!(loaded.limits.timeout_ticks, 50_000);
        assert_eq!(loaded.layout.kinds[4], K::FuelCell);
    }

    #[test]
    fn ron_document_without_limits() {
        let ron = format!(
            "(rows: [{}])",
            ROWS.iter().map(|r| format!("\"{r}\"")).collect::<Vec<_>>().join(", ")
        );
        let loaded = parse_layout_str(&ron, Format::Ron, Path::new("a.ron")).unwrap();
        assert_eq!(loaded.limits, SimLimits::default());
        assert_eq!(loaded.layout.extra_chambers, 0);
    }

    #[test]
    fn toml_document_with_limits_table() {
        let toml = format!(
            "rows = [{}]\n\n[limits]\ntimeout_ticks = 900\n",
            ROWS.iter().map(|r| format!("\"{r}\"")).collect::<Vec<_>>().join(", ")
        );
        let loaded = parse_layout_str(&toml, Format::Toml, Path::new("a.toml")).unwrap();
        assert_eq!(loaded.limits.timeout_ticks, 900);
        assert_eq!(loaded.limits.fuel_ticks, 10_000);
    }

    #[test]
    fn malformed_document_is_parse_error() {
        let result = parse_layout_str("not json", Format::Json, Path::new("bad.json"));
        match result {
            Err(DataLoadError::Parse { file, .. }) => assert_eq!(file, PathBuf::from("bad.json")),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn document_rows_are_validated() {
        let json = r#"{"rows": ["XX XX XX"]}"#;
        assert!(matches!(
            parse_layout_str(json, Format::Json, Path::new("a.json")),
            Err(DataLoadError::RowCount { actual: 1 })
        ));
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    #[test]
    fn load_grid_file_into_device() {
        let dir = make_test_dir("grid");
        let path = dir.join("vented.grid");
        fs::write(&path, ROWS.join("\n")).unwrap();

        let loaded = load_layout(&path).unwrap();
        let device = loaded.to_device().unwrap();
        assert_eq!(device.get(1, 1).unwrap().kind(), K::FuelCell);
        assert_eq!(device.limits(), &SimLimits::default());
        cleanup(&dir);
    }

    #[test]
    fn device_inherits_document_limits() {
        let dir = make_test_dir("limits");
        let path = dir.join("short.json");
        let json = format!(
            r#"{{"rows": {}, "limits": {{"fuel_ticks": 300, "base_max_heat": 5000}}}}"#,
            serde_json::to_string(&ROWS).unwrap()
        );
        fs::write(&path, json).unwrap();

        let device = load_layout(&path).unwrap().to_device().unwrap();
        assert_eq!(device.limits().fuel_ticks, 300);
        assert_eq!(device.max_heat(), 5000);
        cleanup(&dir);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = make_test_dir("missing");
        let result = load_layout(&dir.join("nope.grid"));
        assert!(matches!(result, Err(DataLoadError::Io(_))));
        cleanup(&dir);
    }

    #[test]
    fn error_display_messages() {
        let err = DataLoadError::RowCount { actual: 4 };
        assert_eq!(err.to_string(), "grid has 4 rows, expected 6");
        let err = DataLoadError::Width { actual: 12 };
        assert_eq!(err.to_string(), "grid is 12 cells wide, expected 3..=9");
        let err = DataLoadError::UnknownCode {
            line: 3,
            token: "QQ".into(),
        };
        assert_eq!(err.to_string(), "line 3: unknown component code 'QQ'");
        let err = DataLoadError::from(LayoutError::ChamberCount(8));
        assert_eq!(err.to_string(), "extra chamber count 8 is outside 0..=6");
    }
}
