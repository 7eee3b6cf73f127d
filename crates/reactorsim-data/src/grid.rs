//! Text grids: rows of whitespace-separated codes, top row first.
//!
//! ```text
//! XX VV XX
//! VV U1 VV
//! XX VV XX
//! XX XX XX
//! XX XX XX
//! XX XX XX
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::fmt::Write as _;

use reactorsim_core::limits::{BASE_WIDTH, GRID_HEIGHT, MAX_EXTRA_CHAMBERS};
use reactorsim_core::{ComponentKind, Device, LayoutError};

use crate::codes::{code, parse_code};
use crate::loader::DataLoadError;

/// A parsed grid, ready to become a [`Device`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub extra_chambers: usize,
    /// Row-major kinds, `(3 + extra_chambers) * 6` of them.
    pub kinds: Vec<ComponentKind>,
}

impl Layout {
    pub fn width(&self) -> usize {
        BASE_WIDTH + self.extra_chambers
    }

    /// Capture the kinds of an existing device.
    pub fn from_device(device: &Device) -> Self {
        Self {
            extra_chambers: device.extra_chambers(),
            kinds: device.kinds(),
        }
    }

    pub fn to_device(&self) -> Result<Device, LayoutError> {
        Device::from_kinds(self.extra_chambers, &self.kinds)
    }
}

/// Parse a text grid.
pub fn parse_grid(text: &str) -> Result<Layout, DataLoadError> {
    parse_rows(text.lines())
}

/// Parse rows of codes. Line numbers in errors are 1-based positions in `rows`.
pub fn parse_rows<'a, I>(rows: I) -> Result<Layout, DataLoadError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut kinds = Vec::new();
    let mut width = None;
    let mut row_count = 0;

    for (i, line) in rows.into_iter().enumerate() {
        let line_no = i + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut count = 0;
        for token in line.split_whitespace() {
            let kind = parse_code(token).ok_or_else(|| DataLoadError::UnknownCode {
                line: line_no,
                token: token.to_string(),
            })?;
            kinds.push(kind);
            count += 1;
        }

        match width {
            None => width = Some(count),
            Some(expected) if expected != count => {
                return Err(DataLoadError::RaggedRow {
                    line: line_no,
                    expected,
                    actual: count,
                });
            }
            Some(_) => {}
        }
        row_count += 1;
    }

    if row_count != GRID_HEIGHT {
        return Err(DataLoadError::RowCount { actual: row_count });
    }
    let width = width.unwrap_or(0);
    if !(BASE_WIDTH..=BASE_WIDTH + MAX_EXTRA_CHAMBERS).contains(&width) {
        return Err(DataLoadError::Width { actual: width });
    }

    Ok(Layout {
        extra_chambers: width - BASE_WIDTH,
        kinds,
    })
}

/// Format a layout as a text grid, one row per line.
pub fn format_layout(layout: &Layout) -> String {
    let mut out = String::new();
    for row in layout.kinds.chunks(layout.width()) {
        let codes: Vec<&str> = row.iter().map(|&k| code(k)).collect();
        out.push_str(&codes.join(" "));
        out.push('\n');
    }
    out
}

/// Diagnostic dump: `KK:hhhhh` per cell with five-digit zero-padded heat.
/// Vacant cells print as `XX:00000`.
pub fn format_device(device: &Device) -> String {
    let mut out = String::new();
    for row in device.cells().chunks(device.width()) {
        for (x, cell) in row.iter().enumerate() {
            if x > 0 {
                out.push(' ');
            }
            // Writing into a String cannot fail.
            let _ = match cell {
                Some(c) => write!(out, "{}:{:05}", code(c.kind()), c.current_heat()),
                None => write!(out, "XX:00000"),
            };
        }
        out.push('\n');
    }
    out
}
