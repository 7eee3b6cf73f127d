//! Cross-crate scenario tests live in `tests/`; layouts live in `fixtures/`.

use std::path::PathBuf;

/// Absolute path of a file under `fixtures/`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}
