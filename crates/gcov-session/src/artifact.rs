//! Coverage data artifact discovery
//!
//! Instrumented builds drop one `.gcda` file per compiled unit next to the
//! loadable module, e.g. `_ffi_test_stack.gcda`.

use crate::result::{SessionError, SessionResult};
use std::path::{Path, PathBuf};

/// Find coverage data artifacts in `dir` matching `pattern`, sorted by path
///
/// # Errors
///
/// Returns `Pattern` for an invalid glob and `Filesystem` if a matching
/// entry cannot be read
pub fn discover_artifacts(dir: &Path, pattern: &str) -> SessionResult<Vec<PathBuf>> {
    let base = glob::Pattern::escape(&dir.to_string_lossy());
    let full = format!("{base}/{pattern}");

    let mut found = Vec::new();
    for entry in glob::glob(&full)? {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            SessionError::filesystem(&path, e.into())
        })?;
        if path.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
