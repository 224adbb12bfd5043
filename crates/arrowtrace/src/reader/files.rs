//! Input path expansion

use crate::error::{ArrowTraceError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Expands a path or glob pattern into the sorted list of matching files
///
/// An existing file is taken literally even when its name contains glob
/// metacharacters.
/// Fails with [`ArrowTraceError::NotFound`] when nothing matches.
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let literal = Path::new(pattern);
    let mut paths = if literal.is_file() {
        vec![literal.to_path_buf()]
    } else if is_glob(pattern) {
        let mut matched = Vec::new();
        for entry in glob::glob(pattern)? {
            let path = entry.map_err(std::io::Error::from)?;
            if path.is_file() {
                matched.push(path);
            }
        }
        matched
    } else {
        Vec::new()
    };

    if paths.is_empty() {
        return Err(ArrowTraceError::NotFound(pattern.to_string()));
    }

    paths.sort();
    debug!("Pattern {} matched {} files", pattern, paths.len());
    Ok(paths)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}
