//! Lists the files of one directory, without descending into subdirectories.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::CompiledFilters;
use crate::error::{OrganizeError, OrganizeResult};

/// Returns the eligible files directly inside `dir`, sorted by path.
///
/// Directories, AppleDouble `._*` files and names rejected by `filters` are
/// left out. Entries whose metadata cannot be read are kept so extraction can
/// report them.
pub fn scan_directory(dir: &Path, filters: &CompiledFilters) -> OrganizeResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| OrganizeError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| OrganizeError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();

        if !filters.should_include(&name) {
            debug!(file = %name, "excluded by filter");
            continue;
        }
        if fs::metadata(&path).is_ok_and(|m| m.is_dir()) {
            continue;
        }
        files.push(path);
    }

    files.sort();
    Ok(files)
}
