//! Specification file discovery.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Result, RetentionError};

/// Find files under `root` whose name ends with `suffix`.
///
/// A root that is itself a file is returned as a single-element list
/// regardless of suffix. Non-recursive mode lists only the immediate
/// directory. Results come back sorted for stable processing order.
pub fn find_spec_files(root: &Path, suffix: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let discovery_error = |source: std::io::Error| RetentionError::Discovery {
        path: root.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(root).map_err(discovery_error)?;
    if !metadata.is_dir() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    if recursive {
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|err| discovery_error(err.into()))?;
            if entry.file_type().is_file()
                && entry.file_name().to_string_lossy().ends_with(suffix)
            {
                files.push(entry.into_path());
            }
        }
    } else {
        for entry in fs::read_dir(root).map_err(discovery_error)? {
            let entry = entry.map_err(discovery_error)?;
            let file_type = entry.file_type().map_err(discovery_error)?;
            if file_type.is_file() && entry.file_name().to_string_lossy().ends_with(suffix) {
                files.push(entry.path());
            }
        }
    }

    files.sort();
    Ok(files)
}
