//! Removing materialized sources and libraries.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::{ArtifactPaths, BackendSpec};
use crate::util::fs::remove_file_if_exists;

/// What `clean` removed.
#[derive(Debug, Default)]
pub struct CleanResult {
    pub removed: Vec<PathBuf>,
    /// The application directory itself was removed once empty
    pub removed_dir: bool,
}

/// Remove every file acquisition of `backend` may have written to
/// `app_dir`, including temporaries left by an interrupted compile.
///
/// Other files in `app_dir` are left alone; the directory is removed only
/// when nothing else remains in it.
pub fn clean(app_dir: &Path, backend: &BackendSpec) -> Result<CleanResult> {
    let mut result = CleanResult::default();
    if !app_dir.is_dir() {
        return Ok(result);
    }

    let paths = ArtifactPaths::new(app_dir, backend);
    let mut targets: Vec<PathBuf> = backend
        .assets
        .iter()
        .map(|a| paths.source_file(a.file_name))
        .collect();
    targets.push(paths.library.clone());
    targets.extend(interrupted_outputs(&paths.library)?);

    for path in targets {
        if remove_file_if_exists(&path)
            .with_context(|| format!("failed to remove {}", path.display()))?
        {
            tracing::debug!("removed {}", path.display());
            result.removed.push(path);
        }
    }

    let empty = fs::read_dir(app_dir)
        .with_context(|| format!("failed to read directory: {}", app_dir.display()))?
        .next()
        .is_none();
    if empty {
        fs::remove_dir(app_dir)
            .with_context(|| format!("failed to remove directory: {}", app_dir.display()))?;
        result.removed_dir = true;
    }

    Ok(result)
}

/// `<library>.XXXXXX` siblings of `library`.
fn interrupted_outputs(library: &Path) -> Result<Vec<PathBuf>> {
    let (Some(dir), Some(name)) = (library.parent(), library.file_name()) else {
        return Ok(Vec::new());
    };
    let prefix = format!("{}.", name.to_string_lossy());

    let mut found = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read directory: {}", dir.display()))? {
        let entry = entry?;
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if let Some(suffix) = file_name.strip_prefix(&prefix) {
            if suffix.len() == 6 && suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
                found.push(entry.path());
            }
        }
    }
    Ok(found)
}
