//! Paths derived for one acquisition attempt.

use std::path::{Path, PathBuf};

use crate::core::backend::BackendSpec;

/// Process-local locations of the materialized sources and the library.
///
/// The temporary publish path is not part of this struct: the compiler
/// driver creates a fresh random sibling of [`ArtifactPaths::library`] for
/// every compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Directory holding the materialized sources and the library
    pub source_root: PathBuf,
    /// Final location of the compiled or prebuilt library
    pub library: PathBuf,
    /// Materialized primary translation unit
    pub primary_source: PathBuf,
}

impl ArtifactPaths {
    /// Derive the paths for `backend` inside `app_dir`.
    pub fn new(app_dir: &Path, backend: &BackendSpec) -> Self {
        let primary = backend
            .primary_source()
            .map(|a| a.file_name)
            .unwrap_or_default();

        ArtifactPaths {
            source_root: app_dir.to_path_buf(),
            library: app_dir.join(backend.library_file_name()),
            primary_source: app_dir.join(primary),
        }
    }

    /// Destination of one materialized file.
    pub fn source_file(&self, file_name: &str) -> PathBuf {
        self.source_root.join(file_name)
    }
}
