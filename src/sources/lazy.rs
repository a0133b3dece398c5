//! Lazily opened bundle.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use crate::sources::{open_bundle, AssetSource};

/// A bundle that is opened on first use.
///
/// Indexing a tarball reads the whole archive, and a broken archive must
/// only surface once acquisition actually needs the assets. The outcome of
/// the first open is kept; a failure is reported again by every call.
pub struct LazyBundle {
    path: PathBuf,
    opened: OnceLock<Result<Box<dyn AssetSource>, String>>,
}

impl LazyBundle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LazyBundle {
            path: path.into(),
            opened: OnceLock::new(),
        }
    }

    /// Get the bundle path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn inner(&self) -> io::Result<&dyn AssetSource> {
        let opened = self
            .opened
            .get_or_init(|| open_bundle(&self.path).map_err(|e| format!("{:#}", e)));
        match opened {
            Ok(source) => Ok(source.as_ref()),
            Err(message) => Err(io::Error::new(io::ErrorKind::InvalidData, message.clone())),
        }
    }
}

impl fmt::Debug for LazyBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyBundle")
            .field("path", &self.path)
            .field("source", &self.name())
            .finish()
    }
}

impl AssetSource for LazyBundle {
    fn name(&self) -> &str {
        match self.opened.get() {
            Some(Ok(source)) => source.name(),
            Some(Err(_)) => "unreadable",
            None => "bundle",
        }
    }

    fn ready(&self) -> io::Result<()> {
        self.inner().map(|_| ())
    }

    fn exists(&self, archive_path: &str) -> bool {
        self.inner().is_ok_and(|s| s.exists(archive_path))
    }

    fn modified(&self, archive_path: &str) -> io::Result<SystemTime> {
        self.inner()?.modified(archive_path)
    }

    fn extract(&self, archive_path: &str, dest: &Path) -> io::Result<()> {
        self.inner()?.extract(archive_path, dest)
    }
}
