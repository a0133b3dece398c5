//! Directory source - bundled assets unpacked on disk.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::sources::source::{not_found, AssetSource};
use crate::util::fs::{modified, write_atomic};

/// Assets read from a plain directory tree.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirSource { root: root.into() }
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, archive_path: &str) -> PathBuf {
        archive_path
            .split('/')
            .filter(|c| !c.is_empty() && *c != "." && *c != "..")
            .fold(self.root.clone(), |p, c| p.join(c))
    }
}

impl AssetSource for DirSource {
    fn name(&self) -> &str {
        "dir"
    }

    fn exists(&self, archive_path: &str) -> bool {
        self.resolve(archive_path).is_file()
    }

    fn modified(&self, archive_path: &str) -> io::Result<SystemTime> {
        let path = self.resolve(archive_path);
        if !path.is_file() {
            return Err(not_found(archive_path));
        }
        modified(&path)
    }

    fn extract(&self, archive_path: &str, dest: &Path) -> io::Result<()> {
        let mut file = File::open(self.resolve(archive_path)).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                not_found(archive_path)
            } else {
                e
            }
        })?;
        write_atomic(dest, &mut file)?;
        Ok(())
    }
}
