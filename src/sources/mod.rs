//! Bundled asset sources.
//!
//! Sources give read-only access to the files shipped with the host
//! application (backend sources and optional prebuilt libraries).

pub mod dir;
pub mod lazy;
pub mod source;
pub mod tarball;

use std::path::Path;

use anyhow::Result;

pub use dir::DirSource;
pub use lazy::LazyBundle;
pub use source::AssetSource;
pub use tarball::TarballSource;

/// Open the asset bundle at `path`: a `.tar.gz`/`.tgz` file or a directory.
pub fn open_bundle(path: &Path) -> Result<Box<dyn AssetSource>> {
    let name = path.to_string_lossy();
    if path.is_file() && (name.ends_with(".tar.gz") || name.ends_with(".tgz")) {
        Ok(Box::new(TarballSource::open(path)?))
    } else {
        Ok(Box::new(DirSource::new(path)))
    }
}
