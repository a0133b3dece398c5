//! Asset materialization.
//!
//! Copies the backend's bundled sources into the application directory,
//! skipping files whose on-disk copy is already at least as new as the
//! bundled entry.

use crate::builder::staleness::Staleness;
use crate::core::{AcquireError, ArtifactPaths, AssetDescriptor};
use crate::sources::AssetSource;
use crate::util::fs::ensure_dir;

/// Result of a successful materialization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Materialized {
    /// At least one file was (re)written
    pub any_refreshed: bool,
    /// Number of files copied
    pub copied: usize,
}

/// Ensure every asset exists under `paths.source_root`.
///
/// Assets are processed in order and the first failure aborts the whole
/// set. Because the primary translation unit is listed last, its presence
/// on disk implies all headers made it too.
pub fn materialize(
    source: &dyn AssetSource,
    assets: &[AssetDescriptor],
    paths: &ArtifactPaths,
) -> Result<Materialized, AcquireError> {
    ensure_dir(&paths.source_root).map_err(|source| AcquireError::CreateDir {
        path: paths.source_root.clone(),
        source,
    })?;

    let mut result = Materialized::default();
    for asset in assets {
        let dest = paths.source_file(asset.file_name);
        match Staleness::of_asset(source, asset.archive_path, &dest) {
            Staleness::DerivedNewerOrEqual => {
                tracing::trace!("{} is up to date", dest.display());
            }
            Staleness::ReferenceNewer => {
                tracing::debug!("extracting {} to {}", asset.archive_path, dest.display());
                source
                    .extract(asset.archive_path, &dest)
                    .map_err(|e| AcquireError::Extraction {
                        archive_path: asset.archive_path.to_string(),
                        dest: dest.clone(),
                        source: e,
                    })?;
                result.any_refreshed = true;
                result.copied += 1;
            }
            Staleness::Error(e) => {
                return Err(AcquireError::StalenessCheck {
                    path: asset.archive_path.to_string(),
                    source: e,
                });
            }
        }
    }

    Ok(result)
}
