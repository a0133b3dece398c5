//! Prebuilt library resolution.

use std::path::Path;

use crate::core::backend::dso_extension;
use crate::sources::AssetSource;

/// Archive path of a bundled prebuilt library, e.g. `ggml-sycl.so`.
pub fn prebuilt_archive_path(name: &str) -> String {
    format!("{}.{}", name, dso_extension())
}

/// Extract a bundled prebuilt library to `library`.
///
/// Returns `false` when no prebuilt is bundled or extraction fails;
/// a missing prebuilt is the normal case on most platforms.
pub fn extract_prebuilt(source: &dyn AssetSource, name: &str, library: &Path) -> bool {
    let archive_path = prebuilt_archive_path(name);
    if !source.exists(&archive_path) {
        tracing::info!("prebuilt binary {} not found", archive_path);
        return false;
    }

    match source.extract(&archive_path, library) {
        Ok(()) => {
            tracing::debug!("extracted prebuilt {} to {}", archive_path, library.display());
            true
        }
        Err(e) => {
            tracing::warn!("failed to extract {}: {}", archive_path, e);
            false
        }
    }
}
