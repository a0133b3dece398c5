//! AssetSource trait - read-only view of the bundled archive.

use std::io;
use std::path::Path;
use std::time::SystemTime;

/// A read-only store of bundled files, keyed by logical archive path.
///
/// Paths use `/` separators and are relative to the archive root
/// (e.g. `llama.cpp/ggml.h`).
pub trait AssetSource: Send + Sync {
    /// Get the source name for display.
    fn name(&self) -> &str;

    /// Make sure the source can be read. Sources opened lazily report a
    /// broken archive here.
    fn ready(&self) -> io::Result<()> {
        Ok(())
    }

    /// Check if an entry exists.
    fn exists(&self, archive_path: &str) -> bool;

    /// Modification time recorded for an entry.
    fn modified(&self, archive_path: &str) -> io::Result<SystemTime>;

    /// Copy an entry to `dest`, replacing it atomically.
    fn extract(&self, archive_path: &str, dest: &Path) -> io::Result<()>;
}

/// Error for an archive path that has no entry.
pub(crate) fn not_found(archive_path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no bundled asset at `{}`", archive_path),
    )
}
