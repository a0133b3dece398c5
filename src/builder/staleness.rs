//! Staleness checks by modification time.
//!
//! A derived artifact is stale when its reference is strictly newer. A
//! missing derived artifact counts as stale; a reference that cannot be
//! stat-ed is an error.

use std::io;
use std::path::Path;
use std::time::SystemTime;

use crate::sources::AssetSource;
use crate::util::fs::modified;

/// Outcome of comparing a reference against a derived artifact.
#[derive(Debug)]
pub enum Staleness {
    /// The derived artifact is missing or older than the reference.
    ReferenceNewer,
    /// The derived artifact is up to date.
    DerivedNewerOrEqual,
    /// The reference could not be stat-ed.
    Error(io::Error),
}

impl Staleness {
    /// Compare a reference timestamp against a derived file on disk.
    pub fn compare(reference: io::Result<SystemTime>, derived: &Path) -> Self {
        let reference = match reference {
            Ok(t) => t,
            Err(e) => return Staleness::Error(e),
        };

        match modified(derived) {
            Ok(derived) if derived >= reference => Staleness::DerivedNewerOrEqual,
            Ok(_) => Staleness::ReferenceNewer,
            Err(_) => Staleness::ReferenceNewer,
        }
    }

    /// Compare two files on disk.
    pub fn of_files(reference: &Path, derived: &Path) -> Self {
        Self::compare(modified(reference), derived)
    }

    /// Compare a bundled asset against its materialized copy.
    pub fn of_asset(source: &dyn AssetSource, archive_path: &str, derived: &Path) -> Self {
        Self::compare(source.modified(archive_path), derived)
    }

    /// Check if the derived artifact must be regenerated.
    pub fn is_stale(&self) -> bool {
        matches!(self, Staleness::ReferenceNewer)
    }
}
