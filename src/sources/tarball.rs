//! Tarball source - bundled assets packed into a `.tar.gz`.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use crate::sources::source::{not_found, AssetSource};
use crate::util::fs::write_atomic;

#[derive(Debug, Clone)]
struct Entry {
    data: Vec<u8>,
    mtime: SystemTime,
}

/// Assets indexed in memory from a gzip-compressed tarball.
///
/// Only regular files are indexed. A leading `./` on entry names is
/// ignored so archives built with `tar -C dir .` work unchanged.
#[derive(Debug, Clone, Default)]
pub struct TarballSource {
    entries: HashMap<String, Entry>,
}

impl TarballSource {
    /// Index a tarball on disk.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open asset bundle: {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to read asset bundle: {}", path.display()))
    }

    /// Index a tarball from any reader.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut archive = Archive::new(GzDecoder::new(reader));
        let mut entries = HashMap::new();

        for entry in archive.entries().context("failed to read tarball entries")? {
            let mut entry = entry.context("failed to read tarball entry")?;
            if entry.header().entry_type() != EntryType::Regular {
                continue;
            }

            let name = entry
                .path()
                .context("failed to get entry path")?
                .to_string_lossy()
                .replace('\\', "/");
            let name = name.trim_start_matches("./").to_string();
            let mtime = UNIX_EPOCH + Duration::from_secs(entry.header().mtime().unwrap_or(0));

            // the header size is untrusted; let the buffer grow with what is read
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .with_context(|| format!("failed to read tarball entry `{}`", name))?;

            entries.insert(name, Entry { data, mtime });
        }

        tracing::debug!("indexed {} bundled assets", entries.len());
        Ok(TarballSource { entries })
    }

    /// Number of indexed files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the bundle holds no files.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, archive_path: &str) -> io::Result<&Entry> {
        self.entries
            .get(archive_path.trim_start_matches('/'))
            .ok_or_else(|| not_found(archive_path))
    }
}

impl AssetSource for TarballSource {
    fn name(&self) -> &str {
        "tarball"
    }

    fn exists(&self, archive_path: &str) -> bool {
        self.entry(archive_path).is_ok()
    }

    fn modified(&self, archive_path: &str) -> io::Result<SystemTime> {
        Ok(self.entry(archive_path)?.mtime)
    }

    fn extract(&self, archive_path: &str, dest: &Path) -> io::Result<()> {
        let entry = self.entry(archive_path)?;
        write_atomic(dest, &mut entry.data.as_slice())?;
        Ok(())
    }
}
