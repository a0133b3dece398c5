//! Acquisition error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::gpu::GpuMode;

/// Failure while driving the backend compiler.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to create temporary output next to {}", path.display())]
    TempFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn `{}`", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for `{}`", program.display())]
    Wait {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("`{}` returned nonzero exit status{}", program.display(), code.map(|c| format!(" {}", c)).unwrap_or_default())]
    ExitStatus { program: PathBuf, code: Option<i32> },
}

/// Why a backend could not be acquired.
///
/// Everything except [`AcquireError::Excluded`] and
/// [`AcquireError::Preempted`] becomes fatal when the user forced this
/// backend; otherwise every variant degrades to "unavailable".
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("gpu mode `{mode}` excludes {backend}")]
    Excluded { backend: &'static str, mode: GpuMode },

    #[error("{backend} is preempted by a higher-priority backend")]
    Preempted { backend: &'static str },

    #[error("dynamic loading is not supported on this platform")]
    NoDynamicLoading,

    #[error("failed to create directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("asset bundle is unreadable")]
    Bundle {
        #[source]
        source: io::Error,
    },

    #[error("failed to extract `{archive_path}` to {}", dest.display())]
    Extraction {
        archive_path: String,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot stat {path}")]
    StalenessCheck {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("could not locate the `{compiler}` compiler")]
    CompilerNotFound { compiler: String },

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("failed to publish {}", path.display())]
    Publish {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no library at {} and prebuilt `{archive_path}` not bundled", library.display())]
    PrebuiltNotFound {
        library: PathBuf,
        archive_path: String,
    },

    #[error("failed to load {}: {message}", path.display())]
    Link { path: PathBuf, message: String },

    #[error("failed to import symbol `{symbol}`")]
    SymbolResolution { symbol: &'static str },

    #[error("no GPU devices found")]
    ProbeNegative,
}

impl AcquireError {
    /// Outcomes that never escalate, even when the backend was forced.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            AcquireError::Excluded { .. } | AcquireError::Preempted { .. }
        )
    }
}
