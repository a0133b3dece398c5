//! Backend acquisition.
//!
//! Drives one attempt at making the backend available:
//!
//! ```text
//! NotAttempted -> MaterializingAssets -> {CheckingCache | Compiling}
//!              -> Linking -> Probing -> {Available | Unavailable}
//! ```
//!
//! Every failure is returned as an [`AcquireError`]; deciding whether a
//! failure is fatal belongs to the caller (see [`crate::ops::Accelerator`]).

use std::fmt;
use std::path::Path;

use crate::builder::{compile, extract_prebuilt, locate_compiler, materialize, Staleness};
use crate::core::backend::dynamic_loading_supported;
use crate::core::{AcquireError, Admission, ArtifactPaths, BackendSpec};
use crate::linker::{link, DynamicLoader, HostApi, LinkedBackend};
use crate::sources::AssetSource;
use crate::util::config::GpuConfig;

/// Acquisition state, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireState {
    NotAttempted,
    MaterializingAssets,
    CheckingCache,
    Compiling,
    Linking,
    Probing,
    Available,
    Unavailable,
}

/// How the library that was linked came to be on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// An up-to-date compiled library was reused.
    Cached,
    /// The library was compiled during this attempt.
    Compiled,
    /// Compilation is disabled and a library was already on disk.
    Existing,
    /// Compilation is disabled and the bundled prebuilt was extracted.
    Prebuilt,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Route::Cached => "cached",
            Route::Compiled => "compiled",
            Route::Existing => "existing",
            Route::Prebuilt => "prebuilt",
        };
        f.write_str(s)
    }
}

/// A successful acquisition.
#[derive(Debug)]
pub struct Acquired {
    pub backend: LinkedBackend,
    pub route: Route,
}

/// Everything one acquisition attempt reads.
pub struct Acquisition<'a> {
    pub backend: &'a BackendSpec,
    pub config: &'a GpuConfig,
    pub app_dir: &'a Path,
    pub assets: &'a dyn AssetSource,
    pub loader: &'a dyn DynamicLoader,
    pub host_api: HostApi,
    /// A higher-priority backend is already active
    pub preempted: bool,
}

impl Acquisition<'_> {
    /// Run the attempt to completion.
    pub fn run(&self) -> Result<Acquired, AcquireError> {
        let result = self.run_inner();
        match &result {
            Ok(acquired) => {
                trace_state(AcquireState::Available);
                tracing::debug!("{} available ({})", self.backend.name, acquired.route);
            }
            Err(e) => {
                trace_state(AcquireState::Unavailable);
                tracing::debug!("{} unavailable: {}", self.backend.name, e);
            }
        }
        result
    }

    fn run_inner(&self) -> Result<Acquired, AcquireError> {
        let backend = self.backend;
        trace_state(AcquireState::NotAttempted);

        if self.config.mode.admits(backend.mode) == Admission::Excluded {
            return Err(AcquireError::Excluded {
                backend: backend.name,
                mode: self.config.mode,
            });
        }
        if !dynamic_loading_supported() {
            return Err(AcquireError::NoDynamicLoading);
        }
        if self.preempted {
            return Err(AcquireError::Preempted {
                backend: backend.name,
            });
        }

        tracing::info!("initializing gpu module...");
        let paths = ArtifactPaths::new(self.app_dir, backend);

        trace_state(AcquireState::MaterializingAssets);
        self.assets
            .ready()
            .map_err(|source| AcquireError::Bundle { source })?;
        let materialized = materialize(self.assets, backend.assets, &paths)?;
        let needs_rebuild = self.config.recompile || materialized.any_refreshed;

        if self.config.nocompile {
            let route = if paths.library.exists() {
                Route::Existing
            } else if extract_prebuilt(self.assets, backend.name, &paths.library) {
                Route::Prebuilt
            } else {
                return Err(AcquireError::PrebuiltNotFound {
                    library: paths.library.clone(),
                    archive_path: crate::builder::prebuilt_archive_path(backend.name),
                });
            };
            return self.link(&paths.library, route);
        }

        if !needs_rebuild {
            trace_state(AcquireState::CheckingCache);
            match Staleness::of_files(&paths.primary_source, &paths.library) {
                Staleness::DerivedNewerOrEqual => return self.link(&paths.library, Route::Cached),
                Staleness::ReferenceNewer => {
                    tracing::debug!("{} is older than its source", paths.library.display());
                }
                Staleness::Error(source) => {
                    return Err(AcquireError::StalenessCheck {
                        path: paths.primary_source.display().to_string(),
                        source,
                    });
                }
            }
        }

        trace_state(AcquireState::Compiling);
        let compiler = locate_compiler(&backend.compiler, self.config.compiler.as_deref())
            .ok_or_else(|| AcquireError::CompilerNotFound {
                compiler: backend.compiler.exe_name(),
            })?;
        compile(&compiler, backend, &paths.primary_source, &paths.library)?;

        self.link(&paths.library, Route::Compiled)
    }

    fn link(&self, library: &Path, route: Route) -> Result<Acquired, AcquireError> {
        trace_state(AcquireState::Linking);
        let backend = link(self.loader, library, self.host_api, &self.backend.compiler)?;
        Ok(Acquired { backend, route })
    }
}

fn trace_state(state: AcquireState) {
    tracing::trace!(?state, "acquisition state");
}
