//! Dynamic linking of the backend library.
//!
//! The loader is a seam: production code uses [`NativeLoader`], tests use
//! an in-memory loader that counts live handles. A module handle is owned
//! by exactly one value at a time and is released by dropping it, so every
//! failure path below unloads the library just by returning.

pub mod native;
pub mod probe;

use std::ffi::c_void;
use std::fmt;
use std::path::Path;

use crate::core::{AcquireError, CompilerSpec, SymbolLookup, SymbolTable};
use crate::util::process::find_executable;

pub use native::NativeLoader;
pub use probe::probe;

/// A loaded shared object. Dropping it unloads the library.
pub trait LoadedModule: SymbolLookup + Send + Sync {}

/// Opens shared objects.
pub trait DynamicLoader: Send + Sync {
    /// Open the library at `path`, returning the loader's diagnostic on failure.
    fn open(&self, path: &Path) -> Result<Box<dyn LoadedModule>, String>;
}

/// Opaque pointer to the host's backend-registration interface.
#[derive(Debug, Clone, Copy)]
pub struct HostApi(*const c_void);

// SAFETY: the host's registration interface is a process-global table of
// function pointers that is never mutated after startup.
unsafe impl Send for HostApi {}
unsafe impl Sync for HostApi {}

impl HostApi {
    /// Wrap a pointer supplied by the host.
    pub fn new(ptr: *const c_void) -> Self {
        HostApi(ptr)
    }

    /// A null interface, for hosts that do not register backends.
    pub fn null() -> Self {
        HostApi(std::ptr::null())
    }

    /// The raw pointer.
    pub fn as_ptr(&self) -> *const c_void {
        self.0
    }
}

impl Default for HostApi {
    fn default() -> Self {
        HostApi::null()
    }
}

/// A bound, probed backend library.
///
/// Owns the module handle for the rest of the process.
pub struct LinkedBackend {
    table: SymbolTable,
    _module: Box<dyn LoadedModule>,
}

impl LinkedBackend {
    /// The bound entry points.
    pub fn symbols(&self) -> &SymbolTable {
        &self.table
    }
}

impl fmt::Debug for LinkedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedBackend")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

/// Open `library`, bind every required symbol, then probe for devices.
///
/// The module is unloaded on a missing symbol and on a negative probe.
pub fn link(
    loader: &dyn DynamicLoader,
    library: &Path,
    api: HostApi,
    compiler: &CompilerSpec,
) -> Result<LinkedBackend, AcquireError> {
    tracing::info!("dynamically linking {}", library.display());

    let module = loader.open(library).map_err(|message| {
        tracing::warn!("{}: failed to load library", message);
        if cfg!(any(
            target_os = "linux",
            target_os = "freebsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        )) && find_executable(&compiler.exe_name()).is_none()
        {
            tracing::info!(
                "you need to install {} for gpu support",
                compiler.name
            );
        }
        AcquireError::Link {
            path: library.to_path_buf(),
            message,
        }
    })?;

    let table = SymbolTable::bind(&*module)?;

    if probe(&table, api) {
        tracing::info!("GPU support loaded");
        Ok(LinkedBackend {
            table,
            _module: module,
        })
    } else {
        tracing::info!("No GPU devices found");
        drop(module);
        Err(AcquireError::ProbeNegative)
    }
}
