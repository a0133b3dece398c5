//! Native dynamic loader backed by `libloading`.

use std::ffi::c_void;
use std::path::Path;

use libloading::Library;

use crate::core::SymbolLookup;
use crate::linker::{DynamicLoader, LoadedModule};

/// Opens shared objects with the platform loader.
///
/// On Unix the library is opened with `RTLD_LAZY`, so unresolved
/// references inside it only fail when first called.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeLoader;

struct NativeModule {
    lib: Library,
}

impl SymbolLookup for NativeModule {
    fn symbol(&self, name: &str) -> Option<*const c_void> {
        // SAFETY: the address is only reinterpreted by `SymbolTable::bind`
        // with the signature the backend headers declare.
        let sym = unsafe { self.lib.get::<*const c_void>(name.as_bytes()) }.ok()?;
        let ptr = *sym;
        (!ptr.is_null()).then_some(ptr)
    }
}

impl LoadedModule for NativeModule {}

impl DynamicLoader for NativeLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn LoadedModule>, String> {
        let lib = open_lazy(path).map_err(|e| e.to_string())?;
        Ok(Box::new(NativeModule { lib }))
    }
}

#[cfg(unix)]
fn open_lazy(path: &Path) -> Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_LAZY, RTLD_LOCAL};

    // SAFETY: running the library's initializers is the point of loading it.
    unsafe { UnixLibrary::open(Some(path), RTLD_LAZY | RTLD_LOCAL) }.map(Library::from)
}

#[cfg(not(unix))]
fn open_lazy(path: &Path) -> Result<Library, libloading::Error> {
    // SAFETY: as above.
    unsafe { Library::new(path) }
}
