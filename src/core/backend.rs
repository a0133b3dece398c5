//! Backend descriptors.
//!
//! A [`BackendSpec`] names everything the loader needs to know about one
//! optional GPU backend: the sources bundled with the application, how to
//! find and drive its compiler, and what the resulting library is called.
//! The state machine in [`crate::ops::acquire`] only ever talks to a
//! descriptor, never to hard-coded names.

use crate::core::gpu::GpuMode;

/// One file that must be materialized before compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetDescriptor {
    /// Logical path inside the bundled archive
    pub archive_path: &'static str,
    /// File name inside the materialized source directory
    pub file_name: &'static str,
}

impl AssetDescriptor {
    /// Create a new asset descriptor.
    pub const fn new(archive_path: &'static str, file_name: &'static str) -> Self {
        AssetDescriptor {
            archive_path,
            file_name,
        }
    }
}

/// Where to look for a backend's compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerSpec {
    /// Executable base name (without `.exe`)
    pub name: &'static str,
    /// Environment variable naming an installation root with a `bin/` dir
    pub root_env: &'static str,
    /// Well-known installation `bin/` directory
    pub fallback_dir: &'static str,
    /// Environment variable naming a math library root added with `-L<root>/lib`
    pub lib_root_env: Option<&'static str>,
}

impl CompilerSpec {
    /// Platform-specific executable name.
    pub fn exe_name(&self) -> String {
        if cfg!(windows) {
            format!("{}.exe", self.name)
        } else {
            self.name.to_string()
        }
    }
}

/// Static description of an optional GPU backend.
#[derive(Debug, Clone, Copy)]
pub struct BackendSpec {
    /// Logical library name, e.g. `ggml-sycl`
    pub name: &'static str,
    /// The [`GpuMode`] that selects this backend exclusively
    pub mode: GpuMode,
    /// Files to materialize; the primary translation unit comes last
    pub assets: &'static [AssetDescriptor],
    /// Compiler location hints
    pub compiler: CompilerSpec,
    /// Compiler flags placed before `-o`
    pub flags: &'static [&'static str],
    /// Link libraries placed after the source file
    pub libs: &'static [&'static str],
}

impl BackendSpec {
    /// The primary translation unit (last asset).
    pub fn primary_source(&self) -> Option<&AssetDescriptor> {
        self.assets.last()
    }

    /// File name of the compiled library, e.g. `ggml-sycl.so`.
    pub fn library_file_name(&self) -> String {
        format!("{}.{}", self.name, dso_extension())
    }
}

/// The platform's native dynamic-library extension.
pub fn dso_extension() -> &'static str {
    if cfg!(windows) {
        "dll"
    } else if cfg!(target_os = "macos") {
        "dylib"
    } else {
        "so"
    }
}

/// Whether this platform can open shared objects at runtime.
pub fn dynamic_loading_supported() -> bool {
    !cfg!(target_os = "openbsd")
}

/// The ggml SYCL backend, built with Intel's `icpx`.
pub const SYCL: BackendSpec = BackendSpec {
    name: "ggml-sycl",
    mode: GpuMode::Sycl,
    assets: &[
        AssetDescriptor::new("llama.cpp/ggml.h", "ggml.h"),
        AssetDescriptor::new("llamafile/llamafile.h", "llamafile.h"),
        AssetDescriptor::new("llama.cpp/ggml-impl.h", "ggml-impl.h"),
        AssetDescriptor::new("llama.cpp/ggml-sycl.h", "ggml-sycl.h"),
        AssetDescriptor::new("llama.cpp/ggml-alloc.h", "ggml-alloc.h"),
        AssetDescriptor::new("llama.cpp/ggml-common.h", "ggml-common.h"),
        AssetDescriptor::new("llama.cpp/ggml-backend.h", "ggml-backend.h"),
        AssetDescriptor::new("llama.cpp/ggml-backend-impl.h", "ggml-backend-impl.h"),
        // must stay last
        AssetDescriptor::new("llama.cpp/ggml-sycl.cpp", "ggml-sycl.cpp"),
    ],
    compiler: CompilerSpec {
        name: "icpx",
        root_env: "CMPLR_ROOT",
        fallback_dir: "/opt/intel/oneapi/compiler/latest/bin",
        lib_root_env: Some("MKLROOT"),
    },
    flags: &[
        "-fsycl",
        "--shared",
        "-fPIC",
        "-DGGML_SYCL_F16",
        "-DNDEBUG",
        "-DGGML_BUILD=1",
        "-DGGML_SHARED=1",
        "-DGGML_MULTIPLATFORM",
        "-march=native",
        "-mtune=native",
        "-Wno-deprecated-declarations",
        "-Wno-write-strings",
        "-Wno-switch",
        "-g",
        "-O0",
    ],
    libs: &[
        "-lOpenCL",
        "-lmkl_core",
        "-lpthread",
        "-lmkl_sycl_blas",
        "-lmkl_intel_ilp64",
        "-lmkl_tbb_thread",
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_source_is_last() {
        let primary = SYCL.primary_source().unwrap();
        assert_eq!(primary.file_name, "ggml-sycl.cpp");
        assert!(SYCL.assets[..SYCL.assets.len() - 1]
            .iter()
            .all(|a| a.file_name.ends_with(".h")));
    }

    #[test]
    fn test_library_file_name() {
        let name = SYCL.library_file_name();
        assert!(name.starts_with("ggml-sycl."));
        assert!(name.ends_with(dso_extension()));
    }

    #[test]
    fn test_compiler_exe_name() {
        let exe = SYCL.compiler.exe_name();
        if cfg!(windows) {
            assert_eq!(exe, "icpx.exe");
        } else {
            assert_eq!(exe, "icpx");
        }
    }
}
