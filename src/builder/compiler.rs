//! Compiler driver.
//!
//! Locates the backend compiler and turns the materialized primary source
//! into a shared library. Output goes to a random sibling of the target
//! path and is renamed into place only after the compiler exits cleanly,
//! so concurrent readers (other threads or other processes) never observe
//! a half-written library.

use std::path::{Path, PathBuf};

use crate::core::{AcquireError, BackendSpec, CompileError, CompilerSpec};
use crate::util::fs::is_executable;
use crate::util::process::{find_executable, ProcessBuilder};

/// Find the backend compiler.
///
/// Search order:
/// 1. the configured override
/// 2. the executable name on `$PATH`
/// 3. `$<root_env>/bin/<name>` (an empty variable means "not installed")
/// 4. `<fallback_dir>/<name>` when the variable is unset
pub fn locate_compiler(spec: &CompilerSpec, configured: Option<&Path>) -> Option<PathBuf> {
    locate_with(
        spec,
        configured,
        &|key| std::env::var(key).ok(),
        &find_executable,
    )
}

fn locate_with(
    spec: &CompilerSpec,
    configured: Option<&Path>,
    env: &dyn Fn(&str) -> Option<String>,
    search_path: &dyn Fn(&str) -> Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = configured {
        if is_executable(path) {
            return Some(path.to_path_buf());
        }
        tracing::warn!("configured compiler not found: {}", path.display());
    }

    let name = spec.exe_name();
    if let Some(path) = search_path(&name) {
        return Some(path);
    }
    tracing::info!("{} not found on $PATH", name);

    let dir = match env(spec.root_env) {
        Some(root) if root.is_empty() => return None,
        Some(root) => Path::new(&root).join("bin"),
        None => {
            tracing::info!("${}/bin/{} does not exist", spec.root_env, name);
            PathBuf::from(spec.fallback_dir)
        }
    };

    let candidate = dir.join(&name);
    if is_executable(&candidate) {
        Some(candidate)
    } else {
        tracing::info!("{} does not exist", candidate.display());
        None
    }
}

/// Build the compiler command line for one compile.
pub fn compile_command(
    compiler: &Path,
    backend: &BackendSpec,
    source: &Path,
    output: &Path,
    lib_root: Option<&str>,
) -> ProcessBuilder {
    let mut cmd = ProcessBuilder::new(compiler).args(backend.flags.iter());
    if let Some(root) = lib_root.filter(|r| !r.is_empty()) {
        cmd = cmd.arg(format!("-L{}/lib", root));
    }
    cmd.arg("-o")
        .arg(output)
        .arg(source)
        .args(backend.libs.iter())
}

/// Compile `source` into `library`, publishing atomically.
///
/// On any failure `library` is left exactly as it was and the temporary
/// output is removed.
pub fn compile(
    compiler: &Path,
    backend: &BackendSpec,
    source: &Path,
    library: &Path,
) -> Result<(), AcquireError> {
    let dir = library
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = library
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| backend.name.to_string());

    // dropping `tmp` deletes the file, which covers every early return below
    let tmp = tempfile::Builder::new()
        .prefix(&format!("{}.", file_name))
        .rand_bytes(6)
        .tempfile_in(dir)
        .map_err(|source| CompileError::TempFile {
            path: library.to_path_buf(),
            source,
        })?
        .into_temp_path();

    tracing::info!("building {}...", backend.name);
    let lib_root = backend
        .compiler
        .lib_root_env
        .and_then(|key| std::env::var(key).ok());
    let cmd = compile_command(compiler, backend, source, &tmp, lib_root.as_deref());
    tracing::info!("{}", cmd.display_command());

    let child = cmd.spawn_scoped().map_err(|source| CompileError::Spawn {
        program: compiler.to_path_buf(),
        source,
    })?;
    let status = child.wait().map_err(|source| CompileError::Wait {
        program: compiler.to_path_buf(),
        source,
    })?;

    if !status.success() {
        tracing::warn!(
            "{} returned nonzero exit status",
            compiler.display()
        );
        return Err(CompileError::ExitStatus {
            program: compiler.to_path_buf(),
            code: status.code(),
        }
        .into());
    }

    tmp.persist(library).map_err(|e| AcquireError::Publish {
        path: library.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SYCL;
    use std::fs;
    use tempfile::TempDir;

    fn no_path(_: &str) -> Option<PathBuf> {
        None
    }

    #[test]
    fn test_compile_command_layout() {
        let cmd = compile_command(
            Path::new("/opt/bin/icpx"),
            &SYCL,
            Path::new("/app/ggml-sycl.cpp"),
            Path::new("/app/ggml-sycl.so.abc123"),
            Some("/opt/mkl"),
        );
        let args = cmd.get_args();
        assert_eq!(args[0], "-fsycl");
        assert!(args.iter().any(|a| a == "-L/opt/mkl/lib"));

        let o = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(args[o + 1], "/app/ggml-sycl.so.abc123");
        assert_eq!(args[o + 2], "/app/ggml-sycl.cpp");
        assert_eq!(&args[o + 3..], SYCL.libs);
    }

    #[test]
    fn test_compile_command_without_lib_root() {
        let cmd = compile_command(
            Path::new("icpx"),
            &SYCL,
            Path::new("a.cpp"),
            Path::new("a.so"),
            None,
        );
        assert!(!cmd
            .get_args()
            .iter()
            .any(|a| a.to_string_lossy().starts_with("-L")));
    }

    #[test]
    fn test_locate_prefers_path_search() {
        let found = locate_with(
            &SYCL.compiler,
            None,
            &|_| None,
            &|name| Some(PathBuf::from(format!("/usr/bin/{}", name))),
        );
        assert_eq!(found, Some(PathBuf::from(format!("/usr/bin/{}", SYCL.compiler.exe_name()))));
    }

    #[test]
    fn test_locate_empty_root_env_means_missing() {
        let found = locate_with(&SYCL.compiler, None, &|_| Some(String::new()), &no_path);
        assert_eq!(found, None);
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_via_root_env() {
        let tmp = TempDir::new().unwrap();
        let bin = tmp.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let exe = crate::test_support::write_script(&bin, &SYCL.compiler.exe_name(), "exit 0");

        let root = tmp.path().to_string_lossy().into_owned();
        let found = locate_with(&SYCL.compiler, None, &|_| Some(root.clone()), &no_path);
        assert_eq!(found, Some(exe));
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_configured_override() {
        let tmp = TempDir::new().unwrap();
        let exe = crate::test_support::write_script(tmp.path(), "my-icpx", "exit 0");
        let found = locate_with(&SYCL.compiler, Some(&exe), &|_| None, &no_path);
        assert_eq!(found, Some(exe));
    }

    #[cfg(unix)]
    #[test]
    fn test_compile_publishes_library() {
        let tmp = TempDir::new().unwrap();
        let compiler = crate::test_support::fake_compiler(tmp.path(), 0);
        let src = tmp.path().join("ggml-sycl.cpp");
        fs::write(&src, "// source").unwrap();
        let lib = tmp.path().join("ggml-sycl.so");

        compile(&compiler, &SYCL, &src, &lib).unwrap();
        assert_eq!(fs::read_to_string(&lib).unwrap(), "compiled\n");
        assert!(crate::test_support::temp_siblings(&lib).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_compile_leaves_target_untouched() {
        let tmp = TempDir::new().unwrap();
        // writes its output, then fails before the driver could publish it
        let compiler = crate::test_support::fake_compiler(tmp.path(), 1);
        let src = tmp.path().join("ggml-sycl.cpp");
        fs::write(&src, "// source").unwrap();
        let lib = tmp.path().join("ggml-sycl.so");
        fs::write(&lib, "previous build").unwrap();

        let err = compile(&compiler, &SYCL, &src, &lib).unwrap_err();
        assert!(matches!(
            err,
            AcquireError::Compile(CompileError::ExitStatus { code: Some(1), .. })
        ));
        assert_eq!(fs::read_to_string(&lib).unwrap(), "previous build");
        assert!(crate::test_support::temp_siblings(&lib).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_publish_failure_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let compiler = crate::test_support::fake_compiler(tmp.path(), 0);
        let src = tmp.path().join("ggml-sycl.cpp");
        fs::write(&src, "// source").unwrap();
        // a directory in the way of the rename
        let lib = tmp.path().join("ggml-sycl.so");
        fs::create_dir_all(lib.join("occupied")).unwrap();

        let err = compile(&compiler, &SYCL, &src, &lib).unwrap_err();
        assert!(matches!(err, AcquireError::Publish { ref path, .. } if path == &lib));
        assert!(lib.join("occupied").is_dir());
        assert!(crate::test_support::temp_siblings(&lib).is_empty());
    }

    #[test]
    fn test_spawn_failure_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("ggml-sycl.cpp");
        let lib = tmp.path().join("ggml-sycl.so");

        let err = compile(&tmp.path().join("no-such-icpx"), &SYCL, &src, &lib).unwrap_err();
        assert!(matches!(err, AcquireError::Compile(CompileError::Spawn { .. })));
        assert!(!lib.exists());
        assert!(crate::test_support::temp_siblings(&lib).is_empty());
    }
}
