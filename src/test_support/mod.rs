//! Test utilities and mocks for unit tests.
//!
//! Provides an in-process stand-in for the backend library (a table of
//! `extern "C"` functions), a loader that counts open handles, an asset
//! source that records what was asked of it, and helpers for building
//! fixtures on disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use accel_loader::test_support::{fake_exports, MockLoader};
//!
//! #[test]
//! fn test_example() {
//!     let loader = MockLoader::new(fake_exports(true));
//!     // link against any path, then inspect loader.live()...
//! }
//! ```

use std::cell::Cell;
use std::collections::HashMap;
use std::ffi::{c_char, c_int, c_void};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::core::{SymbolLookup, SYCL};
use crate::linker::{DynamicLoader, LoadedModule};
use crate::sources::{AssetSource, DirSource};

/// Devices reported by the fake backend.
pub const FAKE_DEVICE_COUNT: c_int = 2;

/// Device ids are device indices offset by this much.
pub const FAKE_DEVICE_ID_BASE: c_int = 100;

/// Free memory reported for every fake device.
pub const FAKE_FREE_MEMORY: usize = 1 << 30;

/// Total memory reported for every fake device.
pub const FAKE_TOTAL_MEMORY: usize = 4 << 30;

thread_local! {
    static DEVICE_MODE: Cell<Option<c_int>> = const { Cell::new(None) };
}

/// Last device mode selected on this thread: `Some(id)` for single-device
/// mode, `Some(-1)` for multi-device mode.
pub fn last_device_mode() -> Option<c_int> {
    DEVICE_MODE.with(|m| m.get())
}

unsafe extern "C" fn fake_reg_devices() -> c_int {
    FAKE_DEVICE_COUNT
}

unsafe extern "C" fn fake_link_found(_api: *const c_void) -> bool {
    true
}

unsafe extern "C" fn fake_link_none(_api: *const c_void) -> bool {
    false
}

unsafe extern "C" fn fake_backend_init(device: c_int) -> *mut c_void {
    (0x1000 + device as usize) as *mut c_void
}

unsafe extern "C" fn fake_buffer_type(device: c_int) -> *mut c_void {
    (0x2000 + device as usize) as *mut c_void
}

unsafe extern "C" fn fake_host_buffer_type() -> *mut c_void {
    0x3000 as *mut c_void
}

unsafe extern "C" fn fake_split_buffer_type(tensor_split: *const f32) -> *mut c_void {
    if tensor_split.is_null() {
        std::ptr::null_mut()
    } else {
        0x4000 as *mut c_void
    }
}

unsafe extern "C" fn fake_print_devices() {}

unsafe extern "C" fn fake_gpu_list(id_list: *mut c_int, max_len: c_int) {
    for i in 0..max_len {
        let id = if i < FAKE_DEVICE_COUNT {
            FAKE_DEVICE_ID_BASE + i
        } else {
            -1
        };
        *id_list.add(i as usize) = id;
    }
}

unsafe extern "C" fn fake_device_description(device: c_int, out: *mut c_char, size: usize) {
    if size == 0 {
        return;
    }
    let text = format!("Fake SYCL GPU {}", device);
    let n = text.len().min(size - 1);
    std::ptr::copy_nonoverlapping(text.as_ptr() as *const c_char, out, n);
    *out.add(n) = 0;
}

unsafe extern "C" fn fake_device_count() -> c_int {
    FAKE_DEVICE_COUNT
}

unsafe extern "C" fn fake_device_memory(_device: c_int, free: *mut usize, total: *mut usize) {
    *free = FAKE_FREE_MEMORY;
    *total = FAKE_TOTAL_MEMORY;
}

unsafe extern "C" fn fake_device_index(device_id: c_int) -> c_int {
    device_id - FAKE_DEVICE_ID_BASE
}

unsafe extern "C" fn fake_device_id(device_index: c_int) -> c_int {
    device_index + FAKE_DEVICE_ID_BASE
}

unsafe extern "C" fn fake_set_single_device_mode(main_gpu_id: c_int) {
    DEVICE_MODE.with(|m| m.set(Some(main_gpu_id)));
}

unsafe extern "C" fn fake_set_mul_device_mode() {
    DEVICE_MODE.with(|m| m.set(Some(-1)));
}

/// Symbol table of an in-process fake backend.
///
/// Addresses are stored as integers so the table can cross threads.
#[derive(Debug, Clone)]
pub struct FakeExports {
    symbols: HashMap<&'static str, usize>,
}

impl FakeExports {
    /// Remove one export.
    pub fn without(mut self, name: &str) -> Self {
        self.symbols.remove(name);
        self
    }
}

impl SymbolLookup for FakeExports {
    fn symbol(&self, name: &str) -> Option<*const c_void> {
        self.symbols.get(name).map(|&addr| addr as *const c_void)
    }
}

/// A complete fake backend. `devices_found` is what its probe answers.
pub fn fake_exports(devices_found: bool) -> FakeExports {
    let link = if devices_found {
        fake_link_found as *const () as usize
    } else {
        fake_link_none as *const () as usize
    };

    let symbols = HashMap::from([
        ("ggml_backend_sycl_reg_devices", fake_reg_devices as *const () as usize),
        ("ggml_sycl_link", link),
        ("ggml_backend_sycl_init", fake_backend_init as *const () as usize),
        ("ggml_backend_sycl_buffer_type", fake_buffer_type as *const () as usize),
        ("ggml_backend_sycl_host_buffer_type", fake_host_buffer_type as *const () as usize),
        ("ggml_backend_sycl_split_buffer_type", fake_split_buffer_type as *const () as usize),
        ("ggml_backend_sycl_print_sycl_devices", fake_print_devices as *const () as usize),
        ("ggml_sycl_get_gpu_list", fake_gpu_list as *const () as usize),
        ("ggml_sycl_get_device_description", fake_device_description as *const () as usize),
        ("ggml_backend_sycl_get_device_count", fake_device_count as *const () as usize),
        ("ggml_backend_sycl_get_device_memory", fake_device_memory as *const () as usize),
        ("ggml_backend_sycl_get_device_index", fake_device_index as *const () as usize),
        ("ggml_backend_sycl_get_device_id", fake_device_id as *const () as usize),
        (
            "ggml_backend_sycl_set_single_device_mode",
            fake_set_single_device_mode as *const () as usize,
        ),
        ("ggml_backend_sycl_set_mul_device_mode", fake_set_mul_device_mode as *const () as usize),
    ]);

    FakeExports { symbols }
}

#[derive(Debug, Default)]
struct HandleCounts {
    opened: AtomicUsize,
    live: AtomicUsize,
}

/// Loader that hands out [`FakeExports`] and counts handles.
///
/// Clones share their counters.
#[derive(Debug, Clone)]
pub struct MockLoader {
    exports: Option<FakeExports>,
    error: String,
    check_files: bool,
    counts: Arc<HandleCounts>,
}

impl MockLoader {
    /// A loader whose every `open` succeeds with `exports`.
    pub fn new(exports: FakeExports) -> Self {
        MockLoader {
            exports: Some(exports),
            error: String::new(),
            check_files: false,
            counts: Arc::default(),
        }
    }

    /// A loader whose every `open` fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        MockLoader {
            exports: None,
            error: message.into(),
            check_files: false,
            counts: Arc::default(),
        }
    }

    /// Fail to open paths that do not exist on disk.
    pub fn check_files(mut self) -> Self {
        self.check_files = true;
        self
    }

    /// Number of successful opens.
    pub fn opened(&self) -> usize {
        self.counts.opened.load(Ordering::SeqCst)
    }

    /// Number of handles not yet dropped.
    pub fn live(&self) -> usize {
        self.counts.live.load(Ordering::SeqCst)
    }
}

impl DynamicLoader for MockLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn LoadedModule>, String> {
        if self.check_files && !path.is_file() {
            return Err(format!(
                "{}: cannot open shared object file: No such file or directory",
                path.display()
            ));
        }
        let exports = self.exports.clone().ok_or_else(|| self.error.clone())?;

        self.counts.opened.fetch_add(1, Ordering::SeqCst);
        self.counts.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockModule {
            exports,
            counts: Arc::clone(&self.counts),
        }))
    }
}

struct MockModule {
    exports: FakeExports,
    counts: Arc<HandleCounts>,
}

impl SymbolLookup for MockModule {
    fn symbol(&self, name: &str) -> Option<*const c_void> {
        self.exports.symbol(name)
    }
}

impl LoadedModule for MockModule {}

impl Drop for MockModule {
    fn drop(&mut self) {
        self.counts.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Asset source wrapper that counts calls.
#[derive(Debug)]
pub struct RecordingSource<S> {
    inner: S,
    queries: AtomicUsize,
    extractions: AtomicUsize,
}

impl<S: AssetSource> RecordingSource<S> {
    pub fn new(inner: S) -> Self {
        RecordingSource {
            inner,
            queries: AtomicUsize::new(0),
            extractions: AtomicUsize::new(0),
        }
    }

    /// Number of `extract` calls.
    pub fn extractions(&self) -> usize {
        self.extractions.load(Ordering::SeqCst)
    }

    /// Number of calls of any kind.
    pub fn touched(&self) -> usize {
        self.queries.load(Ordering::SeqCst) + self.extractions()
    }
}

impl<S: AssetSource> AssetSource for RecordingSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn ready(&self) -> io::Result<()> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.ready()
    }

    fn exists(&self, archive_path: &str) -> bool {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.exists(archive_path)
    }

    fn modified(&self, archive_path: &str) -> io::Result<SystemTime> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.modified(archive_path)
    }

    fn extract(&self, archive_path: &str, dest: &Path) -> io::Result<()> {
        self.extractions.fetch_add(1, Ordering::SeqCst);
        self.inner.extract(archive_path, dest)
    }
}

/// Write every SYCL asset under `<dir>/bundle`, dated an hour ago.
pub fn sycl_bundle(dir: &Path) -> DirSource {
    let root = dir.join("bundle");
    let an_hour_ago = SystemTime::now() - Duration::from_secs(3600);
    for asset in SYCL.assets {
        let path = asset
            .archive_path
            .split('/')
            .fold(root.clone(), |p, c| p.join(c));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("// {}\n", asset.file_name)).unwrap();
        set_mtime(&path, an_hour_ago);
    }
    DirSource::new(root)
}

/// Build a gzipped tarball from `(path, contents, mtime seconds)` entries.
pub fn build_tarball(entries: &[(&str, &[u8], u64)]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, data, mtime) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(*mtime);
        header.set_entry_type(tar::EntryType::Regular);
        builder.append_data(&mut header, path, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Set a file's modification time.
pub fn set_mtime(path: &Path, time: SystemTime) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

/// Write an executable `/bin/sh` script.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
}

/// A stand-in compiler: writes `compiled` to its `-o` argument, appends a
/// line to `<dir>/compiler.log`, then exits with `exit_code`.
pub fn fake_compiler(dir: &Path, exit_code: i32) -> PathBuf {
    let log = dir.join("compiler.log");
    let body = format!(
        r#"out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then
    shift
    out="$1"
  fi
  shift
done
echo compiled > "$out"
echo run >> "{}"
exit {}"#,
        log.display(),
        exit_code
    );
    write_script(&dir.join("fake-bin"), "icpx", &body)
}

/// Number of times the compiler made by [`fake_compiler`] ran.
pub fn compiler_runs(dir: &Path) -> usize {
    fs::read_to_string(dir.join("compiler.log"))
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

/// Leftover temporary files next to `library` (`<name>.XXXXXX`).
pub fn temp_siblings(library: &Path) -> Vec<PathBuf> {
    let (Some(dir), Some(name)) = (library.parent(), library.file_name()) else {
        return Vec::new();
    };
    let prefix = format!("{}.", name.to_string_lossy());
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with(&prefix))
                .unwrap_or(false)
        })
        .collect()
}
