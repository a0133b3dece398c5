//! The once-per-process gate around acquisition.

use std::error::Error as _;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::core::{AcquireError, Admission, BackendSpec, GpuMode, SYCL};
use crate::linker::{DynamicLoader, HostApi, LinkedBackend, NativeLoader};
use crate::ops::acquire::Acquisition;
use crate::sources::{AssetSource, LazyBundle};
use crate::util::config::GpuConfig;
use crate::util::context::AppContext;

/// Called when a backend the user explicitly asked for cannot be acquired.
pub type FatalHandler = fn(&AcquireError, GpuMode) -> !;

type Preemption = Box<dyn Fn() -> bool + Send + Sync>;

/// Print the fatal error and exit with status 1.
pub fn exit_on_fatal(err: &AcquireError, mode: GpuMode) -> ! {
    eprintln!("{}", fatal_message(err, mode));
    std::process::exit(1)
}

/// The user-facing text of a fatal acquisition failure.
pub fn fatal_message(err: &AcquireError, mode: GpuMode) -> String {
    let mut message = format!(
        "fatal error: support for --gpu {} was explicitly requested, but it wasn't available: {}",
        mode, err
    );
    let mut cause = err.source();
    while let Some(e) = cause {
        message.push_str(&format!(": {}", e));
        cause = e.source();
    }
    message
}

/// Lazily acquires one backend and caches the verdict for its lifetime.
///
/// The first call to any query runs acquisition; concurrent callers block
/// until it finishes and every later call reads the cached verdict.
pub struct Accelerator {
    backend: &'static BackendSpec,
    config: GpuConfig,
    app_dir: PathBuf,
    assets: Box<dyn AssetSource>,
    loader: Box<dyn DynamicLoader>,
    host_api: HostApi,
    preempted: Preemption,
    on_fatal: FatalHandler,
    verdict: OnceLock<Option<LinkedBackend>>,
}

impl Accelerator {
    /// Create an accelerator for the SYCL backend.
    pub fn new(config: GpuConfig, app_dir: impl Into<PathBuf>, assets: Box<dyn AssetSource>) -> Self {
        Accelerator {
            backend: &SYCL,
            config,
            app_dir: app_dir.into(),
            assets,
            loader: Box::new(NativeLoader),
            host_api: HostApi::null(),
            preempted: Box::new(|| false),
            on_fatal: exit_on_fatal,
            verdict: OnceLock::new(),
        }
    }

    /// Resolve directories from `config`.
    ///
    /// The asset bundle is opened during acquisition, so a broken bundle
    /// is judged like any other acquisition failure.
    pub fn from_config(config: GpuConfig) -> Self {
        let ctx = AppContext::new(&config);
        let assets = LazyBundle::new(ctx.bundle_or_default());
        Accelerator::new(config, ctx.app_dir(), Box::new(assets))
    }

    pub fn with_backend(mut self, backend: &'static BackendSpec) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_loader(mut self, loader: impl DynamicLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Pass the host's backend-registration interface to the probe.
    pub fn with_host_api(mut self, api: HostApi) -> Self {
        self.host_api = api;
        self
    }

    /// Skip acquisition while `preempted` returns true.
    pub fn with_preemption(mut self, preempted: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.preempted = Box::new(preempted);
        self
    }

    pub fn with_fatal_handler(mut self, on_fatal: FatalHandler) -> Self {
        self.on_fatal = on_fatal;
        self
    }

    pub fn config(&self) -> &GpuConfig {
        &self.config
    }

    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    pub fn backend_spec(&self) -> &'static BackendSpec {
        self.backend
    }

    /// Whether the backend is loaded and found devices.
    pub fn is_available(&self) -> bool {
        self.linked().is_some()
    }

    /// Whether acquisition has already run.
    pub fn is_decided(&self) -> bool {
        self.verdict.get().is_some()
    }

    pub(crate) fn linked(&self) -> Option<&LinkedBackend> {
        self.verdict.get_or_init(|| self.acquire()).as_ref()
    }

    fn acquire(&self) -> Option<LinkedBackend> {
        let attempt = Acquisition {
            backend: self.backend,
            config: &self.config,
            app_dir: &self.app_dir,
            assets: self.assets.as_ref(),
            loader: self.loader.as_ref(),
            host_api: self.host_api,
            preempted: (self.preempted)(),
        };

        match attempt.run() {
            Ok(acquired) => Some(acquired.backend),
            Err(e) if e.is_soft() => None,
            Err(e) => {
                let mode = self.config.mode;
                if mode.admits(self.backend.mode) == Admission::Forced {
                    (self.on_fatal)(&e, mode);
                }
                if !matches!(e, AcquireError::ProbeNegative) {
                    tracing::warn!("{} unavailable: {}", self.backend.name, e);
                }
                None
            }
        }
    }
}

impl fmt::Debug for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accelerator")
            .field("backend", &self.backend.name)
            .field("config", &self.config)
            .field("app_dir", &self.app_dir)
            .field("assets", &self.assets.name())
            .field("verdict", &self.verdict.get().map(|v| v.is_some()))
            .finish_non_exhaustive()
    }
}
