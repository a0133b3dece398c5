//! Application context: where the loader keeps its files.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use directories::ProjectDirs;

use crate::util::config::GpuConfig;

/// Project directories for the loader
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("org", "accel-loader", "accel-loader"));

/// Get the global config directory.
pub fn global_config_dir() -> Option<PathBuf> {
    PROJECT_DIRS.as_ref().map(|d| d.config_dir().to_path_buf())
}

/// Resolved directories for one process.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Versioned directory holding sources and libraries
    app_dir: PathBuf,

    /// Asset bundle location, if configured
    bundle: Option<PathBuf>,
}

impl AppContext {
    /// Resolve directories from configuration.
    ///
    /// Defaults to `<data dir>/v/<crate version>/` so that upgrading the
    /// host never reuses a library built from older sources.
    pub fn new(config: &GpuConfig) -> Self {
        let app_dir = config.app_dir.clone().unwrap_or_else(default_app_dir);

        AppContext {
            app_dir,
            bundle: config.assets.clone(),
        }
    }

    /// Get the application directory.
    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    /// Get the configured asset bundle path.
    pub fn bundle(&self) -> Option<&Path> {
        self.bundle.as_deref()
    }

    /// Asset bundle path, defaulting to `<data dir>/assets`.
    pub fn bundle_or_default(&self) -> PathBuf {
        self.bundle.clone().unwrap_or_else(|| {
            PROJECT_DIRS
                .as_ref()
                .map(|d| d.data_dir().join("assets"))
                .unwrap_or_else(|| PathBuf::from(".accel").join("assets"))
        })
    }
}

fn default_app_dir() -> PathBuf {
    let base = PROJECT_DIRS
        .as_ref()
        .map(|d| d.data_dir().to_path_buf())
        .or_else(|| directories::BaseDirs::new().map(|b| b.home_dir().join(".accel-loader")))
        .unwrap_or_else(|| PathBuf::from(".accel-loader"));
    base.join("v").join(env!("CARGO_PKG_VERSION"))
}
