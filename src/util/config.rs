//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `<config dir>/config.toml` - User-wide defaults
//! - Project: `.accel/config.toml` - Directory-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.
//!
//! ```toml
//! [gpu]
//! mode = "auto"        # auto, apple, amd, nvidia, sycl, disable
//! recompile = false    # always rebuild the backend library
//! nocompile = false    # never run the compiler; use a cached or prebuilt library
//! compiler = "/opt/intel/oneapi/compiler/latest/bin/icpx"
//! assets = "/usr/share/myapp/gpu-assets.tar.gz"
//! app_dir = "/var/cache/myapp"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::GpuMode;
use crate::util::context::global_config_dir;

/// Loader configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GPU backend settings
    pub gpu: GpuConfig,
}

/// Backend acquisition settings. Read-only once acquisition starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuConfig {
    /// Which backend the user asked for
    pub mode: GpuMode,

    /// Rebuild the backend library even when it looks up to date
    pub recompile: bool,

    /// Never run the compiler
    pub nocompile: bool,

    /// Explicit compiler executable
    pub compiler: Option<PathBuf>,

    /// Asset bundle: a directory or a `.tar.gz`
    pub assets: Option<PathBuf>,

    /// Directory for materialized sources and libraries
    pub app_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    ///
    /// `mode` only overrides when the other side is not `auto`, and the
    /// boolean flags can only be switched on.
    pub fn merge(&mut self, other: Config) {
        if other.gpu.mode != GpuMode::Auto {
            self.gpu.mode = other.gpu.mode;
        }
        if other.gpu.recompile {
            self.gpu.recompile = true;
        }
        if other.gpu.nocompile {
            self.gpu.nocompile = true;
        }
        if other.gpu.compiler.is_some() {
            self.gpu.compiler = other.gpu.compiler;
        }
        if other.gpu.assets.is_some() {
            self.gpu.assets = other.gpu.assets;
        }
        if other.gpu.app_dir.is_some() {
            self.gpu.app_dir = other.gpu.app_dir;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.accel/config.toml)
/// 2. Global config (<config dir>/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global config path.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.accel/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".accel").join("config.toml")
}

/// Load configuration for the current directory.
pub fn load_default_config() -> Config {
    let cwd = std::env::current_dir().unwrap_or_default();
    let project = project_config_path(&cwd);
    match global_config_path() {
        Some(global) => load_config(&global, &project),
        None => load_config(Path::new(""), &project),
    }
}
