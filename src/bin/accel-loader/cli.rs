//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use accel_loader::util::config::Config;
use accel_loader::GpuMode;

/// accel-loader - build, load and inspect the optional GPU backend
#[derive(Parser)]
#[command(name = "accel-loader")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub gpu: GpuArgs,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags overriding the `[gpu]` configuration table.
#[derive(Args, Debug, Default)]
pub struct GpuArgs {
    /// GPU backend to use (auto, apple, amd, nvidia, sycl, disable)
    #[arg(long, global = true, env = "ACCEL_GPU")]
    pub gpu: Option<GpuMode>,

    /// Rebuild the backend library even when it is up to date
    #[arg(long, global = true)]
    pub recompile: bool,

    /// Never run the compiler; use a cached or prebuilt library
    #[arg(long, global = true)]
    pub nocompile: bool,

    /// Asset bundle: a directory or a .tar.gz
    #[arg(long, global = true, env = "ACCEL_ASSETS")]
    pub assets: Option<PathBuf>,

    /// Directory for materialized sources and libraries
    #[arg(long, global = true, env = "ACCEL_APP_DIR")]
    pub app_dir: Option<PathBuf>,

    /// Compiler executable
    #[arg(long, global = true)]
    pub compiler: Option<PathBuf>,
}

impl GpuArgs {
    /// Apply these flags on top of the file configuration.
    pub fn apply(&self, config: &mut Config) {
        let mut overrides = Config::default();
        if let Some(mode) = self.gpu {
            overrides.gpu.mode = mode;
        }
        overrides.gpu.recompile = self.recompile;
        overrides.gpu.nocompile = self.nocompile;
        overrides.gpu.assets = self.assets.clone();
        overrides.gpu.app_dir = self.app_dir.clone();
        overrides.gpu.compiler = self.compiler.clone();
        config.merge(overrides);

        // an explicit `--gpu auto` still wins over a configured mode
        if self.gpu == Some(GpuMode::Auto) {
            config.gpu.mode = GpuMode::Auto;
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Acquire the backend and report whether it is available
    Probe(ProbeArgs),

    /// List the backend's devices
    Devices,

    /// Check the environment without building anything
    Doctor,

    /// Remove materialized sources and libraries
    Clean,
}

#[derive(Args)]
pub struct ProbeArgs {
    /// Exit with status 1 when the backend is unavailable
    #[arg(long)]
    pub require: bool,
}
