//! GPU selection mode.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which GPU backend the host application asked for.
///
/// `Auto` lets every backend try in turn. A vendor mode forces exactly one
/// backend: the matching backend becomes mandatory and every other backend
/// stays out of the way. `Disable` turns all GPU support off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GpuMode {
    /// Try every backend (default)
    #[default]
    Auto,
    /// Apple Metal only
    Apple,
    /// AMD ROCm/HIP only
    Amd,
    /// NVIDIA CUDA only
    Nvidia,
    /// Intel SYCL only
    Sycl,
    /// No GPU at all
    #[serde(alias = "none", alias = "cpu")]
    Disable,
}

/// How a [`GpuMode`] relates to one particular backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The backend may be tried; failure is silent.
    Allowed,
    /// The backend was explicitly requested; failure is fatal.
    Forced,
    /// The backend must not be touched.
    Excluded,
}

impl GpuMode {
    /// Get the mode name as used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            GpuMode::Auto => "auto",
            GpuMode::Apple => "apple",
            GpuMode::Amd => "amd",
            GpuMode::Nvidia => "nvidia",
            GpuMode::Sycl => "sycl",
            GpuMode::Disable => "disable",
        }
    }

    /// Decide whether the backend selected by `backend_mode` may load.
    pub fn admits(&self, backend_mode: GpuMode) -> Admission {
        match *self {
            GpuMode::Auto => Admission::Allowed,
            mode if mode == backend_mode => Admission::Forced,
            _ => Admission::Excluded,
        }
    }
}

impl fmt::Display for GpuMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GpuMode {
    type Err = GpuModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(GpuMode::Auto),
            "apple" | "metal" => Ok(GpuMode::Apple),
            "amd" | "rocm" | "hip" => Ok(GpuMode::Amd),
            "nvidia" | "cuda" => Ok(GpuMode::Nvidia),
            "sycl" | "intel" => Ok(GpuMode::Sycl),
            "disable" | "disabled" | "none" | "cpu" => Ok(GpuMode::Disable),
            _ => Err(GpuModeParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid GPU mode.
#[derive(Debug, Clone)]
pub struct GpuModeParseError(pub String);

impl fmt::Display for GpuModeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid gpu mode '{}', valid values: auto, apple, amd, nvidia, sycl, disable",
            self.0
        )
    }
}

impl std::error::Error for GpuModeParseError {}
