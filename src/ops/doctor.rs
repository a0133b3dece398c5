//! Environment health checks.
//!
//! The `doctor` command reports what acquisition would find without doing
//! any of it: no files are written and the compiler is never run.
//!
//! ## Checks Performed
//!
//! - Dynamic loading support on this platform
//! - Whether the configured GPU mode admits the backend
//! - Compiler location
//! - Bundled sources and prebuilt library
//! - State of the cached library

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::builder::{locate_compiler, prebuilt_archive_path, Staleness};
use crate::core::backend::dynamic_loading_supported;
use crate::core::{Admission, ArtifactPaths, BackendSpec};
use crate::sources::AssetSource;
use crate::util::config::GpuConfig;

/// Result of a single health check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// Path involved (if applicable)
    pub path: Option<PathBuf>,

    /// How long the check took
    pub duration: Duration,

    /// Whether this check is required or optional
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Create a failing check result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: false,
            message: message.into(),
            path: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Mark this check as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Make this check required only when `required` holds.
    pub fn required_if(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Summary of all health checks.
#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,

    /// Total time taken
    pub total_duration: Duration,
}

impl DoctorReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a check result.
    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Check if all required checks passed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    /// Get the count of passed checks.
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Get the count of failed checks.
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    /// Get the count of required failed checks.
    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Inputs for the doctor command.
pub struct DoctorOptions<'a> {
    pub backend: &'a BackendSpec,
    pub config: &'a GpuConfig,
    pub app_dir: &'a Path,
    pub assets: &'a dyn AssetSource,
}

/// Run the doctor command.
pub fn doctor(options: DoctorOptions<'_>) -> DoctorReport {
    let start = Instant::now();
    let mut report = DoctorReport::new();
    let paths = ArtifactPaths::new(options.app_dir, options.backend);

    report.add(check_dynamic_loading());
    report.add(check_mode(&options));
    report.add(check_compiler(&options));
    report.add(check_sources(&options));
    report.add(check_prebuilt(&options));
    report.add(check_library(&paths));

    report.total_duration = start.elapsed();
    report
}

fn check_dynamic_loading() -> CheckResult {
    if dynamic_loading_supported() {
        CheckResult::pass("Dynamic loading", "supported")
    } else {
        CheckResult::fail("Dynamic loading", "not supported on this platform")
    }
}

fn check_mode(options: &DoctorOptions<'_>) -> CheckResult {
    let mode = options.config.mode;
    let name = options.backend.name;
    match mode.admits(options.backend.mode) {
        Admission::Allowed => CheckResult::pass("GPU mode", format!("{} is tried automatically", name)),
        Admission::Forced => {
            CheckResult::pass("GPU mode", format!("--gpu {} requires {}", mode, name))
        }
        Admission::Excluded => {
            CheckResult::fail("GPU mode", format!("--gpu {} excludes {}", mode, name)).optional()
        }
    }
}

fn check_compiler(options: &DoctorOptions<'_>) -> CheckResult {
    let start = Instant::now();
    let spec = &options.backend.compiler;
    let needed = !options.config.nocompile;

    let result = match locate_compiler(spec, options.config.compiler.as_deref()) {
        Some(path) => CheckResult::pass("Compiler", format!("Found {}", spec.name)).with_path(path),
        None if needed => CheckResult::fail(
            "Compiler",
            format!(
                "{} not found (searched PATH, ${}/bin and {})",
                spec.exe_name(),
                spec.root_env,
                spec.fallback_dir
            ),
        ),
        None => CheckResult::fail("Compiler", format!("{} not found", spec.exe_name())),
    };
    result.required_if(needed).with_duration(start.elapsed())
}

fn check_sources(options: &DoctorOptions<'_>) -> CheckResult {
    if let Err(e) = options.assets.ready() {
        return CheckResult::fail("Sources", format!("bundle is unreadable: {}", e))
            .required_if(!options.config.nocompile);
    }

    let missing: Vec<&str> = options
        .backend
        .assets
        .iter()
        .filter(|a| !options.assets.exists(a.archive_path))
        .map(|a| a.archive_path)
        .collect();

    let result = if missing.is_empty() {
        CheckResult::pass(
            "Sources",
            format!(
                "{} files in {} bundle",
                options.backend.assets.len(),
                options.assets.name()
            ),
        )
    } else {
        CheckResult::fail("Sources", format!("missing {}", missing.join(", ")))
    };
    result.required_if(!options.config.nocompile)
}

fn check_prebuilt(options: &DoctorOptions<'_>) -> CheckResult {
    let archive_path = prebuilt_archive_path(options.backend.name);
    if options.assets.exists(&archive_path) {
        CheckResult::pass("Prebuilt", format!("{} is bundled", archive_path)).optional()
    } else {
        CheckResult::fail("Prebuilt", format!("{} is not bundled", archive_path)).optional()
    }
}

fn check_library(paths: &ArtifactPaths) -> CheckResult {
    let library = paths.library.clone();
    if !library.exists() {
        return CheckResult::fail("Library", "not built yet")
            .with_path(library)
            .optional();
    }

    let result = match Staleness::of_files(&paths.primary_source, &library) {
        Staleness::DerivedNewerOrEqual => CheckResult::pass("Library", "up to date"),
        Staleness::ReferenceNewer => CheckResult::fail("Library", "older than its source"),
        // sources are gone but a library is present, as with a prebuilt
        Staleness::Error(_) => CheckResult::pass("Library", "present"),
    };
    result.with_path(library).optional()
}

/// Format the doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> String {
    use std::fmt::Write;

    let mut output = String::new();

    let _ = writeln!(output, "accel-loader doctor");
    let _ = writeln!(output, "===================\n");

    let _ = writeln!(output, "Checks:");
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };

        let _ = writeln!(output, "  {} {}{}: {}", status, check.name, required, check.message);

        if verbose {
            if let Some(path) = &check.path {
                let _ = writeln!(output, "      Path: {}", path.display());
            }
            let _ = writeln!(output, "      Took: {:?}", check.duration);
        }
    }

    let _ = writeln!(output);

    let passed = report.passed_count();
    let failed = report.failed_count();
    let required_failed = report.required_failed_count();

    let _ = writeln!(output, "Summary: {} passed, {} failed", passed, failed);

    if required_failed > 0 {
        let _ = writeln!(
            output,
            "\nWarning: {} required check(s) failed. GPU support will be unavailable.",
            required_failed
        );
    } else if failed > 0 {
        let _ = writeln!(
            output,
            "\nAll required checks passed. {} optional check(s) failed.",
            failed
        );
    } else {
        let _ = writeln!(output, "\nAll checks passed.");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GpuMode, SYCL};
    use crate::sources::DirSource;
    use crate::test_support::{sycl_bundle, write_script, RecordingSource};
    use tempfile::TempDir;

    fn check<'a>(report: &'a DoctorReport, name: &str) -> &'a CheckResult {
        report.checks.iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    fn test_check_result_optional() {
        let result = CheckResult::pass("test", "passed").optional();
        assert!(result.passed);
        assert!(!result.required);
    }

    #[test]
    fn test_report_counts() {
        let mut report = DoctorReport::new();
        report.add(CheckResult::pass("required", "ok"));
        report.add(CheckResult::fail("optional", "missing").optional());

        assert!(report.all_required_passed());
        assert_eq!(report.passed_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.required_failed_count(), 0);

        report.add(CheckResult::fail("check", "missing"));
        assert!(!report.all_required_passed());
    }

    #[test]
    fn test_doctor_with_full_bundle() {
        let tmp = TempDir::new().unwrap();
        let assets = RecordingSource::new(sycl_bundle(tmp.path()));
        let compiler = write_script(tmp.path(), "icpx", "exit 0");
        let config = GpuConfig {
            compiler: Some(compiler.clone()),
            ..GpuConfig::default()
        };
        let app_dir = tmp.path().join("app");

        let report = doctor(DoctorOptions {
            backend: &SYCL,
            config: &config,
            app_dir: &app_dir,
            assets: &assets,
        });

        assert!(report.all_required_passed());
        assert_eq!(check(&report, "Compiler").path, Some(compiler));
        assert!(check(&report, "Sources").passed);
        assert!(!check(&report, "Library").passed);
        assert_eq!(assets.extractions(), 0);
        assert!(!app_dir.exists());
    }

    #[test]
    fn test_doctor_reports_missing_sources() {
        let tmp = TempDir::new().unwrap();
        let assets = DirSource::new(tmp.path().join("empty"));
        let config = GpuConfig {
            mode: GpuMode::Disable,
            nocompile: true,
            ..GpuConfig::default()
        };

        let report = doctor(DoctorOptions {
            backend: &SYCL,
            config: &config,
            app_dir: tmp.path(),
            assets: &assets,
        });

        let sources = check(&report, "Sources");
        assert!(!sources.passed);
        assert!(!sources.required);
        assert!(sources.message.contains("llama.cpp/ggml-sycl.cpp"));
        assert!(!check(&report, "GPU mode").passed);
        assert!(!check(&report, "Compiler").required);
    }

    #[test]
    fn test_doctor_reports_unreadable_bundle() {
        let tmp = TempDir::new().unwrap();
        let bundle = tmp.path().join("assets.tar.gz");
        std::fs::write(&bundle, b"not a tarball").unwrap();
        let assets = crate::sources::LazyBundle::new(&bundle);
        let config = GpuConfig::default();

        let report = doctor(DoctorOptions {
            backend: &SYCL,
            config: &config,
            app_dir: &tmp.path().join("app"),
            assets: &assets,
        });

        let sources = check(&report, "Sources");
        assert!(!sources.passed);
        assert!(sources.required);
        assert!(sources.message.contains("bundle is unreadable"));
        assert!(!check(&report, "Prebuilt").passed);
        assert!(!tmp.path().join("app").exists());
    }

    #[test]
    fn test_format_report() {
        let mut report = DoctorReport::new();
        report.add(CheckResult::pass("Compiler", "Found icpx"));
        report.add(CheckResult::fail("Prebuilt", "not bundled").optional());

        let output = format_report(&report, false);
        assert!(output.contains("[OK] Compiler: Found icpx"));
        assert!(output.contains("[!!] Prebuilt (optional)"));
        assert!(output.contains("1 optional check(s) failed"));
    }
}
