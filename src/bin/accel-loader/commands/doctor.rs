//! `accel-loader doctor` command

use anyhow::Result;

use accel_loader::ops::{doctor, format_report, DoctorOptions};
use accel_loader::sources::LazyBundle;
use accel_loader::{AppContext, GpuConfig, SYCL};

pub fn execute(config: GpuConfig, verbose: bool) -> Result<()> {
    let ctx = AppContext::new(&config);
    let assets = LazyBundle::new(ctx.bundle_or_default());

    let report = doctor(DoctorOptions {
        backend: &SYCL,
        config: &config,
        app_dir: ctx.app_dir(),
        assets: &assets,
    });

    print!("{}", format_report(&report, verbose));

    // Exit with error code if required checks failed
    if !report.all_required_passed() {
        std::process::exit(1);
    }

    Ok(())
}
