//! `accel-loader clean` command

use anyhow::Result;

use accel_loader::ops::clean;
use accel_loader::{AppContext, GpuConfig, SYCL};

pub fn execute(config: GpuConfig) -> Result<()> {
    let ctx = AppContext::new(&config);
    let result = clean(ctx.app_dir(), &SYCL)?;

    if result.removed_dir {
        eprintln!("     Removed {}", ctx.app_dir().display());
    } else {
        eprintln!(
            "     Removed {} files from {}",
            result.removed.len(),
            ctx.app_dir().display()
        );
    }

    Ok(())
}
