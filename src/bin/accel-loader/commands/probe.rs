//! `accel-loader probe` command

use anyhow::{bail, Result};

use crate::cli::ProbeArgs;
use accel_loader::{Accelerator, GpuConfig};

pub fn execute(args: ProbeArgs, config: GpuConfig) -> Result<()> {
    let accel = Accelerator::from_config(config);
    let backend = accel.backend_spec().name;

    if accel.is_available() {
        println!("{}: available ({} devices)", backend, accel.device_count());
        return Ok(());
    }

    println!("{}: unavailable", backend);
    if args.require {
        bail!("{} is unavailable", backend);
    }
    Ok(())
}
