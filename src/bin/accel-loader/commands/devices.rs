//! `accel-loader devices` command

use anyhow::Result;

use accel_loader::{Accelerator, GpuConfig};

const MIB: usize = 1024 * 1024;

pub fn execute(config: GpuConfig) -> Result<()> {
    let accel = Accelerator::from_config(config);

    if !accel.is_available() {
        println!("No GPU devices available");
        return Ok(());
    }

    let count = accel.device_count();
    for index in 0..count {
        let id = accel.device_id(index);
        let (free, total) = accel.device_memory(index);
        println!(
            "{:>3}  id {:<4} {}  ({} MiB free of {} MiB)",
            index,
            id,
            accel.device_description(index),
            free / MIB,
            total / MIB
        );
    }
    Ok(())
}
