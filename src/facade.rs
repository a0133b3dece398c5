//! Process-wide access to the backend.
//!
//! The first call to any function here creates the global [`Accelerator`]
//! from the merged configuration files unless the host installed one with
//! [`install`] beforehand. Every function then forwards to it.

use std::ffi::c_int;
use std::sync::OnceLock;

use crate::core::symbols::{BackendHandle, BufferType, MAX_DEVICES};
use crate::ops::Accelerator;
use crate::util::config::load_default_config;

static ACCELERATOR: OnceLock<Accelerator> = OnceLock::new();

/// Install the process-wide accelerator.
///
/// Fails, handing `accel` back, once a global accelerator exists.
pub fn install(accel: Accelerator) -> Result<(), Accelerator> {
    ACCELERATOR.set(accel)
}

/// The process-wide accelerator.
pub fn global() -> &'static Accelerator {
    ACCELERATOR.get_or_init(from_default_config)
}

fn from_default_config() -> Accelerator {
    Accelerator::from_config(load_default_config().gpu)
}

/// Whether the GPU backend is loaded and found devices.
pub fn has_gpu() -> bool {
    global().is_available()
}

pub fn reg_devices() -> c_int {
    global().reg_devices()
}

pub fn backend_init(device: c_int) -> BackendHandle {
    global().backend_init(device)
}

pub fn buffer_type(device: c_int) -> BufferType {
    global().buffer_type(device)
}

pub fn host_buffer_type() -> BufferType {
    global().host_buffer_type()
}

pub fn split_buffer_type(tensor_split: Option<&[f32; MAX_DEVICES]>) -> BufferType {
    global().split_buffer_type(tensor_split)
}

pub fn print_devices() {
    global().print_devices()
}

pub fn gpu_list(ids: &mut [c_int]) {
    global().gpu_list(ids)
}

pub fn device_description(device: c_int) -> String {
    global().device_description(device)
}

pub fn device_count() -> c_int {
    global().device_count()
}

pub fn device_memory(device: c_int) -> (usize, usize) {
    global().device_memory(device)
}

pub fn device_index(device_id: c_int) -> c_int {
    global().device_index(device_id)
}

pub fn device_id(device_index: c_int) -> c_int {
    global().device_id(device_index)
}

pub fn set_single_device_mode(main_gpu_id: c_int) {
    global().set_single_device_mode(main_gpu_id)
}

pub fn set_mul_device_mode() {
    global().set_mul_device_mode()
}
