//! Forwarding calls into the acquired backend.
//!
//! Every method acquires on first use. When the backend is unavailable the
//! call does nothing and returns the neutral value of its type (zero, a
//! null handle, an empty string). Use [`Accelerator::is_available`] to tell
//! "unsupported" apart from a backend that really reports zero.

use std::ffi::{c_char, c_int, CStr};

use crate::core::symbols::{BackendHandle, BufferType, MAX_DEVICES};
use crate::core::SymbolTable;
use crate::ops::Accelerator;

const DESCRIPTION_CAPACITY: usize = 256;

impl Accelerator {
    fn symbols(&self) -> Option<&SymbolTable> {
        self.linked().map(|backend| backend.symbols())
    }

    /// Register the backend's devices with the host; returns how many.
    pub fn reg_devices(&self) -> c_int {
        match self.symbols() {
            // SAFETY: bound from the loaded library, which lives as long as `self`.
            Some(s) => unsafe { (s.reg_devices)() },
            None => 0,
        }
    }

    pub fn backend_init(&self, device: c_int) -> BackendHandle {
        match self.symbols() {
            // SAFETY: see `reg_devices`.
            Some(s) => unsafe { (s.backend_init)(device) },
            None => std::ptr::null_mut(),
        }
    }

    pub fn buffer_type(&self, device: c_int) -> BufferType {
        match self.symbols() {
            // SAFETY: see `reg_devices`.
            Some(s) => unsafe { (s.buffer_type)(device) },
            None => std::ptr::null_mut(),
        }
    }

    pub fn host_buffer_type(&self) -> BufferType {
        match self.symbols() {
            // SAFETY: see `reg_devices`.
            Some(s) => unsafe { (s.host_buffer_type)() },
            None => std::ptr::null_mut(),
        }
    }

    /// Buffer type splitting tensors across devices by `tensor_split`
    /// (`None` passes a null split).
    pub fn split_buffer_type(&self, tensor_split: Option<&[f32; MAX_DEVICES]>) -> BufferType {
        let split = tensor_split.map_or(std::ptr::null(), |s| s.as_ptr());
        match self.symbols() {
            // SAFETY: `split` is null or points at MAX_DEVICES floats, the
            // length the backend reads.
            Some(s) => unsafe { (s.split_buffer_type)(split) },
            None => std::ptr::null_mut(),
        }
    }

    pub fn print_devices(&self) {
        if let Some(s) = self.symbols() {
            // SAFETY: see `reg_devices`.
            unsafe { (s.print_devices)() }
        }
    }

    /// Fill `ids` with device ids; unused slots are set to -1 by the backend.
    pub fn gpu_list(&self, ids: &mut [c_int]) {
        let Some(s) = self.symbols() else {
            return;
        };
        let len = c_int::try_from(ids.len()).unwrap_or(c_int::MAX);
        // SAFETY: the backend writes at most `len` entries.
        unsafe { (s.gpu_list)(ids.as_mut_ptr(), len) }
    }

    /// Human-readable name of `device`, or an empty string.
    pub fn device_description(&self, device: c_int) -> String {
        let Some(s) = self.symbols() else {
            return String::new();
        };
        let mut buf = [0 as c_char; DESCRIPTION_CAPACITY];
        // SAFETY: the backend writes a nul-terminated string of at most
        // `buf.len()` bytes.
        unsafe { (s.device_description)(device, buf.as_mut_ptr(), buf.len()) };
        buf[DESCRIPTION_CAPACITY - 1] = 0;
        // SAFETY: terminated above.
        unsafe { CStr::from_ptr(buf.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }

    pub fn device_count(&self) -> c_int {
        match self.symbols() {
            // SAFETY: see `reg_devices`.
            Some(s) => unsafe { (s.device_count)() },
            None => 0,
        }
    }

    /// `(free, total)` bytes of device memory.
    pub fn device_memory(&self, device: c_int) -> (usize, usize) {
        let Some(s) = self.symbols() else {
            return (0, 0);
        };
        let (mut free, mut total) = (0usize, 0usize);
        // SAFETY: both out-pointers are valid for one write.
        unsafe { (s.device_memory)(device, &mut free, &mut total) };
        (free, total)
    }

    /// Index of the device with id `device_id`.
    pub fn device_index(&self, device_id: c_int) -> c_int {
        match self.symbols() {
            // SAFETY: see `reg_devices`.
            Some(s) => unsafe { (s.device_index)(device_id) },
            None => 0,
        }
    }

    /// Id of the device at `device_index`.
    pub fn device_id(&self, device_index: c_int) -> c_int {
        match self.symbols() {
            // SAFETY: see `reg_devices`.
            Some(s) => unsafe { (s.device_id)(device_index) },
            None => 0,
        }
    }

    pub fn set_single_device_mode(&self, main_gpu_id: c_int) {
        if let Some(s) = self.symbols() {
            // SAFETY: see `reg_devices`.
            unsafe { (s.set_single_device_mode)(main_gpu_id) }
        }
    }

    pub fn set_mul_device_mode(&self) {
        if let Some(s) = self.symbols() {
            // SAFETY: see `reg_devices`.
            unsafe { (s.set_mul_device_mode)() }
        }
    }
}
