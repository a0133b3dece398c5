//! The backend's exported entry points.
//!
//! [`SymbolTable`] holds one typed function pointer per required export.
//! It can only be built by [`SymbolTable::bind`], which resolves every
//! symbol or fails, so a partially bound table never exists.

use std::ffi::{c_char, c_int, c_void};

use crate::core::errors::AcquireError;

/// Opaque `ggml_backend_t`.
pub type BackendHandle = *mut c_void;

/// Opaque `ggml_backend_buffer_type_t`.
pub type BufferType = *mut c_void;

/// Maximum number of devices the SYCL backend tracks.
pub const MAX_DEVICES: usize = 48;

pub type RegDevicesFn = unsafe extern "C" fn() -> c_int;
pub type LinkFn = unsafe extern "C" fn(api: *const c_void) -> bool;
pub type BackendInitFn = unsafe extern "C" fn(device: c_int) -> BackendHandle;
pub type BufferTypeFn = unsafe extern "C" fn(device: c_int) -> BufferType;
pub type HostBufferTypeFn = unsafe extern "C" fn() -> BufferType;
pub type SplitBufferTypeFn = unsafe extern "C" fn(tensor_split: *const f32) -> BufferType;
pub type PrintDevicesFn = unsafe extern "C" fn();
pub type GpuListFn = unsafe extern "C" fn(id_list: *mut c_int, max_len: c_int);
pub type DeviceDescriptionFn =
    unsafe extern "C" fn(device: c_int, description: *mut c_char, description_size: usize);
pub type DeviceCountFn = unsafe extern "C" fn() -> c_int;
pub type DeviceMemoryFn = unsafe extern "C" fn(device: c_int, free: *mut usize, total: *mut usize);
pub type DeviceIndexFn = unsafe extern "C" fn(device_id: c_int) -> c_int;
pub type DeviceIdFn = unsafe extern "C" fn(device_index: c_int) -> c_int;
pub type SetSingleDeviceModeFn = unsafe extern "C" fn(main_gpu_id: c_int);
pub type SetMulDeviceModeFn = unsafe extern "C" fn();

/// Anything that can hand out raw symbol addresses by name.
pub trait SymbolLookup {
    /// Address of `name`, or `None` when the export is missing.
    fn symbol(&self, name: &str) -> Option<*const c_void>;
}

macro_rules! symbol_table {
    ($( $field:ident : $ty:ty = $sym:literal, )+) => {
        /// Bound backend entry points.
        #[derive(Clone, Copy)]
        pub struct SymbolTable {
            $( pub $field: $ty, )+
        }

        /// Every export a backend library must provide.
        pub const REQUIRED_SYMBOLS: &[&str] = &[ $( $sym, )+ ];

        impl SymbolTable {
            /// Resolve every required export from `lib`.
            ///
            /// Fails on the first missing symbol; all misses are logged so a
            /// mismatched ABI shows up completely in one run.
            pub fn bind<L: SymbolLookup + ?Sized>(lib: &L) -> Result<Self, AcquireError> {
                let mut first_missing = None;
                $(
                    let $field = lib.symbol($sym);
                    if $field.is_none() {
                        tracing::error!("failed to import symbol: {}", $sym);
                        first_missing.get_or_insert($sym);
                    }
                )+

                match ( $( $field, )+ ) {
                    // SAFETY: each address was exported under the name the
                    // ggml headers declare with exactly this signature.
                    ( $( Some($field), )+ ) => Ok(SymbolTable {
                        $( $field: unsafe { std::mem::transmute::<*const c_void, $ty>($field) }, )+
                    }),
                    _ => {
                        tracing::error!("not all backend symbols could be imported");
                        Err(AcquireError::SymbolResolution {
                            symbol: first_missing.unwrap_or("<unknown>"),
                        })
                    }
                }
            }
        }
    };
}

symbol_table! {
    reg_devices: RegDevicesFn = "ggml_backend_sycl_reg_devices",
    link: LinkFn = "ggml_sycl_link",
    backend_init: BackendInitFn = "ggml_backend_sycl_init",
    buffer_type: BufferTypeFn = "ggml_backend_sycl_buffer_type",
    host_buffer_type: HostBufferTypeFn = "ggml_backend_sycl_host_buffer_type",
    split_buffer_type: SplitBufferTypeFn = "ggml_backend_sycl_split_buffer_type",
    print_devices: PrintDevicesFn = "ggml_backend_sycl_print_sycl_devices",
    gpu_list: GpuListFn = "ggml_sycl_get_gpu_list",
    device_description: DeviceDescriptionFn = "ggml_sycl_get_device_description",
    device_count: DeviceCountFn = "ggml_backend_sycl_get_device_count",
    device_memory: DeviceMemoryFn = "ggml_backend_sycl_get_device_memory",
    device_index: DeviceIndexFn = "ggml_backend_sycl_get_device_index",
    device_id: DeviceIdFn = "ggml_backend_sycl_get_device_id",
    set_single_device_mode: SetSingleDeviceModeFn = "ggml_backend_sycl_set_single_device_mode",
    set_mul_device_mode: SetMulDeviceModeFn = "ggml_backend_sycl_set_mul_device_mode",
}

impl std::fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolTable")
            .field("symbols", &REQUIRED_SYMBOLS.len())
            .finish()
    }
}
