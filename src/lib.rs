//! accel-loader - just-in-time loader for an optional native GPU backend
//!
//! On first use the backend's bundled sources are copied into a versioned
//! application directory, compiled into a shared library when they changed,
//! then loaded and asked whether it found any devices. The verdict is
//! cached for the rest of the process.
//!
//! ```rust,ignore
//! if accel_loader::facade::has_gpu() {
//!     println!("{} devices", accel_loader::facade::device_count());
//! }
//! ```

pub mod builder;
pub mod core;
pub mod facade;
pub mod linker;
pub mod ops;
pub mod sources;
pub mod util;

/// Mocks and fixtures for unit tests.
///
/// Only compiled for tests. Provides a fake backend, a handle-counting
/// loader and helpers for bundles and compiler scripts.
#[cfg(test)]
pub mod test_support;

pub use core::{AcquireError, BackendSpec, GpuMode, SYCL};
pub use linker::HostApi;
pub use ops::Accelerator;
pub use util::config::{Config, GpuConfig};
pub use util::context::AppContext;
