//! Shared utilities

pub mod config;
pub mod context;
pub mod fs;
pub mod process;

pub use config::{Config, GpuConfig};
pub use context::AppContext;
