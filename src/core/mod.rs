//! Core data structures.
//!
//! - Backend descriptors and the asset list
//! - GPU mode selection
//! - Per-attempt artifact paths
//! - The bound symbol table
//! - Acquisition errors

pub mod backend;
pub mod errors;
pub mod gpu;
pub mod paths;
pub mod symbols;

pub use backend::{AssetDescriptor, BackendSpec, CompilerSpec, SYCL};
pub use errors::{AcquireError, CompileError};
pub use gpu::{Admission, GpuMode};
pub use paths::ArtifactPaths;
pub use symbols::{SymbolLookup, SymbolTable, REQUIRED_SYMBOLS};
