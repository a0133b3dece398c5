//! Producing the backend library on disk.
//!
//! - `materialize`: copy bundled sources into the application directory
//! - `staleness`: modification-time comparisons
//! - `compiler`: locate the compiler and build with atomic publish
//! - `prebuilt`: fall back to a library shipped in the bundle

pub mod compiler;
pub mod materialize;
pub mod prebuilt;
pub mod staleness;

pub use compiler::{compile, locate_compiler};
pub use materialize::{materialize, Materialized};
pub use prebuilt::{extract_prebuilt, prebuilt_archive_path};
pub use staleness::Staleness;
