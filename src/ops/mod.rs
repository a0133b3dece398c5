//! High-level operations.
//!
//! `acquire` runs one attempt at loading the backend, `gate` caches its
//! verdict for the process and `forward` exposes the backend's entry
//! points. `doctor` and `clean` back the CLI commands of the same name.

pub mod acquire;
pub mod clean;
pub mod doctor;
pub mod forward;
pub mod gate;

pub use acquire::{Acquired, Acquisition, AcquireState, Route};
pub use clean::{clean, CleanResult};
pub use doctor::{doctor, format_report, CheckResult, DoctorOptions, DoctorReport};
pub use gate::{exit_on_fatal, fatal_message, Accelerator, FatalHandler};
