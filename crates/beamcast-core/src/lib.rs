#![deny(missing_docs)]
#![doc = "Core error taxonomy and shared data types for the beamcast plan exporter."]

pub mod errors;
mod types;

pub use errors::{BeamcastError, ErrorInfo};
pub use types::{Axis, PhaseSpace};
