#![deny(missing_docs)]
#![doc = "Per-spot source resolution and per-field export of simulation source descriptions."]

pub mod field;
pub mod resolve;
pub mod topas;

pub use field::{export_field, export_plan, FieldExport};
pub use resolve::{resolve_spot, ResolvedSource};
pub use topas::{field_source_text, scaling_factor, EnergyMode, TopasOptions};
