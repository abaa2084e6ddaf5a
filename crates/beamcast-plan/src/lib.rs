#![deny(missing_docs)]
#![doc = "Scanned proton plan data model: plans, fields, spots, and their JSON interchange."]

mod model;
pub mod serde_io;

pub use model::{Field, LayerSummary, Plan, Spot};
pub use serde_io::{load_plan, plan_from_json, plan_to_json, save_plan};
