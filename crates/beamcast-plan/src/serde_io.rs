//! JSON interchange for plans.
//!
//! DICOM and delivery-log parsing live in an upstream importer; this module
//! is the collaborator surface the exporter consumes plans through.

use std::fs;
use std::path::Path;

use beamcast_core::{BeamcastError, ErrorInfo};
use log::info;

use crate::model::Plan;

/// Serializes a plan to pretty-printed JSON.
pub fn plan_to_json(plan: &Plan) -> Result<String, BeamcastError> {
    serde_json::to_string_pretty(plan)
        .map_err(|err| BeamcastError::Serde(ErrorInfo::new("json-serialize", err.to_string())))
}

/// Restores a plan from a JSON string.
pub fn plan_from_json(data: &str) -> Result<Plan, BeamcastError> {
    serde_json::from_str(data)
        .map_err(|err| BeamcastError::Serde(ErrorInfo::new("json-deserialize", err.to_string())))
}

/// Reads a plan from a JSON file.
pub fn load_plan(path: &Path) -> Result<Plan, BeamcastError> {
    let data = fs::read_to_string(path).map_err(|err| {
        BeamcastError::Serde(
            ErrorInfo::new("plan-read", "failed to read plan file")
                .with_context("path", path.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    let plan = plan_from_json(&data)?;
    info!(
        "loaded plan '{}' with {} fields / {} spots",
        plan.label,
        plan.n_fields(),
        plan.n_spots()
    );
    Ok(plan)
}

/// Writes a plan to a JSON file.
pub fn save_plan(plan: &Plan, path: &Path) -> Result<(), BeamcastError> {
    let json = plan_to_json(plan)?;
    fs::write(path, json).map_err(|err| {
        BeamcastError::Serde(
            ErrorInfo::new("plan-write", "failed to write plan file")
                .with_context("path", path.display().to_string())
                .with_hint(err.to_string()),
        )
    })
}
