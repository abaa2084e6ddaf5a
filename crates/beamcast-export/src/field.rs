//! Field-level orchestration: resolve every spot of a field, in order,
//! failing the whole field on the first error.
//!
//! A partially emitted source list could silently under-simulate a
//! treatment field, so no partial output is ever produced.

use beamcast_core::{BeamcastError, ErrorInfo};
use beamcast_model::BeamModelTable;
use beamcast_plan::{Field, Plan};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::resolve::{resolve_spot, ResolvedSource};

/// Resolved sources for one field, tagged with its plan field number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldExport {
    /// 1-based field number from the plan.
    pub field_number: usize,
    /// One resolved source per spot, in delivery order.
    pub sources: Vec<ResolvedSource>,
}

/// Resolves all spots of one field at the requested output plane.
///
/// The returned sources preserve the spot order of the input field. The
/// first spot failure aborts the field; the error names the field number and
/// the zero-based spot index.
pub fn export_field(
    field: &Field,
    table: &BeamModelTable,
    output_distance: f64,
) -> Result<Vec<ResolvedSource>, BeamcastError> {
    if field.spots.is_empty() {
        return Err(BeamcastError::EmptyField(
            ErrorInfo::new("empty-field", "field declares no spots")
                .with_context("field", format!("{}", field.number)),
        ));
    }
    debug!(
        "resolving field {} with {} spots at output plane {} mm",
        field.number,
        field.n_spots(),
        output_distance
    );
    field
        .spots
        .iter()
        .enumerate()
        .map(|(index, spot)| {
            resolve_spot(spot, table, output_distance).map_err(|err| {
                err.with_context("field", format!("{}", field.number))
                    .with_context("spot", format!("{index}"))
            })
        })
        .collect()
}

/// Exports every field of a plan, or only the one selected by `field_filter`
/// (1-based plan field number; `None` exports all fields).
///
/// Fields are independent: each is resolved in isolation and the first
/// failing field aborts the export with its field context attached. Filter
/// numbers that match no field select nothing; callers validate the filter
/// against the plan before asking for it.
pub fn export_plan(
    plan: &Plan,
    table: &BeamModelTable,
    output_distance: f64,
    field_filter: Option<usize>,
) -> Result<Vec<FieldExport>, BeamcastError> {
    let mut exports = Vec::new();
    for field in &plan.fields {
        if let Some(wanted) = field_filter {
            if field.number != wanted {
                continue;
            }
        }
        let sources = export_field(field, table, output_distance)?;
        info!(
            "field {}: {} sources, {:.3e} protons",
            field.number,
            sources.len(),
            sources.iter().map(|s| s.weight).sum::<f64>()
        );
        exports.push(FieldExport {
            field_number: field.number,
            sources,
        });
    }
    Ok(exports)
}
