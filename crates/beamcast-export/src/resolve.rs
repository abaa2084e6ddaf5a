//! Per-spot resolution: calibration lookup plus two independent axis drifts.

use beamcast_core::{Axis, BeamcastError, PhaseSpace};
use beamcast_model::{drift, BeamModelTable};
use beamcast_plan::Spot;
use serde::{Deserialize, Serialize};

/// Fully resolved source description for one spot, evaluated at the
/// requested output plane.
///
/// Immutable once created; owned by the field orchestrator until handed to
/// an emitter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSource {
    /// Nominal (planned) energy of the originating spot [MeV].
    pub energy_nominal: f64,
    /// Realized beam energy from the calibration table [MeV].
    pub energy: f64,
    /// Realized energy spread, one standard deviation [MeV].
    pub espread: f64,
    /// Lateral spot position at isocenter, unmodified, horizontal [mm].
    pub x: f64,
    /// Lateral spot position at isocenter, unmodified, vertical [mm].
    pub y: f64,
    /// Horizontal phase-space descriptor at the output plane.
    pub phase_x: PhaseSpace,
    /// Vertical phase-space descriptor at the output plane.
    pub phase_y: PhaseSpace,
    /// Proton count for the spot, meterset weight times protons-per-MU.
    pub weight: f64,
}

fn drift_axis(
    p: &PhaseSpace,
    distance: f64,
    axis: Axis,
) -> Result<PhaseSpace, BeamcastError> {
    drift(p, distance).map_err(|err| err.with_context("axis", axis.as_str()))
}

/// Resolves one spot against the beam model at the requested output plane.
///
/// `output_distance` is mm upstream of isocenter, upstream-positive, in the
/// same convention as the table's reference distance; the drift handed to
/// the optics is their difference, so requesting the reference plane itself
/// reproduces the table values unchanged.
pub fn resolve_spot(
    spot: &Spot,
    table: &BeamModelTable,
    output_distance: f64,
) -> Result<ResolvedSource, BeamcastError> {
    let row = table.lookup(spot.energy_nominal)?;
    let drift_distance = output_distance - table.reference_distance();
    let phase_x = drift_axis(&row.phase_space(Axis::X), drift_distance, Axis::X)?;
    let phase_y = drift_axis(&row.phase_space(Axis::Y), drift_distance, Axis::Y)?;
    Ok(ResolvedSource {
        energy_nominal: spot.energy_nominal,
        energy: row.energy,
        espread: row.espread,
        x: spot.x,
        y: spot.y,
        phase_x,
        phase_y,
        weight: spot.mu * row.ppmu,
    })
}
