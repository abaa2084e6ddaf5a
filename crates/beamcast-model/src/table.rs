//! Calibration table keyed by nominal beam energy.
//!
//! The table is measured at one fixed plane upstream of isocenter and loaded
//! once at startup; every query after that is a pure lookup over immutable
//! rows.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use beamcast_core::{Axis, BeamcastError, ErrorInfo, PhaseSpace};
use csv::ReaderBuilder;
use log::debug;
use serde::{Deserialize, Serialize};

/// Expected CSV header, in column order.
const COLUMNS: [&str; 10] = [
    "energy_nominal",
    "energy",
    "espread",
    "ppmu",
    "sigma_x",
    "sigma_y",
    "div_x",
    "div_y",
    "cov_x",
    "cov_y",
];

fn malformed(info: ErrorInfo) -> BeamcastError {
    BeamcastError::MalformedTable(info)
}

fn wrap_csv(code: &str, err: csv::Error) -> BeamcastError {
    malformed(ErrorInfo::new(code, "beam model CSV failure").with_hint(err.to_string()))
}

/// Linear interpolation between two samples, `t` in `[0, 1]`.
fn lerp(lo: f64, hi: f64, t: f64) -> f64 {
    lo + (hi - lo) * t
}

/// One measured energy point of the beam model.
///
/// All second moments are valid only at the table's reference plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRow {
    /// Nominal (planned) beam energy, the lookup key [MeV].
    pub energy_nominal: f64,
    /// Realized (measured) beam energy [MeV].
    pub energy: f64,
    /// Realized energy spread, one standard deviation [MeV].
    pub espread: f64,
    /// Protons delivered per monitor unit.
    pub ppmu: f64,
    /// Beam size sigma, horizontal [mm].
    pub sigma_x: f64,
    /// Beam size sigma, vertical [mm].
    pub sigma_y: f64,
    /// Angular divergence sigma, horizontal [rad].
    pub div_x: f64,
    /// Angular divergence sigma, vertical [rad].
    pub div_y: f64,
    /// Position-angle covariance, horizontal [mm rad].
    pub cov_x: f64,
    /// Position-angle covariance, vertical [mm rad].
    pub cov_y: f64,
}

impl CalibrationRow {
    /// Returns the phase-space descriptor for one transverse axis.
    pub fn phase_space(&self, axis: Axis) -> PhaseSpace {
        match axis {
            Axis::X => PhaseSpace::new(self.sigma_x, self.div_x, self.cov_x),
            Axis::Y => PhaseSpace::new(self.sigma_y, self.div_y, self.cov_y),
        }
    }

    /// Interpolates every column independently between two bracketing rows.
    fn interpolate(lo: &CalibrationRow, hi: &CalibrationRow, t: f64) -> CalibrationRow {
        CalibrationRow {
            energy_nominal: lerp(lo.energy_nominal, hi.energy_nominal, t),
            energy: lerp(lo.energy, hi.energy, t),
            espread: lerp(lo.espread, hi.espread, t),
            ppmu: lerp(lo.ppmu, hi.ppmu, t),
            sigma_x: lerp(lo.sigma_x, hi.sigma_x, t),
            sigma_y: lerp(lo.sigma_y, hi.sigma_y, t),
            div_x: lerp(lo.div_x, hi.div_x, t),
            div_y: lerp(lo.div_y, hi.div_y, t),
            cov_x: lerp(lo.cov_x, hi.cov_x, t),
            cov_y: lerp(lo.cov_y, hi.cov_y, t),
        }
    }
}

/// Immutable beam model: ordered calibration rows plus the reference plane
/// they were measured at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamModelTable {
    rows: Vec<CalibrationRow>,
    /// Distance upstream of isocenter at which the rows are valid [mm],
    /// upstream-positive. Supplied as configuration, not a table column.
    reference_distance: f64,
}

impl BeamModelTable {
    /// Builds a table from already-parsed rows.
    ///
    /// Fails if the rows are empty or the nominal energies are not strictly
    /// increasing.
    pub fn new(rows: Vec<CalibrationRow>, reference_distance: f64) -> Result<Self, BeamcastError> {
        if rows.is_empty() {
            return Err(BeamcastError::EmptyTable(ErrorInfo::new(
                "empty-table",
                "beam model contains no calibration rows",
            )));
        }
        for pair in rows.windows(2) {
            if pair[1].energy_nominal <= pair[0].energy_nominal {
                return Err(malformed(
                    ErrorInfo::new(
                        "non-increasing-energy",
                        "nominal energy column must be strictly increasing",
                    )
                    .with_context("previous_mev", format!("{}", pair[0].energy_nominal))
                    .with_context("next_mev", format!("{}", pair[1].energy_nominal)),
                ));
            }
        }
        debug!(
            "beam model table with {} rows, reference plane {} mm upstream",
            rows.len(),
            reference_distance
        );
        Ok(Self {
            rows,
            reference_distance,
        })
    }

    /// Loads the ten-column calibration CSV from a file.
    pub fn from_csv_path(path: &Path, reference_distance: f64) -> Result<Self, BeamcastError> {
        let file = File::open(path).map_err(|err| {
            malformed(
                ErrorInfo::new("table-open", "failed to open beam model CSV")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        Self::from_reader(file, reference_distance)
    }

    /// Loads the ten-column calibration CSV from any reader.
    pub fn from_reader<R: Read>(reader: R, reference_distance: f64) -> Result<Self, BeamcastError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|err| wrap_csv("table-header", err))?
            .clone();
        for (idx, expected) in COLUMNS.iter().enumerate() {
            match headers.get(idx) {
                Some(name) if name == *expected => {}
                found => {
                    return Err(malformed(
                        ErrorInfo::new(
                            "missing-column",
                            format!("expected column '{expected}' at position {idx}"),
                        )
                        .with_context("found", found.unwrap_or("<none>").to_string()),
                    ));
                }
            }
        }

        let mut rows = Vec::new();
        for (line, result) in csv_reader.records().enumerate() {
            let record = result.map_err(|err| wrap_csv("table-record", err))?;
            let mut values = [0.0f64; 10];
            for (idx, value) in values.iter_mut().enumerate() {
                let cell = record.get(idx).ok_or_else(|| {
                    malformed(
                        ErrorInfo::new("missing-column", "calibration row is short")
                            .with_context("row", format!("{}", line + 1))
                            .with_context("column", COLUMNS[idx].to_string()),
                    )
                })?;
                *value = cell.parse::<f64>().map_err(|_| {
                    malformed(
                        ErrorInfo::new("bad-float", "calibration cell is not numeric")
                            .with_context("row", format!("{}", line + 1))
                            .with_context("column", COLUMNS[idx].to_string())
                            .with_context("value", cell.to_string()),
                    )
                })?;
            }
            rows.push(CalibrationRow {
                energy_nominal: values[0],
                energy: values[1],
                espread: values[2],
                ppmu: values[3],
                sigma_x: values[4],
                sigma_y: values[5],
                div_x: values[6],
                div_y: values[7],
                cov_x: values[8],
                cov_y: values[9],
            });
        }
        Self::new(rows, reference_distance)
    }

    /// Returns calibration parameters for an arbitrary nominal energy.
    ///
    /// Exact matches return the stored row unmodified; energies strictly
    /// between two adjacent rows interpolate every column independently.
    /// Energies outside the tabulated range fail, never extrapolate.
    pub fn lookup(&self, energy_nominal: f64) -> Result<CalibrationRow, BeamcastError> {
        let (min, max) = self.energy_bounds();
        if !energy_nominal.is_finite() || energy_nominal < min || energy_nominal > max {
            return Err(BeamcastError::EnergyOutOfRange(
                ErrorInfo::new(
                    "energy-out-of-range",
                    "requested energy lies outside the calibrated range",
                )
                .with_context("energy_mev", format!("{energy_nominal}"))
                .with_context("min_mev", format!("{min}"))
                .with_context("max_mev", format!("{max}")),
            ));
        }

        // First row with key >= energy_nominal; in bounds since
        // energy_nominal <= max.
        let upper = self
            .rows
            .partition_point(|row| row.energy_nominal < energy_nominal);
        let hi = &self.rows[upper];
        if hi.energy_nominal == energy_nominal {
            return Ok(*hi);
        }
        let lo = &self.rows[upper - 1];
        let t = (energy_nominal - lo.energy_nominal) / (hi.energy_nominal - lo.energy_nominal);
        Ok(CalibrationRow::interpolate(lo, hi, t))
    }

    /// Smallest and largest tabulated nominal energies [MeV].
    pub fn energy_bounds(&self) -> (f64, f64) {
        (
            self.rows[0].energy_nominal,
            self.rows[self.rows.len() - 1].energy_nominal,
        )
    }

    /// Distance upstream of isocenter at which the table is valid [mm].
    pub fn reference_distance(&self) -> f64 {
        self.reference_distance
    }

    /// Number of calibration rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the table holds no rows. Unreachable after construction,
    /// present for the conventional pairing with [`BeamModelTable::len`].
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Read-only view of the calibration rows.
    pub fn rows(&self) -> &[CalibrationRow] {
        &self.rows
    }
}
