//! TOPAS input text generation for a resolved field.
//!
//! Every spot becomes one step of a TOPAS time feature; the simulation
//! replays the field spot by spot. All functions here are pure string
//! builders, file writing stays with the caller.

use std::fmt::Write;

use beamcast_plan::Field;
use log::info;
use serde::{Deserialize, Serialize};

use crate::resolve::ResolvedSource;

/// Which energy column of the resolved sources is written to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnergyMode {
    /// Nominal (planned) energies, the delivery-system view.
    #[default]
    Nominal,
    /// Realized (measured) energies from the beam model.
    Realized,
}

/// Knobs for the emitted TOPAS source description.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopasOptions {
    /// Requested number of Monte Carlo histories the field is scaled to.
    pub nstat: u64,
    /// Energy column selection.
    pub energy_mode: EnergyMode,
}

impl Default for TopasOptions {
    fn default() -> Self {
        Self {
            nstat: 1_000_000,
            energy_mode: EnergyMode::Nominal,
        }
    }
}

/// Particle-budget scaling factor: emitted spot weights are divided by this
/// so the file sums to roughly `nstat` histories.
pub fn scaling_factor(total_particles: f64, nstat: u64, plan_scaling: f64) -> f64 {
    total_particles / nstat.max(1) as f64 * plan_scaling
}

/// Renders the complete per-field TOPAS source description: comment header,
/// source plane position, and the per-spot time features.
///
/// `plane_distance` is the axial position the sources were resolved at, mm
/// upstream of isocenter.
pub fn field_source_text(
    field: &Field,
    sources: &[ResolvedSource],
    plane_distance: f64,
    plan_scaling: f64,
    opts: &TopasOptions,
) -> String {
    let total_particles: f64 = sources.iter().map(|s| s.weight).sum();
    let nstat_scale = scaling_factor(total_particles, opts.nstat, plan_scaling);
    info!(
        "field {}: {:.3e} protons over {} spots, scaling {:.4e} for {} histories",
        field.number,
        total_particles,
        sources.len(),
        nstat_scale,
        opts.nstat
    );

    let mut text = String::new();
    text.push_str(&header(field, total_particles, nstat_scale, opts.nstat));
    text.push_str(&source_plane(plane_distance));
    text.push_str(&time_features(field, sources, plane_distance, nstat_scale, opts));
    text
}

fn header(field: &Field, total_particles: f64, nstat_scale: f64, nstat: u64) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "# Topas input file for field {}", field.number);
    let _ = writeln!(s, "# {}", "-".repeat(40));
    let _ = writeln!(s, "# TOTAL_NUMBER_OF_PARTICLES: {total_particles:.0}");
    let _ = writeln!(s, "# TOTAL_MU: {:.2}", field.total_mu());
    let _ = writeln!(s, "# REQUESTED_HISTORIES: {nstat}");
    let _ = writeln!(s, "# PARTICLE_SCALING: {nstat_scale:.2}");
    let _ = writeln!(s, "# GANTRY_ANGLE: {:.2} deg", field.gantry_angle);
    let _ = writeln!(s, "# COUCH_ANGLE: {:.2} deg", field.couch_angle);
    s.push_str("#\n\n");
    s
}

fn source_plane(plane_distance: f64) -> String {
    let mut s = String::new();
    s.push_str("##############################################\n");
    s.push_str("###        S O U R C E   P L A N E         ###\n");
    s.push_str("##############################################\n\n");
    let _ = writeln!(
        s,
        "d:Ge/BeamPosition/TransZ             = {plane_distance:.2} mm"
    );
    s.push('\n');
    s
}

fn time_features(
    field: &Field,
    sources: &[ResolvedSource],
    plane_distance: f64,
    nstat_scale: f64,
    opts: &TopasOptions,
) -> String {
    let n_spots = sources.len();
    let times: Vec<usize> = (1..=n_spots).collect();

    let energies: Vec<f64> = sources
        .iter()
        .map(|s| match opts.energy_mode {
            EnergyMode::Nominal => s.energy_nominal,
            EnergyMode::Realized => s.energy,
        })
        .collect();
    let espreads: Vec<f64> = sources.iter().map(|s| s.espread).collect();

    // Spot positions at isocenter are projected onto the source plane when
    // the machine publishes its source-to-axis distances; the angle is the
    // one that carries the spot back through isocenter.
    let project = |value: f64, sad: Option<f64>| match sad {
        Some(sad) => value * (sad - plane_distance) / sad,
        None => value,
    };
    let angle = |value: f64, sad: Option<f64>| match sad {
        Some(sad) => (value / sad).atan().to_degrees(),
        None => 0.0,
    };
    let sad_x = field.sad.map(|sad| sad.0);
    let sad_y = field.sad.map(|sad| sad.1);
    let posx: Vec<f64> = sources.iter().map(|s| project(s.x, sad_x)).collect();
    let angx: Vec<f64> = sources.iter().map(|s| angle(s.x, sad_x)).collect();
    let posy: Vec<f64> = sources.iter().map(|s| project(s.y, sad_y)).collect();
    let angy: Vec<f64> = sources.iter().map(|s| angle(s.y, sad_y)).collect();

    let sigx: Vec<f64> = sources.iter().map(|s| s.phase_x.sigma).collect();
    let sigy: Vec<f64> = sources.iter().map(|s| s.phase_y.sigma).collect();
    let sigxp: Vec<f64> = sources.iter().map(|s| s.phase_x.sigma_prime).collect();
    let sigyp: Vec<f64> = sources.iter().map(|s| s.phase_y.sigma_prime).collect();
    let corx: Vec<f64> = sources.iter().map(|s| s.phase_x.cov).collect();
    let cory: Vec<f64> = sources.iter().map(|s| s.phase_y.cov).collect();
    let weights: Vec<f64> = sources.iter().map(|s| s.weight / nstat_scale).collect();

    let mut s = String::new();
    s.push_str("##############################################\n");
    s.push_str("###  T  I  M  E    F  E  A  T  U  R  E  S  ###\n");
    s.push_str("##############################################\n\n");
    let _ = writeln!(s, "i:Tf/NumberOfSequentialTimes         = {n_spots}");
    let _ = writeln!(s, "d:Tf/TimelineStart                   = 1 s");
    let _ = writeln!(s, "d:Tf/TimelineEnd                     = {} s", n_spots + 1);
    s.push('\n');

    s.push_str(&step_array("Energy", &times, &energies, 3, "MeV"));
    s.push_str(&step_array("EnergySpread", &times, &espreads, 5, ""));
    s.push_str(&step_array("spotPositionX", &times, &posx, 2, "mm"));
    s.push_str(&step_array("spotAngleX", &times, &angx, 3, "deg"));
    s.push_str(&step_array("spotPositionY", &times, &posy, 2, "mm"));
    s.push_str(&step_array("spotAngleY", &times, &angy, 3, "deg"));
    s.push_str(&step_array("SigmaX", &times, &sigx, 5, "mm"));
    s.push_str(&step_array("SigmaY", &times, &sigy, 5, "mm"));
    s.push_str(&step_array("SigmaXprime", &times, &sigxp, 5, ""));
    s.push_str(&step_array("SigmaYprime", &times, &sigyp, 5, ""));
    s.push_str(&step_array("CorrelationX", &times, &corx, 5, ""));
    s.push_str(&step_array("CorrelationY", &times, &cory, 5, ""));
    s.push_str(&step_array("spotWeight", &times, &weights, 0, ""));
    s
}

/// One TOPAS step function: a name, the integer time grid, and per-step
/// values with the quantity's unit (dimensionless arrays use the `uv`
/// prefix).
fn step_array(name: &str, times: &[usize], values: &[f64], precision: usize, unit: &str) -> String {
    let prefix = if unit.is_empty() { "uv" } else { "dv" };
    let time_list = times
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let value_list = values
        .iter()
        .map(|v| format!("{v:.precision$}"))
        .collect::<Vec<_>>()
        .join(" ");
    let mut s = String::new();
    let _ = writeln!(s, "s:Tf/{name}/Function                 = \"Step\"");
    let _ = writeln!(
        s,
        "dv:Tf/{name}/Times                   = {} {time_list} s",
        times.len()
    );
    let _ = writeln!(
        s,
        "{prefix}:Tf/{name}/Values                   = {} {value_list} {unit}",
        values.len()
    );
    s.push_str("\n\n");
    s
}
