use std::fmt;

use serde::{Deserialize, Serialize};

/// Transverse axis label, used to keep the two independent phase-space
/// descriptors apart in diagnostics and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// Horizontal axis.
    X,
    /// Vertical axis.
    Y,
}

impl Axis {
    /// Lower-case label used in context maps and emitted artefacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Second-moment description of a Gaussian transverse beam distribution at a
/// fixed axial plane, for a single axis.
///
/// The x and y descriptors always travel together through the pipeline but
/// are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseSpace {
    /// Beam size, one standard deviation [mm].
    pub sigma: f64,
    /// Angular divergence, one standard deviation [rad].
    pub sigma_prime: f64,
    /// Position-angle covariance [mm rad].
    pub cov: f64,
}

impl PhaseSpace {
    /// Creates a descriptor from its three second moments.
    pub fn new(sigma: f64, sigma_prime: f64, cov: f64) -> Self {
        Self {
            sigma,
            sigma_prime,
            cov,
        }
    }

    /// Position variance, `sigma` squared.
    pub fn variance(&self) -> f64 {
        self.sigma * self.sigma
    }
}
