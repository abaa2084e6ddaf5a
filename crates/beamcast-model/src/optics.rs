//! Paraxial transport of a Gaussian phase-space ellipse through free space.
//!
//! The beam model is measured at one fixed plane; the operator may request
//! the source definition at any other axial position. Free-space drift over
//! a distance `d` maps the second moments as
//!
//! ```text
//! sigma'^2_new = sigma'^2              (divergence invariant)
//! cov_new      = cov + d * sigma'^2
//! sigma^2_new  = sigma^2 + 2 d cov + d^2 sigma'^2
//! ```
//!
//! The map is linear and invertible: propagating by `d` and then `-d`
//! recovers the input up to floating-point rounding.

use beamcast_core::{BeamcastError, ErrorInfo, PhaseSpace};

/// Relative tolerance below which a negative propagated variance is treated
/// as rounding noise and clamped to zero.
const VARIANCE_TOLERANCE: f64 = 1e-9;

/// Gaussian FWHM per unit sigma, `2 sqrt(2 ln 2)`.
const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949_4;

/// Propagates one axis of a beam through a field-free drift of `distance`
/// (same length unit as `sigma`, positive in the direction of propagation).
///
/// Negative distances propagate backward, toward the source. The transform
/// itself never fails for finite inputs; a propagated variance that comes
/// out significantly negative indicates a malformed calibration row or a
/// drift with the wrong sign and is rejected as `InvalidTransport`.
pub fn drift(p: &PhaseSpace, distance: f64) -> Result<PhaseSpace, BeamcastError> {
    let div_var = p.sigma_prime * p.sigma_prime;
    let variance = p.variance() + 2.0 * distance * p.cov + distance * distance * div_var;

    // Scale of the contributing terms, for the rounding-noise cutoff.
    let scale = p.variance() + (2.0 * distance * p.cov).abs() + distance * distance * div_var;
    let variance = if variance < 0.0 {
        if variance < -VARIANCE_TOLERANCE * scale.max(1.0) {
            return Err(BeamcastError::InvalidTransport(
                ErrorInfo::new(
                    "negative-variance",
                    "drift produced a significantly negative beam variance",
                )
                .with_context("variance", format!("{variance}"))
                .with_context("distance_mm", format!("{distance}"))
                .with_hint("check the calibration row and the drift sign convention"),
            ));
        }
        0.0
    } else {
        variance
    };

    Ok(PhaseSpace {
        sigma: variance.sqrt(),
        sigma_prime: p.sigma_prime,
        cov: p.cov + distance * div_var,
    })
}

/// Full width at half maximum of a Gaussian with the given sigma.
pub fn fwhm_from_sigma(sigma: f64) -> f64 {
    FWHM_PER_SIGMA * sigma
}
