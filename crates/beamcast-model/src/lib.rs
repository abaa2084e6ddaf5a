#![deny(missing_docs)]
#![doc = "Beam model calibration table and paraxial drift optics."]

pub mod optics;
pub mod table;

pub use optics::{drift, fwhm_from_sigma};
pub use table::{BeamModelTable, CalibrationRow};
