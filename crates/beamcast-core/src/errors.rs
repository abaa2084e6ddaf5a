//! Structured error types shared across beamcast crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`BeamcastError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (field numbers, energies, bounds, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the beamcast exporter.
///
/// Every failure in the conversion pipeline is non-retryable: it indicates a
/// structurally invalid calibration resource, a plan energy outside the
/// calibrated range, or an internally inconsistent transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum BeamcastError {
    /// The calibration table is structurally invalid (missing columns,
    /// non-numeric cells, non-increasing energy key).
    #[error("malformed beam model table: {0}")]
    MalformedTable(ErrorInfo),
    /// The calibration table contains no data rows.
    #[error("empty beam model table: {0}")]
    EmptyTable(ErrorInfo),
    /// A requested energy lies outside the calibrated range; beam models are
    /// never extrapolated.
    #[error("energy out of range: {0}")]
    EnergyOutOfRange(ErrorInfo),
    /// A drift transport produced a significantly negative beam variance.
    #[error("invalid transport: {0}")]
    InvalidTransport(ErrorInfo),
    /// A plan field declares no spots.
    #[error("empty field: {0}")]
    EmptyField(ErrorInfo),
    /// Serialization or interchange failures.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl BeamcastError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            BeamcastError::MalformedTable(info)
            | BeamcastError::EmptyTable(info)
            | BeamcastError::EnergyOutOfRange(info)
            | BeamcastError::InvalidTransport(info)
            | BeamcastError::EmptyField(info)
            | BeamcastError::Serde(info) => info,
        }
    }

    /// Returns the same error with an extra context entry attached, keeping
    /// the variant. Used by callers to identify the failing field, spot or
    /// axis as an error propagates outward.
    pub fn with_context(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match self {
            BeamcastError::MalformedTable(info) => {
                BeamcastError::MalformedTable(info.with_context(key, value))
            }
            BeamcastError::EmptyTable(info) => {
                BeamcastError::EmptyTable(info.with_context(key, value))
            }
            BeamcastError::EnergyOutOfRange(info) => {
                BeamcastError::EnergyOutOfRange(info.with_context(key, value))
            }
            BeamcastError::InvalidTransport(info) => {
                BeamcastError::InvalidTransport(info.with_context(key, value))
            }
            BeamcastError::EmptyField(info) => {
                BeamcastError::EmptyField(info.with_context(key, value))
            }
            BeamcastError::Serde(info) => BeamcastError::Serde(info.with_context(key, value)),
        }
    }
}
