//! Errors raised by malformed source definitions.

use hz_core::SourceId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceModelError {
    #[error("Invalid magnitude-frequency distribution on source {source_id}: {reason}")]
    InvalidMfd { source_id: SourceId, reason: String },

    #[error("Invalid geometry on source {source_id}: {reason}")]
    InvalidGeometry { source_id: SourceId, reason: String },

    #[error("Duplicate source id: {source_id}")]
    DuplicateSource { source_id: SourceId },

    #[error("Unknown source model: {name}")]
    UnknownSourceModel { name: String },

    #[error("Non-finite rupture rate on source {source_id}: {value}")]
    NonFiniteRate { source_id: SourceId, value: f64 },

    #[error("Source {source_id} expects {expected:e} ruptures per event set, above the limit of {limit:e}")]
    ExcessiveRate {
        source_id: SourceId,
        expected: f64,
        limit: f64,
    },
}

impl SourceModelError {
    /// The offending source, when the error concerns a single one.
    pub fn source_id(&self) -> Option<&str> {
        match self {
            SourceModelError::InvalidMfd { source_id, .. }
            | SourceModelError::InvalidGeometry { source_id, .. }
            | SourceModelError::DuplicateSource { source_id }
            | SourceModelError::NonFiniteRate { source_id, .. }
            | SourceModelError::ExcessiveRate { source_id, .. } => Some(source_id),
            SourceModelError::UnknownSourceModel { .. } => None,
        }
    }
}

pub type SourceResult<T> = Result<T, SourceModelError>;
