//! hz-store: persistence for calculations.
//!
//! - `repository`: the gateway trait the calculator writes through
//! - `memory`: thread-safe in-process implementation
//! - `store`: on-disk result store (JSON manifest + JSONL curves and maps)
//! - `hash`: configuration fingerprints

pub mod hash;
pub mod memory;
pub mod repository;
pub mod store;
pub mod types;

pub use hash::config_digest;
pub use memory::MemoryRepository;
pub use repository::HazardRepository;
pub use store::{CalculationManifest, ResultStore};
pub use types::*;

use hz_core::{CalculationId, Ordinal};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Calculation not found: {0}")]
    CalculationNotFound(CalculationId),

    #[error("Realization {ordinal} not found in calculation {calculation}")]
    RealizationNotFound {
        calculation: CalculationId,
        ordinal: Ordinal,
    },

    #[error("Set not found: {0}")]
    SetNotFound(SetId),

    #[error("Duplicate realization {ordinal} in calculation {calculation}")]
    DuplicateRealization {
        calculation: CalculationId,
        ordinal: Ordinal,
    },

    #[error("Invalid status transition for calculation {calculation}: {from:?} -> {to:?}")]
    StatusTransition {
        calculation: CalculationId,
        from: CalculationStatus,
        to: CalculationStatus,
    },

    #[error("Progress overflow on realization {ordinal}: {done} + {increment} exceeds {total}")]
    ProgressOverflow {
        ordinal: Ordinal,
        done: u64,
        increment: u64,
        total: u64,
    },

    #[error("Inconsistent record: {what}")]
    Inconsistent { what: String },

    #[error("Repository lock poisoned")]
    Poisoned,
}
