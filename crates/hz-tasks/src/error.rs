//! Task layer errors.

use hz_core::Ordinal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    #[error("Block size must be at least 1")]
    ZeroBlockSize,

    #[error("Unknown realization {0}")]
    UnknownRealization(Ordinal),

    #[error("Progress overflow on realization {ordinal}: {done} + {increment} exceeds {total}")]
    ProgressOverflow {
        ordinal: Ordinal,
        done: u64,
        increment: u64,
        total: u64,
    },

    #[error("Realization {ordinal} already failed: {cause}")]
    AlreadyFailed { ordinal: Ordinal, cause: String },

    #[error("Calculation cancelled")]
    Cancelled,
}

pub type TaskResult<T> = Result<T, TaskError>;
