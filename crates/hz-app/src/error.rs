//! Error types for the calculation service layer.

use hz_core::Ordinal;

/// A work unit that could not finish; its realization is marked failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("realization {ordinal} failed in block starting at source '{source_id}' (seed {seed}): {cause}")]
pub struct UnitFailure {
    pub ordinal: Ordinal,
    /// First source of the failed block.
    pub source_id: String,
    pub seed: u64,
    pub cause: String,
}

/// Application error wrapping the errors of every backend crate.
#[derive(Debug, thiserror::Error)]
pub enum CalcError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Source model error: {0}")]
    SourceModel(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Aggregation error: {0}")]
    Aggregation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Task error: {0}")]
    Task(String),

    #[error("Calculation cancelled")]
    Cancelled,

    #[error(transparent)]
    Unit(Box<UnitFailure>),

    #[error("Calculation {calculation} did not reach its completion barrier: {reason}")]
    Incomplete { calculation: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation worker panicked")]
    WorkerPanicked,
}

/// Result type for hz-app operations.
pub type CalcResult<T> = Result<T, CalcError>;

impl From<UnitFailure> for CalcError {
    fn from(err: UnitFailure) -> Self {
        CalcError::Unit(Box::new(err))
    }
}

impl From<hz_logictree::LogicTreeError> for CalcError {
    fn from(err: hz_logictree::LogicTreeError) -> Self {
        CalcError::Configuration(err.to_string())
    }
}

impl From<hz_job::ValidationError> for CalcError {
    fn from(err: hz_job::ValidationError) -> Self {
        CalcError::Configuration(err.to_string())
    }
}

impl From<hz_job::JobError> for CalcError {
    fn from(err: hz_job::JobError) -> Self {
        CalcError::Configuration(err.to_string())
    }
}

impl From<hz_source::SourceModelError> for CalcError {
    fn from(err: hz_source::SourceModelError) -> Self {
        CalcError::SourceModel(err.to_string())
    }
}

impl From<hz_gmf::SimulationError> for CalcError {
    fn from(err: hz_gmf::SimulationError) -> Self {
        CalcError::Simulation(err.to_string())
    }
}

impl From<hz_aggregate::AggregationError> for CalcError {
    fn from(err: hz_aggregate::AggregationError) -> Self {
        CalcError::Aggregation(err.to_string())
    }
}

impl From<hz_store::StoreError> for CalcError {
    fn from(err: hz_store::StoreError) -> Self {
        CalcError::Store(err.to_string())
    }
}

impl From<hz_tasks::TaskError> for CalcError {
    fn from(err: hz_tasks::TaskError) -> Self {
        match err {
            hz_tasks::TaskError::Cancelled => CalcError::Cancelled,
            other => CalcError::Task(other.to_string()),
        }
    }
}
