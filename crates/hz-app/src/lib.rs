//! Calculation service layer for the hazard engine.
//!
//! Drives a job from validation through event-set generation, ground-motion
//! simulation and aggregation, writing everything through a
//! [`hz_store::HazardRepository`]. Shared by the CLI and by tests.

pub mod calculator;
pub mod error;
pub mod progress;
pub mod query;

pub use calculator::{
    CalculationHandle, CalculationOptions, CalculationOutcome, ENGINE_VERSION, execute_calculation,
    execute_calculation_with_progress, run_calculation, run_calculation_with_options,
};
pub use error::{CalcError, CalcResult, UnitFailure};
pub use progress::{CalcProgressEvent, CalcStage};
pub use query::{
    CalculationResults, get_progress, get_results, list_saved, load_saved, remove_saved,
};
