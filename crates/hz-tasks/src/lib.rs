//! Work partitioning and progress bookkeeping for calculations.
//!
//! - `partition`: contiguous source blocks (work units)
//! - `progress`: lock-free per-realization counters and the completion barrier
//! - `cancel`: cooperative cancellation checked between units
//! - `dispatch`: run units on the rayon pool, stopping at the first failure

pub mod cancel;
pub mod dispatch;
pub mod error;
pub mod partition;
pub mod progress;

pub use cancel::CancellationToken;
pub use dispatch::run_units;
pub use error::{TaskError, TaskResult};
pub use partition::{WorkUnit, partition};
pub use progress::{ProgressSnapshot, ProgressTracker, RealizationProgress, RealizationStatus};
