//! Parallel execution of work units.

use rayon::prelude::*;

use crate::cancel::CancellationToken;
use crate::error::TaskError;

/// Run `work` over every job on the rayon pool, preserving job order in the
/// output. The cancellation flag is checked before each job starts; the first
/// error (or cancellation) is returned and no further jobs are started.
pub fn run_units<J, T, E, F>(jobs: Vec<J>, cancel: &CancellationToken, work: F) -> Result<Vec<T>, E>
where
    J: Send,
    T: Send,
    E: Send + From<TaskError>,
    F: Fn(J) -> Result<T, E> + Sync + Send,
{
    jobs.into_par_iter()
        .map(|job| {
            if cancel.is_cancelled() {
                return Err(E::from(TaskError::Cancelled));
            }
            work(job)
        })
        .collect()
}
