//! Split an ordered source list into contiguous work units.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{TaskError, TaskResult};

/// A contiguous block of sources of one realization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUnit {
    /// Position of the unit within its realization.
    pub index: usize,
    /// Indices into the realization's source list.
    pub sources: Range<usize>,
}

impl WorkUnit {
    /// Number of progress items the unit accounts for (one per source).
    pub fn items(&self) -> u64 {
        self.sources.len() as u64
    }
}

/// Blocks of at most `block_size` sources, in source order. The last block
/// may be short; zero sources yield no units.
pub fn partition(n_sources: usize, block_size: usize) -> TaskResult<Vec<WorkUnit>> {
    if block_size == 0 {
        return Err(TaskError::ZeroBlockSize);
    }
    Ok((0..n_sources)
        .step_by(block_size)
        .enumerate()
        .map(|(index, start)| WorkUnit {
            index,
            sources: start..(start + block_size).min(n_sources),
        })
        .collect())
}
