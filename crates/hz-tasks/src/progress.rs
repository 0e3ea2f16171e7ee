//! Per-realization progress counters.
//!
//! Each realization owns a fixed `total` (one item per source) and an atomic
//! `done` counter. Workers bump `done` through a compare-and-swap loop that
//! refuses to move past `total`; pollers only ever read. A failure is recorded
//! once and closes the completion barrier for good.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use hz_core::Ordinal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{TaskError, TaskResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RealizationStatus {
    Pending,
    Running,
    Complete,
    Failed,
}

#[derive(Debug)]
struct Slot {
    ordinal: Ordinal,
    total: u64,
    done: AtomicU64,
    started: AtomicBool,
    failure: OnceLock<String>,
}

impl Slot {
    fn status(&self) -> RealizationStatus {
        if self.failure.get().is_some() {
            RealizationStatus::Failed
        } else if !self.started.load(Ordering::Acquire) {
            RealizationStatus::Pending
        } else if self.done.load(Ordering::Acquire) == self.total {
            RealizationStatus::Complete
        } else {
            RealizationStatus::Running
        }
    }
}

/// Read-only view of one realization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealizationProgress {
    pub ordinal: Ordinal,
    pub done: u64,
    pub total: u64,
    pub status: RealizationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Calculation-wide progress: sums over every realization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub done: u64,
    pub total: u64,
    pub realizations: Vec<RealizationProgress>,
}

impl ProgressSnapshot {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.done as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Default)]
pub struct ProgressTracker {
    slots: Vec<Slot>,
}

impl ProgressTracker {
    /// Register realizations with their item totals.
    pub fn new(realizations: impl IntoIterator<Item = (Ordinal, u64)>) -> Self {
        let mut slots: Vec<Slot> = realizations
            .into_iter()
            .map(|(ordinal, total)| Slot {
                ordinal,
                total,
                done: AtomicU64::new(0),
                started: AtomicBool::new(false),
                failure: OnceLock::new(),
            })
            .collect();
        slots.sort_by_key(|s| s.ordinal);
        Self { slots }
    }

    fn slot(&self, ordinal: Ordinal) -> TaskResult<&Slot> {
        self.slots
            .binary_search_by_key(&ordinal, |s| s.ordinal)
            .map(|i| &self.slots[i])
            .map_err(|_| TaskError::UnknownRealization(ordinal))
    }

    pub fn mark_running(&self, ordinal: Ordinal) -> TaskResult<()> {
        self.slot(ordinal)?.started.store(true, Ordering::Release);
        Ok(())
    }

    /// Account for a finished unit of `items` sources; returns the new count.
    pub fn on_unit_complete(&self, ordinal: Ordinal, items: u64) -> TaskResult<u64> {
        let slot = self.slot(ordinal)?;
        if let Some(cause) = slot.failure.get() {
            return Err(TaskError::AlreadyFailed {
                ordinal,
                cause: cause.clone(),
            });
        }
        slot.started.store(true, Ordering::Release);
        let mut current = slot.done.load(Ordering::Acquire);
        loop {
            let next = current
                .checked_add(items)
                .filter(|n| *n <= slot.total)
                .ok_or(TaskError::ProgressOverflow {
                    ordinal,
                    done: current,
                    increment: items,
                    total: slot.total,
                })?;
            match slot.done.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    debug!(%ordinal, done = next, total = slot.total, "unit complete");
                    return Ok(next);
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Record the first failure of a realization; later causes are dropped.
    pub fn mark_failed(&self, ordinal: Ordinal, cause: impl Into<String>) -> TaskResult<()> {
        let slot = self.slot(ordinal)?;
        let cause = cause.into();
        warn!(%ordinal, %cause, "realization failed");
        let _ = slot.failure.set(cause);
        Ok(())
    }

    pub fn status(&self, ordinal: Ordinal) -> TaskResult<RealizationStatus> {
        Ok(self.slot(ordinal)?.status())
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let realizations: Vec<RealizationProgress> = self
            .slots
            .iter()
            .map(|s| RealizationProgress {
                ordinal: s.ordinal,
                done: s.done.load(Ordering::Acquire),
                total: s.total,
                status: s.status(),
                failure: s.failure.get().cloned(),
            })
            .collect();
        ProgressSnapshot {
            done: realizations.iter().map(|r| r.done).sum(),
            total: realizations.iter().map(|r| r.total).sum(),
            realizations,
        }
    }

    pub fn any_failed(&self) -> bool {
        self.slots.iter().any(|s| s.failure.get().is_some())
    }

    /// True once every realization completed and none failed.
    pub fn barrier_open(&self) -> bool {
        self.slots
            .iter()
            .all(|s| s.status() == RealizationStatus::Complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ProgressTracker {
        ProgressTracker::new([(Ordinal(1), 4), (Ordinal(0), 3)])
    }

    #[test]
    fn counts_are_bounded_by_total() {
        let t = tracker();
        assert_eq!(t.on_unit_complete(Ordinal(0), 2).unwrap(), 2);
        assert!(matches!(
            t.on_unit_complete(Ordinal(0), 2),
            Err(TaskError::ProgressOverflow { done: 2, .. })
        ));
        assert_eq!(t.on_unit_complete(Ordinal(0), 1).unwrap(), 3);
        assert_eq!(t.status(Ordinal(0)).unwrap(), RealizationStatus::Complete);
        assert_eq!(t.status(Ordinal(1)).unwrap(), RealizationStatus::Pending);
    }

    #[test]
    fn snapshot_sums_realizations() {
        let t = tracker();
        t.on_unit_complete(Ordinal(1), 3).unwrap();
        t.on_unit_complete(Ordinal(0), 1).unwrap();
        let snap = t.snapshot();
        assert_eq!((snap.done, snap.total), (4, 7));
        assert_eq!(snap.realizations[0].ordinal, Ordinal(0));
        assert!((snap.fraction() - 4.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn barrier_opens_only_when_all_complete() {
        let t = tracker();
        t.on_unit_complete(Ordinal(0), 3).unwrap();
        assert!(!t.barrier_open());
        t.on_unit_complete(Ordinal(1), 4).unwrap();
        assert!(t.barrier_open());
    }

    #[test]
    fn failure_closes_barrier_for_good() {
        let t = tracker();
        t.on_unit_complete(Ordinal(0), 3).unwrap();
        t.mark_failed(Ordinal(1), "bad source s7").unwrap();
        t.mark_failed(Ordinal(1), "second cause").unwrap();
        assert!(t.any_failed());
        assert!(!t.barrier_open());
        assert!(matches!(
            t.on_unit_complete(Ordinal(1), 1),
            Err(TaskError::AlreadyFailed { .. })
        ));
        let snap = t.snapshot();
        assert_eq!(snap.realizations[1].failure.as_deref(), Some("bad source s7"));
        assert_eq!(snap.realizations[1].status, RealizationStatus::Failed);
    }

    #[test]
    fn empty_realization_completes_once_started() {
        let t = ProgressTracker::new([(Ordinal(0), 0)]);
        assert_eq!(t.status(Ordinal(0)).unwrap(), RealizationStatus::Pending);
        t.mark_running(Ordinal(0)).unwrap();
        assert!(t.barrier_open());
    }

    #[test]
    fn unknown_ordinal() {
        assert_eq!(
            tracker().on_unit_complete(Ordinal(9), 1),
            Err(TaskError::UnknownRealization(Ordinal(9)))
        );
    }
}
