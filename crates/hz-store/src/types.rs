//! Persisted record types.

use hz_core::{CalculationId, Ordinal, RuptureId, SeqId};
use hz_source::{Rupture, SetOrdinal};
use hz_tasks::RealizationStatus;
use serde::{Deserialize, Serialize};

/// Id of a stored event set or ground-motion set.
pub type SetId = SeqId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculationStatus {
    Pending,
    Executing,
    PostProcessing,
    Complete,
    Failed,
}

impl CalculationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CalculationStatus::Complete | CalculationStatus::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            CalculationStatus::Pending => 0,
            CalculationStatus::Executing => 1,
            CalculationStatus::PostProcessing => 2,
            CalculationStatus::Complete | CalculationStatus::Failed => 3,
        }
    }

    /// Status only moves forward; `Failed` is reachable from any live state.
    pub fn can_move_to(&self, next: CalculationStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == CalculationStatus::Failed || next.rank() >= self.rank()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    pub id: CalculationId,
    pub description: String,
    /// RFC 3339 creation time.
    pub created: String,
    pub digest: String,
    pub status: CalculationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealizationRecord {
    pub ordinal: Ordinal,
    pub weight: f64,
    pub seed: u64,
    pub path: Vec<String>,
    pub total_items: u64,
    pub completed_items: u64,
    pub status: RealizationStatus,
}

/// Stochastic event set header. `realization` is `None` exactly for the
/// complete logic tree set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SesRecord {
    pub realization: Option<Ordinal>,
    pub ordinal: SetOrdinal,
    pub investigation_time: f64,
}

impl SesRecord {
    pub fn per_realization(realization: Ordinal, index: u32, investigation_time: f64) -> Self {
        Self {
            realization: Some(realization),
            ordinal: SetOrdinal::PerRealization(index),
            investigation_time,
        }
    }

    pub fn complete_logic_tree(investigation_time: f64) -> Self {
        Self {
            realization: None,
            ordinal: SetOrdinal::CompleteLogicTree,
            investigation_time,
        }
    }

    pub fn is_complete_logic_tree(&self) -> bool {
        self.ordinal == SetOrdinal::CompleteLogicTree
    }

    pub(crate) fn is_consistent(&self) -> bool {
        self.realization.is_none() == self.is_complete_logic_tree()
            && self.investigation_time.is_finite()
            && self.investigation_time > 0.0
    }
}

/// Ground-motion set header; mirrors the event set it was simulated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GmfSetRecord {
    pub ses: SetId,
    pub realization: Option<Ordinal>,
    pub ordinal: SetOrdinal,
    pub investigation_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRupture {
    pub id: RuptureId,
    pub ses: SetId,
    pub rupture: Rupture,
}
