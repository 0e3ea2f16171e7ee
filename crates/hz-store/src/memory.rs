//! In-process repository.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use hz_aggregate::{HazardCurveSet, HazardMapSet};
use hz_core::{CalculationId, Ordinal, RuptureId};
use hz_gmf::GmfSiteRecord;
use hz_source::Rupture;
use hz_tasks::{ProgressSnapshot, RealizationProgress, RealizationStatus};

use crate::repository::HazardRepository;
use crate::types::{
    CalculationRecord, CalculationStatus, GmfSetRecord, RealizationRecord, SesRecord, SetId,
    StoredRupture,
};
use crate::{StoreError, StoreResult};

#[derive(Debug)]
struct CalcEntry {
    record: CalculationRecord,
    realizations: BTreeMap<Ordinal, RealizationRecord>,
    curves: Vec<HazardCurveSet>,
    maps: Vec<HazardMapSet>,
}

#[derive(Debug)]
enum SetEntry {
    Ses {
        calculation: CalculationId,
        record: SesRecord,
        ruptures: Vec<RuptureId>,
    },
    Gmf {
        calculation: CalculationId,
        record: GmfSetRecord,
        rows: Vec<GmfSiteRecord>,
    },
}

impl SetEntry {
    fn calculation(&self) -> CalculationId {
        match self {
            SetEntry::Ses { calculation, .. } | SetEntry::Gmf { calculation, .. } => *calculation,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    calculations: BTreeMap<CalculationId, CalcEntry>,
    /// Indexed by `SetId::index`.
    sets: Vec<SetEntry>,
    /// Indexed by `RuptureId::index`.
    ruptures: Vec<StoredRupture>,
    /// Index handed to the first calculation.
    first_calculation: u64,
}

impl Inner {
    fn calc(&self, id: CalculationId) -> StoreResult<&CalcEntry> {
        self.calculations
            .get(&id)
            .ok_or(StoreError::CalculationNotFound(id))
    }

    fn calc_mut(&mut self, id: CalculationId) -> StoreResult<&mut CalcEntry> {
        self.calculations
            .get_mut(&id)
            .ok_or(StoreError::CalculationNotFound(id))
    }

    fn set(&self, id: SetId) -> StoreResult<&SetEntry> {
        self.sets
            .get(id.index() as usize)
            .ok_or(StoreError::SetNotFound(id))
    }

    fn set_mut(&mut self, id: SetId) -> StoreResult<&mut SetEntry> {
        self.sets
            .get_mut(id.index() as usize)
            .ok_or(StoreError::SetNotFound(id))
    }

    fn push_set(&mut self, entry: SetEntry) -> SetId {
        let id = SetId::from_index(self.sets.len() as u64);
        self.sets.push(entry);
        id
    }

    /// Whether rows owned by `realization` belong in the merged views.
    fn contributes(&self, calculation: CalculationId, realization: Option<Ordinal>) -> bool {
        let Some(ordinal) = realization else {
            return false;
        };
        self.calculations
            .get(&calculation)
            .and_then(|c| c.realizations.get(&ordinal))
            .is_some_and(|r| r.status != RealizationStatus::Failed)
    }
}

/// Thread-safe repository keeping everything in memory.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    inner: RwLock<Inner>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository whose calculation ids start at `first`, so that ids stay
    /// unique next to results saved by earlier processes.
    pub fn with_first_id(first: CalculationId) -> Self {
        Self {
            inner: RwLock::new(Inner {
                first_calculation: first.index(),
                ..Inner::default()
            }),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl HazardRepository for MemoryRepository {
    fn create_calculation(&self, description: &str, digest: &str) -> StoreResult<CalculationId> {
        let mut inner = self.write()?;
        let id = CalculationId::from_index(inner.first_calculation + inner.calculations.len() as u64);
        inner.calculations.insert(
            id,
            CalcEntry {
                record: CalculationRecord {
                    id,
                    description: description.to_string(),
                    created: chrono::Utc::now().to_rfc3339(),
                    digest: digest.to_string(),
                    status: CalculationStatus::Pending,
                },
                realizations: BTreeMap::new(),
                curves: Vec::new(),
                maps: Vec::new(),
            },
        );
        Ok(id)
    }

    fn calculation(&self, calculation: CalculationId) -> StoreResult<CalculationRecord> {
        Ok(self.read()?.calc(calculation)?.record.clone())
    }

    fn set_status(&self, calculation: CalculationId, status: CalculationStatus) -> StoreResult<()> {
        let mut inner = self.write()?;
        let entry = inner.calc_mut(calculation)?;
        let from = entry.record.status;
        if !from.can_move_to(status) {
            return Err(StoreError::StatusTransition {
                calculation,
                from,
                to: status,
            });
        }
        entry.record.status = status;
        Ok(())
    }

    fn create_realization(
        &self,
        calculation: CalculationId,
        record: RealizationRecord,
    ) -> StoreResult<()> {
        let mut inner = self.write()?;
        let entry = inner.calc_mut(calculation)?;
        if entry.realizations.contains_key(&record.ordinal) {
            return Err(StoreError::DuplicateRealization {
                calculation,
                ordinal: record.ordinal,
            });
        }
        entry.realizations.insert(record.ordinal, record);
        Ok(())
    }

    fn set_realization_status(
        &self,
        calculation: CalculationId,
        ordinal: Ordinal,
        status: RealizationStatus,
    ) -> StoreResult<()> {
        let mut inner = self.write()?;
        let record = inner
            .calc_mut(calculation)?
            .realizations
            .get_mut(&ordinal)
            .ok_or(StoreError::RealizationNotFound {
                calculation,
                ordinal,
            })?;
        record.status = status;
        Ok(())
    }

    fn read_realizations(&self, calculation: CalculationId) -> StoreResult<Vec<RealizationRecord>> {
        Ok(self
            .read()?
            .calc(calculation)?
            .realizations
            .values()
            .cloned()
            .collect())
    }

    fn create_ses(&self, calculation: CalculationId, record: SesRecord) -> StoreResult<SetId> {
        let mut inner = self.write()?;
        if !record.is_consistent() {
            return Err(StoreError::Inconsistent {
                what: format!("event set header {record:?}"),
            });
        }
        let calc = inner.calc(calculation)?;
        if let Some(ordinal) = record.realization
            && !calc.realizations.contains_key(&ordinal)
        {
            return Err(StoreError::RealizationNotFound {
                calculation,
                ordinal,
            });
        }
        Ok(inner.push_set(SetEntry::Ses {
            calculation,
            record,
            ruptures: Vec::new(),
        }))
    }

    fn create_gmf_set(&self, calculation: CalculationId, ses: SetId) -> StoreResult<SetId> {
        let mut inner = self.write()?;
        inner.calc(calculation)?;
        let record = match inner.set(ses)? {
            SetEntry::Ses {
                calculation: owner,
                record,
                ..
            } if *owner == calculation => GmfSetRecord {
                ses,
                realization: record.realization,
                ordinal: record.ordinal,
                investigation_time: record.investigation_time,
            },
            _ => return Err(StoreError::SetNotFound(ses)),
        };
        Ok(inner.push_set(SetEntry::Gmf {
            calculation,
            record,
            rows: Vec::new(),
        }))
    }

    fn read_ses(&self, calculation: CalculationId) -> StoreResult<Vec<(SetId, SesRecord)>> {
        let inner = self.read()?;
        inner.calc(calculation)?;
        Ok(inner
            .sets
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| match entry {
                SetEntry::Ses {
                    calculation: owner,
                    record,
                    ..
                } if *owner == calculation => Some((SetId::from_index(i as u64), record.clone())),
                _ => None,
            })
            .collect())
    }

    fn read_gmf_sets(
        &self,
        calculation: CalculationId,
    ) -> StoreResult<Vec<(SetId, GmfSetRecord)>> {
        let inner = self.read()?;
        inner.calc(calculation)?;
        Ok(inner
            .sets
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| match entry {
                SetEntry::Gmf {
                    calculation: owner,
                    record,
                    ..
                } if *owner == calculation => Some((SetId::from_index(i as u64), record.clone())),
                _ => None,
            })
            .collect())
    }

    fn append_ruptures(&self, ses: SetId, ruptures: Vec<Rupture>) -> StoreResult<Vec<RuptureId>> {
        let mut inner = self.write()?;
        match inner.set(ses)? {
            SetEntry::Ses { record, .. } if !record.is_complete_logic_tree() => {}
            _ => {
                return Err(StoreError::Inconsistent {
                    what: format!("set {ses} does not own ruptures"),
                });
            }
        }
        let first = inner.ruptures.len() as u64;
        let ids: Vec<RuptureId> = (0..ruptures.len() as u64)
            .map(|k| RuptureId::from_index(first + k))
            .collect();
        inner
            .ruptures
            .extend(ids.iter().zip(ruptures).map(|(&id, rupture)| StoredRupture {
                id,
                ses,
                rupture,
            }));
        if let SetEntry::Ses { ruptures, .. } = inner.set_mut(ses)? {
            ruptures.extend(ids.iter().copied());
        }
        Ok(ids)
    }

    fn read_ruptures(&self, ses: SetId) -> StoreResult<Vec<StoredRupture>> {
        let inner = self.read()?;
        let SetEntry::Ses {
            calculation,
            record,
            ruptures,
        } = inner.set(ses)?
        else {
            return Err(StoreError::SetNotFound(ses));
        };
        let collect = |ids: &[RuptureId]| -> Vec<StoredRupture> {
            ids.iter()
                .filter_map(|id| inner.ruptures.get(id.index() as usize).cloned())
                .collect()
        };
        if !record.is_complete_logic_tree() {
            return Ok(collect(ruptures.as_slice()));
        }
        Ok(inner
            .sets
            .iter()
            .filter_map(|entry| match entry {
                SetEntry::Ses {
                    calculation: owner,
                    record,
                    ruptures,
                } if owner == calculation && inner.contributes(*owner, record.realization) => {
                    Some(collect(ruptures.as_slice()))
                }
                _ => None,
            })
            .flatten()
            .collect())
    }

    fn append_gmf_rows(&self, gmf_set: SetId, records: Vec<GmfSiteRecord>) -> StoreResult<()> {
        let mut inner = self.write()?;
        match inner.set_mut(gmf_set)? {
            SetEntry::Gmf { record, rows, .. } if record.realization.is_some() => {
                rows.extend(records.into_iter().filter(|r| !r.is_empty()));
                Ok(())
            }
            _ => Err(StoreError::Inconsistent {
                what: format!("set {gmf_set} does not own ground motion rows"),
            }),
        }
    }

    fn read_gmf(&self, gmf_set: SetId) -> StoreResult<Vec<GmfSiteRecord>> {
        let inner = self.read()?;
        let SetEntry::Gmf {
            calculation,
            record,
            rows,
        } = inner.set(gmf_set)?
        else {
            return Err(StoreError::SetNotFound(gmf_set));
        };
        if record.realization.is_some() {
            return Ok(rows.clone());
        }
        Ok(inner
            .sets
            .iter()
            .filter_map(|entry| match entry {
                SetEntry::Gmf {
                    calculation: owner,
                    record,
                    rows,
                } if owner == calculation && inner.contributes(*owner, record.realization) => {
                    Some(rows.iter().cloned())
                }
                _ => None,
            })
            .flatten()
            .collect())
    }

    fn increment_progress(
        &self,
        calculation: CalculationId,
        ordinal: Ordinal,
        items: u64,
    ) -> StoreResult<u64> {
        let mut inner = self.write()?;
        let record = inner
            .calc_mut(calculation)?
            .realizations
            .get_mut(&ordinal)
            .ok_or(StoreError::RealizationNotFound {
                calculation,
                ordinal,
            })?;
        let next = record
            .completed_items
            .checked_add(items)
            .filter(|n| *n <= record.total_items)
            .ok_or(StoreError::ProgressOverflow {
                ordinal,
                done: record.completed_items,
                increment: items,
                total: record.total_items,
            })?;
        record.completed_items = next;
        Ok(next)
    }

    fn get_progress(&self, calculation: CalculationId) -> StoreResult<ProgressSnapshot> {
        let inner = self.read()?;
        let realizations: Vec<RealizationProgress> = inner
            .calc(calculation)?
            .realizations
            .values()
            .map(|r| RealizationProgress {
                ordinal: r.ordinal,
                done: r.completed_items,
                total: r.total_items,
                status: r.status,
                failure: None,
            })
            .collect();
        Ok(ProgressSnapshot {
            done: realizations.iter().map(|r| r.done).sum(),
            total: realizations.iter().map(|r| r.total).sum(),
            realizations,
        })
    }

    fn store_curve(&self, calculation: CalculationId, curve: HazardCurveSet) -> StoreResult<()> {
        self.write()?.calc_mut(calculation)?.curves.push(curve);
        Ok(())
    }

    fn store_map(&self, calculation: CalculationId, map: HazardMapSet) -> StoreResult<()> {
        self.write()?.calc_mut(calculation)?.maps.push(map);
        Ok(())
    }

    fn read_curves(&self, calculation: CalculationId) -> StoreResult<Vec<HazardCurveSet>> {
        Ok(self.read()?.calc(calculation)?.curves.clone())
    }

    fn read_maps(&self, calculation: CalculationId) -> StoreResult<Vec<HazardMapSet>> {
        Ok(self.read()?.calc(calculation)?.maps.clone())
    }
}
