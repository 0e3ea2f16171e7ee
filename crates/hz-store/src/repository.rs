//! Persistence gateway used by the calculator.

use hz_aggregate::{HazardCurveSet, HazardMapSet};
use hz_core::{CalculationId, Ordinal, RuptureId};
use hz_gmf::GmfSiteRecord;
use hz_source::Rupture;
use hz_tasks::{ProgressSnapshot, RealizationStatus};

use crate::StoreResult;
use crate::types::{
    CalculationRecord, CalculationStatus, GmfSetRecord, RealizationRecord, SesRecord, SetId,
    StoredRupture,
};

/// Append-only store for everything a calculation produces.
///
/// Implementations are shared between worker threads. Rows belonging to a
/// failed realization stay stored but are left out of the complete logic
/// tree views.
pub trait HazardRepository: Send + Sync {
    fn create_calculation(&self, description: &str, digest: &str) -> StoreResult<CalculationId>;
    fn calculation(&self, calculation: CalculationId) -> StoreResult<CalculationRecord>;
    fn set_status(&self, calculation: CalculationId, status: CalculationStatus) -> StoreResult<()>;

    fn create_realization(
        &self,
        calculation: CalculationId,
        record: RealizationRecord,
    ) -> StoreResult<()>;
    fn set_realization_status(
        &self,
        calculation: CalculationId,
        ordinal: Ordinal,
        status: RealizationStatus,
    ) -> StoreResult<()>;
    fn read_realizations(&self, calculation: CalculationId) -> StoreResult<Vec<RealizationRecord>>;

    fn create_ses(&self, calculation: CalculationId, record: SesRecord) -> StoreResult<SetId>;
    /// Ground-motion set mirroring event set `ses`.
    fn create_gmf_set(&self, calculation: CalculationId, ses: SetId) -> StoreResult<SetId>;
    fn read_ses(&self, calculation: CalculationId) -> StoreResult<Vec<(SetId, SesRecord)>>;
    fn read_gmf_sets(&self, calculation: CalculationId)
    -> StoreResult<Vec<(SetId, GmfSetRecord)>>;

    /// Store ruptures of a per-realization event set; ids are assigned in order.
    fn append_ruptures(&self, ses: SetId, ruptures: Vec<Rupture>) -> StoreResult<Vec<RuptureId>>;
    /// Ruptures of an event set; the complete logic tree set resolves to the
    /// ruptures of every realization that did not fail.
    fn read_ruptures(&self, ses: SetId) -> StoreResult<Vec<StoredRupture>>;

    fn append_gmf_rows(&self, gmf_set: SetId, records: Vec<GmfSiteRecord>) -> StoreResult<()>;
    /// Same view rules as [`HazardRepository::read_ruptures`].
    fn read_gmf(&self, gmf_set: SetId) -> StoreResult<Vec<GmfSiteRecord>>;

    /// Bump the completed item count of a realization; returns the new count.
    fn increment_progress(
        &self,
        calculation: CalculationId,
        ordinal: Ordinal,
        items: u64,
    ) -> StoreResult<u64>;
    /// Done/total summed over realizations.
    fn get_progress(&self, calculation: CalculationId) -> StoreResult<ProgressSnapshot>;

    fn store_curve(&self, calculation: CalculationId, curve: HazardCurveSet) -> StoreResult<()>;
    fn store_map(&self, calculation: CalculationId, map: HazardMapSet) -> StoreResult<()>;
    fn read_curves(&self, calculation: CalculationId) -> StoreResult<Vec<HazardCurveSet>>;
    fn read_maps(&self, calculation: CalculationId) -> StoreResult<Vec<HazardMapSet>>;
}
