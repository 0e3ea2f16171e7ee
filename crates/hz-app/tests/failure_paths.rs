//! Calculations that stop before their completion barrier.

use std::path::PathBuf;
use std::sync::Arc;

use hz_aggregate::{HazardCurveSet, HazardMapSet};
use hz_app::{CalcError, CalculationOptions, execute_calculation, get_results, run_calculation};
use hz_core::{CalculationId, Imt, Ordinal, RuptureId};
use hz_gmf::GmfSiteRecord;
use hz_job::{ImtLevels, JobConfig, load_yaml};
use hz_source::{Mfd, Rupture};
use hz_store::{
    CalculationRecord, CalculationStatus, GmfSetRecord, HazardRepository, MemoryRepository,
    RealizationRecord, SesRecord, SetId, StoreResult, StoredRupture,
};
use hz_tasks::{ProgressSnapshot, RealizationStatus};

fn demo_job() -> JobConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos/two_site_job.yaml");
    load_yaml(&path).expect("demo job should load")
}

#[test]
fn invalid_job_is_rejected_before_registration() {
    let mut job = demo_job();
    job.calculation.ses_per_logic_tree_path = 0;
    let repo = MemoryRepository::new();
    let err = execute_calculation(&job, &repo, &CalculationOptions::default()).unwrap_err();
    assert!(matches!(err, CalcError::Configuration(_)));
    assert!(repo.calculation(CalculationId::from_index(0)).is_err());
}

#[test]
fn cancelled_calculation_is_marked_failed() {
    let options = CalculationOptions::default();
    options.cancel.cancel();
    let repo = MemoryRepository::new();
    let err = execute_calculation(&demo_job(), &repo, &options).unwrap_err();
    assert!(matches!(err, CalcError::Cancelled));

    let id = CalculationId::from_index(0);
    let results = get_results(&repo, id).unwrap();
    assert_eq!(results.calculation.status, CalculationStatus::Failed);
    assert!(results.curves.is_empty());
    let progress = repo.get_progress(id).unwrap();
    assert_eq!(progress.done, 0);
}

#[test]
fn simulation_failure_fails_realizations_and_calculation() {
    // spatial correlation is undefined for PGV, which every unit hits
    let mut job = demo_job();
    job.calculation.intensity_measure_types_and_levels = vec![ImtLevels {
        imt: Imt::Pgv,
        levels: vec![1.0, 5.0, 10.0],
    }];
    let repo = MemoryRepository::new();
    let err = execute_calculation(&job, &repo, &CalculationOptions::default()).unwrap_err();
    match &err {
        CalcError::Unit(failure) => {
            assert!(failure.cause.contains("PGV"), "{}", failure.cause);
            assert!(!failure.source_id.is_empty());
        }
        other => panic!("unexpected error {other:?}"),
    }

    let id = CalculationId::from_index(0);
    let results = get_results(&repo, id).unwrap();
    assert_eq!(results.calculation.status, CalculationStatus::Failed);
    assert!(
        results
            .realizations
            .iter()
            .any(|r| r.status == RealizationStatus::Failed)
    );
    assert!(results.curves.is_empty());
    assert!(results.maps.is_empty());

    // rows of failed realizations are kept but left out of the merged view
    let (complete_id, _) = results.complete_logic_tree_ses().unwrap();
    let merged = repo.read_ruptures(*complete_id).unwrap();
    let failed: Vec<_> = results
        .realizations
        .iter()
        .filter(|r| r.status == RealizationStatus::Failed)
        .map(|r| r.ordinal)
        .collect();
    let owners: Vec<_> = results
        .event_sets
        .iter()
        .filter(|(_, record)| record.realization.is_some_and(|o| failed.contains(&o)))
        .map(|(id, _)| *id)
        .collect();
    assert!(merged.iter().all(|r| !owners.contains(&r.ses)));
}

#[test]
fn broken_branch_fails_its_realization_only() {
    // pushes fault-a's maximum magnitude below its minimum
    let mut job = demo_job();
    job.calculation.number_of_logic_tree_samples = 0;
    job.logic_tree.branch_sets[1].branches[0].uncertainty =
        hz_logictree::Uncertainty::MaxMagRelative { delta: -2.0 };
    let repo = MemoryRepository::new();
    let err = execute_calculation(&job, &repo, &CalculationOptions::default()).unwrap_err();
    match &err {
        CalcError::Unit(failure) => assert_eq!(failure.source_id, "fault-a"),
        other => panic!("unexpected error {other:?}"),
    }

    let id = CalculationId::from_index(0);
    let results = get_results(&repo, id).unwrap();
    assert_eq!(results.calculation.status, CalculationStatus::Failed);
    let failed: Vec<_> = results
        .realizations
        .iter()
        .filter(|r| r.status == RealizationStatus::Failed)
        .collect();
    let complete: Vec<_> = results
        .realizations
        .iter()
        .filter(|r| r.status == RealizationStatus::Complete)
        .collect();
    assert_eq!((failed.len(), complete.len()), (1, 1));
    assert_eq!(failed[0].path, vec!["b1".to_string(), "mmax-low".to_string()]);
    assert_eq!(complete[0].completed_items, complete[0].total_items);
    assert!(results.curves.is_empty());
}

#[test]
fn runaway_source_rate_fails_the_calculation() {
    let mut job = demo_job();
    if let Mfd::TruncatedGutenbergRichter { a_val, .. } = &mut job.source_models[0].sources[0].mfd
    {
        *a_val = 30.0;
    }
    let repo = Arc::new(MemoryRepository::new());
    let handle = run_calculation(job, repo.clone()).unwrap();
    let id = handle.id();
    match handle.join() {
        Err(CalcError::Unit(failure)) => {
            assert_eq!(failure.source_id, "fault-a");
            assert!(failure.cause.contains("limit"), "{}", failure.cause);
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    let results = get_results(repo.as_ref(), id).unwrap();
    assert_eq!(results.calculation.status, CalculationStatus::Failed);
    assert!(
        results
            .realizations
            .iter()
            .all(|r| r.status == RealizationStatus::Failed)
    );
}

/// Repository whose ground-motion writes panic.
#[derive(Default)]
struct PanickingGmfWrites {
    inner: MemoryRepository,
}

impl HazardRepository for PanickingGmfWrites {
    fn create_calculation(&self, description: &str, digest: &str) -> StoreResult<CalculationId> {
        self.inner.create_calculation(description, digest)
    }
    fn calculation(&self, calculation: CalculationId) -> StoreResult<CalculationRecord> {
        self.inner.calculation(calculation)
    }
    fn set_status(&self, calculation: CalculationId, status: CalculationStatus) -> StoreResult<()> {
        self.inner.set_status(calculation, status)
    }
    fn create_realization(
        &self,
        calculation: CalculationId,
        record: RealizationRecord,
    ) -> StoreResult<()> {
        self.inner.create_realization(calculation, record)
    }
    fn set_realization_status(
        &self,
        calculation: CalculationId,
        ordinal: Ordinal,
        status: RealizationStatus,
    ) -> StoreResult<()> {
        self.inner.set_realization_status(calculation, ordinal, status)
    }
    fn read_realizations(&self, calculation: CalculationId) -> StoreResult<Vec<RealizationRecord>> {
        self.inner.read_realizations(calculation)
    }
    fn create_ses(&self, calculation: CalculationId, record: SesRecord) -> StoreResult<SetId> {
        self.inner.create_ses(calculation, record)
    }
    fn create_gmf_set(&self, calculation: CalculationId, ses: SetId) -> StoreResult<SetId> {
        self.inner.create_gmf_set(calculation, ses)
    }
    fn read_ses(&self, calculation: CalculationId) -> StoreResult<Vec<(SetId, SesRecord)>> {
        self.inner.read_ses(calculation)
    }
    fn read_gmf_sets(
        &self,
        calculation: CalculationId,
    ) -> StoreResult<Vec<(SetId, GmfSetRecord)>> {
        self.inner.read_gmf_sets(calculation)
    }
    fn append_ruptures(&self, ses: SetId, ruptures: Vec<Rupture>) -> StoreResult<Vec<RuptureId>> {
        self.inner.append_ruptures(ses, ruptures)
    }
    fn read_ruptures(&self, ses: SetId) -> StoreResult<Vec<StoredRupture>> {
        self.inner.read_ruptures(ses)
    }
    fn append_gmf_rows(&self, _gmf_set: SetId, _records: Vec<GmfSiteRecord>) -> StoreResult<()> {
        panic!("ground-motion storage is gone");
    }
    fn read_gmf(&self, gmf_set: SetId) -> StoreResult<Vec<GmfSiteRecord>> {
        self.inner.read_gmf(gmf_set)
    }
    fn increment_progress(
        &self,
        calculation: CalculationId,
        ordinal: Ordinal,
        items: u64,
    ) -> StoreResult<u64> {
        self.inner.increment_progress(calculation, ordinal, items)
    }
    fn get_progress(&self, calculation: CalculationId) -> StoreResult<ProgressSnapshot> {
        self.inner.get_progress(calculation)
    }
    fn store_curve(&self, calculation: CalculationId, curve: HazardCurveSet) -> StoreResult<()> {
        self.inner.store_curve(calculation, curve)
    }
    fn store_map(&self, calculation: CalculationId, map: HazardMapSet) -> StoreResult<()> {
        self.inner.store_map(calculation, map)
    }
    fn read_curves(&self, calculation: CalculationId) -> StoreResult<Vec<HazardCurveSet>> {
        self.inner.read_curves(calculation)
    }
    fn read_maps(&self, calculation: CalculationId) -> StoreResult<Vec<HazardMapSet>> {
        self.inner.read_maps(calculation)
    }
}

#[test]
fn panicking_worker_leaves_a_failed_calculation() {
    let repo = Arc::new(PanickingGmfWrites::default());
    let handle = run_calculation(demo_job(), repo.clone()).unwrap();
    let id = handle.id();
    assert!(matches!(handle.join(), Err(CalcError::WorkerPanicked)));

    let results = get_results(repo.as_ref(), id).unwrap();
    assert_eq!(results.calculation.status, CalculationStatus::Failed);
    assert!(!results.realizations.is_empty());
    assert!(
        results
            .realizations
            .iter()
            .all(|r| r.status == RealizationStatus::Failed)
    );
    assert!(results.curves.is_empty());
}
