//! Calculation driver.
//!
//! A calculation runs in phases:
//! 1. validation and registration (the calculation id exists from here on)
//! 2. logic tree sampling and per-realization setup: source model, ground
//!    motion models, event sets and their ground-motion sets
//! 3. parallel work units, one per block of sources of one realization
//! 4. the completion barrier, then curves, statistics and maps
//!
//! Any error or panic after registration moves the calculation and its
//! unfinished realizations to `Failed`; rows already written stay in the
//! repository.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use hz_aggregate::{PostProcessed, RealizationCurves, post_process, realization_curves};
use hz_core::{CalculationId, Imt, RuptureId, SiteId, derive_seed, seed_stream};
use hz_gmf::{
    Correlation, CorrelationFactor, GmfParams, GmpeSelection, SiteCollection, simulate_ruptures,
};
use hz_job::{JobConfig, validate_job};
use hz_logictree::{Realization, sample};
use hz_source::{Rupture, SourceModel, apply_path, complete_lt_investigation_time, generate_unit};
use hz_store::{
    CalculationManifest, CalculationStatus, HazardRepository, RealizationRecord, ResultStore,
    SesRecord, SetId, config_digest,
};
use hz_tasks::{
    CancellationToken, ProgressSnapshot, ProgressTracker, RealizationStatus, TaskError, WorkUnit,
    partition, run_units,
};
use tracing::{debug, error, info, warn};

use crate::error::{CalcError, CalcResult, UnitFailure};
use crate::progress::{CalcProgressEvent, CalcStage};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Keeps ground-motion streams apart from the per-source rupture streams,
/// which use small indices under the same realization seed.
const GMF_STREAM_SALT: u64 = 0x676d_665f_7374_7265;

#[derive(Clone)]
pub struct CalculationOptions {
    pub engine_version: String,
    /// Where finished results are written, if anywhere.
    pub result_store: Option<ResultStore>,
    pub cancel: CancellationToken,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            engine_version: ENGINE_VERSION.to_string(),
            result_store: None,
            cancel: CancellationToken::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalculationOutcome {
    pub calculation_id: CalculationId,
    pub manifest: CalculationManifest,
    pub elapsed_wall_s: f64,
}

/// A calculation running on its own thread.
pub struct CalculationHandle {
    id: CalculationId,
    cancel: CancellationToken,
    thread: JoinHandle<CalcResult<CalculationOutcome>>,
}

impl CalculationHandle {
    pub fn id(&self) -> CalculationId {
        self.id
    }

    /// Stop scheduling work units; units already running finish.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    pub fn join(self) -> CalcResult<CalculationOutcome> {
        self.thread.join().map_err(|_| CalcError::WorkerPanicked)?
    }
}

/// Start a calculation in the background with default options.
pub fn run_calculation(
    job: JobConfig,
    repo: Arc<dyn HazardRepository>,
) -> CalcResult<CalculationHandle> {
    run_calculation_with_options(job, repo, CalculationOptions::default())
}

/// Validate and register the calculation, then run it on a new thread.
///
/// The returned handle carries the calculation id right away; progress can be
/// polled through the repository while the thread runs.
pub fn run_calculation_with_options(
    job: JobConfig,
    repo: Arc<dyn HazardRepository>,
    options: CalculationOptions,
) -> CalcResult<CalculationHandle> {
    let started = Instant::now();
    let id = register(&job, repo.as_ref(), &options)?;
    let cancel = options.cancel.clone();
    let thread = thread::spawn(move || drive(&job, repo.as_ref(), &options, id, &mut None, started));
    Ok(CalculationHandle { id, cancel, thread })
}

/// Run a calculation to completion on the calling thread.
pub fn execute_calculation(
    job: &JobConfig,
    repo: &dyn HazardRepository,
    options: &CalculationOptions,
) -> CalcResult<CalculationOutcome> {
    execute_calculation_with_progress(job, repo, options, None)
}

pub fn execute_calculation_with_progress(
    job: &JobConfig,
    repo: &dyn HazardRepository,
    options: &CalculationOptions,
    mut progress_cb: Option<&mut dyn FnMut(CalcProgressEvent)>,
) -> CalcResult<CalculationOutcome> {
    let started = Instant::now();
    emit_progress(
        &mut progress_cb,
        None,
        CalcStage::Validating,
        started,
        Some("Validating job".to_string()),
        None,
    );
    let id = register(job, repo, options)?;
    drive(job, repo, options, id, &mut progress_cb, started)
}

fn register(
    job: &JobConfig,
    repo: &dyn HazardRepository,
    options: &CalculationOptions,
) -> CalcResult<CalculationId> {
    validate_job(job)?;
    let digest = config_digest(job, &options.engine_version)?;
    let id = repo.create_calculation(&job.description, &digest)?;
    info!(calculation = %id, digest = %digest, "calculation registered");
    Ok(id)
}

fn drive(
    job: &JobConfig,
    repo: &dyn HazardRepository,
    options: &CalculationOptions,
    id: CalculationId,
    progress_cb: &mut Option<&mut dyn FnMut(CalcProgressEvent)>,
    started: Instant,
) -> CalcResult<CalculationOutcome> {
    let run = panic::catch_unwind(AssertUnwindSafe(|| {
        execute_phases(job, repo, options, id, progress_cb, started)
    }));
    let result = run.unwrap_or_else(|payload| {
        error!(calculation = %id, "calculation panicked: {}", panic_message(payload.as_ref()));
        Err(CalcError::WorkerPanicked)
    });
    match result {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            error!(calculation = %id, "calculation failed: {err}");
            mark_failed(repo, id);
            emit_progress(
                progress_cb,
                Some(id),
                CalcStage::Failed,
                started,
                Some(err.to_string()),
                None,
            );
            Err(err)
        }
    }
}

/// Move the calculation and every unfinished realization to `Failed`.
fn mark_failed(repo: &dyn HazardRepository, id: CalculationId) {
    if let Err(err) = repo.set_status(id, CalculationStatus::Failed) {
        warn!(calculation = %id, "could not mark calculation failed: {err}");
    }
    let records = match repo.read_realizations(id) {
        Ok(records) => records,
        Err(err) => {
            warn!(calculation = %id, "could not read realizations: {err}");
            return;
        }
    };
    for record in records.iter().filter(|r| {
        matches!(r.status, RealizationStatus::Pending | RealizationStatus::Running)
    }) {
        if let Err(err) = repo.set_realization_status(id, record.ordinal, RealizationStatus::Failed) {
            warn!(calculation = %id, ordinal = %record.ordinal, "could not mark realization failed: {err}");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[derive(Debug, Clone, Copy)]
struct SetPair {
    ses: SetId,
    gmf: SetId,
}

struct RealizationPlan {
    realization: Realization,
    model: SourceModel,
    gmpes: GmpeSelection,
    /// One pair per event set, in event set order.
    sets: Vec<SetPair>,
    units: Vec<WorkUnit>,
    /// Set when the realization's source model could not be built.
    failure: Option<UnitFailure>,
}

/// Read-only state shared by every work unit.
struct UnitContext<'a> {
    repo: &'a dyn HazardRepository,
    calculation: CalculationId,
    sites: &'a SiteCollection,
    imts: &'a [Imt],
    params: GmfParams,
    correlation: &'a Correlation,
    ses_per_path: u32,
    investigation_time: f64,
    tracker: &'a ProgressTracker,
}

fn execute_phases(
    job: &JobConfig,
    repo: &dyn HazardRepository,
    options: &CalculationOptions,
    id: CalculationId,
    progress_cb: &mut Option<&mut dyn FnMut(CalcProgressEvent)>,
    started: Instant,
) -> CalcResult<CalculationOutcome> {
    let params = &job.calculation;
    repo.set_status(id, CalculationStatus::Executing)?;

    emit_progress(
        progress_cb,
        Some(id),
        CalcStage::SamplingLogicTree,
        started,
        Some("Sampling logic tree".to_string()),
        None,
    );
    let mode = job.sampling_mode();
    let realizations = sample(&job.logic_tree, mode, params.random_seed)?;
    info!(calculation = %id, realizations = realizations.len(), enumeration = mode.is_enumeration(), "logic tree sampled");

    emit_progress(
        progress_cb,
        Some(id),
        CalcStage::PreparingRealizations,
        started,
        Some(format!("Preparing {} realizations", realizations.len())),
        None,
    );
    let sites = SiteCollection::new(job.sites.clone())?;
    let plans = realizations
        .into_iter()
        .map(|rlz| prepare_realization(job, repo, id, rlz))
        .collect::<CalcResult<Vec<_>>>()?;

    let weights: Vec<f64> = plans.iter().map(|p| p.realization.weight).collect();
    let complete_lt_time = complete_lt_investigation_time(
        &weights,
        mode.is_enumeration(),
        params.ses_per_logic_tree_path,
        params.investigation_time,
    );
    let complete_ses = repo.create_ses(id, SesRecord::complete_logic_tree(complete_lt_time))?;
    repo.create_gmf_set(id, complete_ses)?;
    debug!(calculation = %id, investigation_time = complete_lt_time, "complete logic tree sets created");

    let tracker = ProgressTracker::new(
        plans
            .iter()
            .map(|p| (p.realization.ordinal, p.model.len() as u64)),
    );
    for plan in &plans {
        let ordinal = plan.realization.ordinal;
        if let Some(failure) = &plan.failure {
            tracker.mark_failed(ordinal, failure.cause.clone())?;
            repo.set_realization_status(id, ordinal, RealizationStatus::Failed)?;
        } else {
            tracker.mark_running(ordinal)?;
            repo.set_realization_status(id, ordinal, RealizationStatus::Running)?;
        }
    }

    let jobs: Vec<(usize, WorkUnit)> = plans
        .iter()
        .enumerate()
        .flat_map(|(p, plan)| plan.units.iter().cloned().map(move |unit| (p, unit)))
        .collect();
    emit_progress(
        progress_cb,
        Some(id),
        CalcStage::Simulating,
        started,
        Some(format!("Running {} work units", jobs.len())),
        Some(tracker.snapshot()),
    );

    let imts = job.imts();
    let ctx = UnitContext {
        repo,
        calculation: id,
        sites: &sites,
        imts: &imts,
        params: job.gmf_params(),
        correlation: &params.gmf_correlation,
        ses_per_path: params.ses_per_logic_tree_path,
        investigation_time: params.investigation_time,
        tracker: &tracker,
    };
    let mut failures: Vec<UnitFailure> = plans.iter().filter_map(|p| p.failure.clone()).collect();
    failures.extend(
        run_units(jobs, &options.cancel, |(p, unit)| run_unit(&ctx, &plans[p], &unit))?
            .into_iter()
            .flatten(),
    );

    let mut failed = 0;
    for plan in &plans {
        let ordinal = plan.realization.ordinal;
        match tracker.status(ordinal)? {
            RealizationStatus::Complete => {
                repo.set_realization_status(id, ordinal, RealizationStatus::Complete)?
            }
            RealizationStatus::Failed => failed += 1,
            RealizationStatus::Pending | RealizationStatus::Running => {}
        }
    }
    if let Some(first) = failures.into_iter().next() {
        warn!(calculation = %id, failed_realizations = failed, "completion barrier stays closed");
        return Err(first.into());
    }

    let snapshot = tracker.snapshot();
    if !tracker.barrier_open() {
        return Err(CalcError::Incomplete {
            calculation: id.to_string(),
            reason: format!("{} of {} items done", snapshot.done, snapshot.total),
        });
    }
    emit_progress(
        progress_cb,
        Some(id),
        CalcStage::Aggregating,
        started,
        Some("Computing hazard curves and maps".to_string()),
        Some(snapshot),
    );

    repo.set_status(id, CalculationStatus::PostProcessing)?;
    let processed = aggregate(job, repo, id, &plans, &sites)?;
    for curve in &processed.curves {
        repo.store_curve(id, curve.clone())?;
    }
    for map in &processed.maps {
        repo.store_map(id, map.clone())?;
    }
    repo.set_status(id, CalculationStatus::Complete)?;
    info!(
        calculation = %id,
        curves = processed.curves.len(),
        maps = processed.maps.len(),
        "calculation complete"
    );

    let record = repo.calculation(id)?;
    let manifest = CalculationManifest {
        calculation_id: id,
        description: record.description,
        timestamp: chrono::Utc::now().to_rfc3339(),
        digest: record.digest,
        engine_version: options.engine_version.clone(),
        status: record.status,
        investigation_time: params.investigation_time,
        complete_lt_investigation_time: complete_lt_time,
        realizations: repo.read_realizations(id)?,
        curve_count: processed.curves.len(),
        map_count: processed.maps.len(),
    };

    if let Some(store) = &options.result_store {
        emit_progress(
            progress_cb,
            Some(id),
            CalcStage::SavingResults,
            started,
            Some("Saving results".to_string()),
            None,
        );
        store.save(&manifest, &processed.curves, &processed.maps)?;
    }

    emit_progress(
        progress_cb,
        Some(id),
        CalcStage::Completed,
        started,
        Some("Calculation completed".to_string()),
        None,
    );

    Ok(CalculationOutcome {
        calculation_id: id,
        manifest,
        elapsed_wall_s: started.elapsed().as_secs_f64(),
    })
}

fn prepare_realization(
    job: &JobConfig,
    repo: &dyn HazardRepository,
    id: CalculationId,
    realization: Realization,
) -> CalcResult<RealizationPlan> {
    let params = &job.calculation;
    let ordinal = realization.ordinal;
    let branches = realization.branches(&job.logic_tree);
    let gmpes = GmpeSelection::from_branches(&job.ground_motion_models, &branches)?;

    // A branch that breaks a source fails this realization only.
    let (model, failure) = match apply_path(&job.source_models, &branches) {
        Ok(model) => (model, None),
        Err(err) => {
            let failure = UnitFailure {
                ordinal,
                source_id: err.source_id().unwrap_or_default().to_string(),
                seed: realization.seed,
                cause: CalcError::from(err).to_string(),
            };
            warn!(calculation = %id, ordinal = %ordinal, "{failure}");
            let empty = SourceModel {
                name: String::new(),
                sources: Vec::new(),
            };
            (empty, Some(failure))
        }
    };
    let units = partition(model.len(), params.block_size)?;

    repo.create_realization(
        id,
        RealizationRecord {
            ordinal,
            weight: realization.weight,
            seed: realization.seed,
            path: realization.path.clone(),
            total_items: model.len() as u64,
            completed_items: 0,
            status: RealizationStatus::Pending,
        },
    )?;

    let set_count = if failure.is_some() {
        0
    } else {
        params.ses_per_logic_tree_path
    };
    let sets = (1..=set_count)
        .map(|index| {
            let ses = repo.create_ses(
                id,
                SesRecord::per_realization(ordinal, index, params.investigation_time),
            )?;
            let gmf = repo.create_gmf_set(id, ses)?;
            Ok(SetPair { ses, gmf })
        })
        .collect::<CalcResult<Vec<_>>>()?;

    debug!(
        calculation = %id,
        ordinal = %ordinal,
        model = %model.name,
        sources = model.len(),
        units = units.len(),
        path = ?realization.path,
        "realization prepared"
    );
    Ok(RealizationPlan {
        realization,
        model,
        gmpes,
        sets,
        units,
        failure,
    })
}

/// Run one unit and account for it.
///
/// A failing unit marks its realization failed and is reported as
/// `Ok(Some(failure))` so that sibling realizations keep running; later units
/// of a failed realization are skipped.
fn run_unit(
    ctx: &UnitContext<'_>,
    plan: &RealizationPlan,
    unit: &WorkUnit,
) -> CalcResult<Option<UnitFailure>> {
    let ordinal = plan.realization.ordinal;
    if ctx.tracker.status(ordinal)? == RealizationStatus::Failed {
        debug!(calculation = %ctx.calculation, ordinal = %ordinal, unit = unit.index, "skipping unit of failed realization");
        return Ok(None);
    }
    match simulate_unit(ctx, plan, unit) {
        Ok(ruptures) => {
            let done = match ctx.tracker.on_unit_complete(ordinal, unit.items()) {
                Ok(done) => done,
                Err(TaskError::AlreadyFailed { .. }) => return Ok(None),
                Err(err) => return Err(err.into()),
            };
            ctx.repo
                .increment_progress(ctx.calculation, ordinal, unit.items())?;
            debug!(
                calculation = %ctx.calculation,
                ordinal = %ordinal,
                unit = unit.index,
                ruptures,
                done,
                "work unit complete"
            );
            Ok(None)
        }
        Err(cause) => {
            let failure = UnitFailure {
                ordinal,
                source_id: plan
                    .model
                    .sources
                    .get(unit.sources.start)
                    .map(|s| s.id.clone())
                    .unwrap_or_default(),
                seed: plan.realization.seed,
                cause: cause.to_string(),
            };
            error!(calculation = %ctx.calculation, ordinal = %ordinal, unit = unit.index, "{failure}");
            ctx.tracker.mark_failed(ordinal, failure.cause.clone())?;
            if let Err(err) =
                ctx.repo
                    .set_realization_status(ctx.calculation, ordinal, RealizationStatus::Failed)
            {
                warn!(calculation = %ctx.calculation, ordinal = %ordinal, "could not mark realization failed: {err}");
            }
            Ok(Some(failure))
        }
    }
}

/// Generate the unit's ruptures, simulate their ground motion and store both.
/// Returns the number of ruptures produced.
fn simulate_unit(
    ctx: &UnitContext<'_>,
    plan: &RealizationPlan,
    unit: &WorkUnit,
) -> CalcResult<usize> {
    let sources = plan
        .model
        .sources
        .get(unit.sources.clone())
        .ok_or_else(|| CalcError::Task(format!("unit {} outside source model", unit.index)))?;
    let catalogs = generate_unit(
        sources,
        unit.sources.start,
        ctx.ses_per_path,
        ctx.investigation_time,
        plan.realization.seed,
    )?;

    let correlation = CorrelationFactor::for_imts(ctx.correlation, ctx.sites, ctx.imts)?;
    let mut produced = 0;
    for (catalog, sets) in catalogs.into_iter().zip(&plan.sets) {
        if catalog.ruptures.is_empty() {
            continue;
        }
        let ruptures = catalog.ruptures;
        let ids = ctx.repo.append_ruptures(sets.ses, ruptures.clone())?;
        let stored: Vec<(RuptureId, &Rupture)> = ids.iter().copied().zip(ruptures.iter()).collect();

        let ses_index = catalog.ordinal.index().unwrap_or_default();
        let mut rng = seed_stream(gmf_seed(plan.realization.seed, unit.index, ses_index));
        let batches = simulate_ruptures(
            &stored,
            ctx.sites,
            &plan.gmpes,
            &correlation,
            &ctx.params,
            &mut rng,
        )?;
        for batch in batches {
            ctx.repo.append_gmf_rows(sets.gmf, batch.into_records())?;
        }
        produced += ids.len();
    }
    Ok(produced)
}

/// Seed of the ground-motion stream of one unit and event set.
fn gmf_seed(realization_seed: u64, unit: usize, ses: u32) -> u64 {
    derive_seed(
        derive_seed(realization_seed ^ GMF_STREAM_SALT, unit as u64),
        u64::from(ses),
    )
}

fn aggregate(
    job: &JobConfig,
    repo: &dyn HazardRepository,
    id: CalculationId,
    plans: &[RealizationPlan],
    sites: &SiteCollection,
) -> CalcResult<PostProcessed> {
    let params = &job.calculation;
    let site_ids = sites.ids();
    let gmf_sets = repo.read_gmf_sets(id)?;

    let mut per_realization = Vec::with_capacity(plans.len());
    for plan in plans {
        let ordinal = plan.realization.ordinal;
        // values[imt][site]
        let mut values: Vec<BTreeMap<SiteId, Vec<f64>>> =
            vec![BTreeMap::new(); params.intensity_measure_types_and_levels.len()];
        for (set_id, _) in gmf_sets
            .iter()
            .filter(|(_, record)| record.realization == Some(ordinal))
        {
            for record in repo.read_gmf(*set_id)? {
                let Some(slot) = params
                    .intensity_measure_types_and_levels
                    .iter()
                    .position(|l| l.imt == record.imt)
                else {
                    continue;
                };
                values[slot]
                    .entry(record.site)
                    .or_default()
                    .extend(record.gmvs);
            }
        }

        let curves = params
            .intensity_measure_types_and_levels
            .iter()
            .zip(&values)
            .map(|(levels, gmvs)| {
                realization_curves(
                    ordinal,
                    levels.imt,
                    &levels.levels,
                    &site_ids,
                    gmvs,
                    params.ses_per_logic_tree_path,
                    params.investigation_time,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        per_realization.push(RealizationCurves {
            ordinal,
            weight: plan.realization.weight,
            curves,
        });
    }

    Ok(post_process(&per_realization, &job.statistics_request())?)
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(CalcProgressEvent)>,
    calculation: Option<CalculationId>,
    stage: CalcStage,
    started: Instant,
    message: Option<String>,
    progress: Option<ProgressSnapshot>,
) {
    if let Some(cb) = progress_cb.as_mut() {
        let mut event =
            CalcProgressEvent::stage(calculation, stage, started.elapsed().as_secs_f64(), message);
        event.progress = progress;
        cb(event);
    }
}
