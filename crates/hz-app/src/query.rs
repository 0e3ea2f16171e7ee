//! Read-side helpers for running and finished calculations.

use hz_aggregate::{HazardCurveSet, HazardMapSet};
use hz_core::CalculationId;
use hz_store::{
    CalculationManifest, CalculationRecord, HazardRepository, RealizationRecord, ResultStore,
    SesRecord, SetId,
};
use hz_tasks::ProgressSnapshot;

use crate::error::CalcResult;

/// Everything a finished calculation left in the repository.
#[derive(Debug, Clone)]
pub struct CalculationResults {
    pub calculation: CalculationRecord,
    pub realizations: Vec<RealizationRecord>,
    pub event_sets: Vec<(SetId, SesRecord)>,
    pub curves: Vec<HazardCurveSet>,
    pub maps: Vec<HazardMapSet>,
}

impl CalculationResults {
    /// The merged event set spanning every realization, if one was created.
    pub fn complete_logic_tree_ses(&self) -> Option<&(SetId, SesRecord)> {
        self.event_sets
            .iter()
            .find(|(_, record)| record.is_complete_logic_tree())
    }
}

/// Done/total items summed over realizations; safe to call while running.
pub fn get_progress(
    repo: &dyn HazardRepository,
    calculation: CalculationId,
) -> CalcResult<ProgressSnapshot> {
    Ok(repo.get_progress(calculation)?)
}

pub fn get_results(
    repo: &dyn HazardRepository,
    calculation: CalculationId,
) -> CalcResult<CalculationResults> {
    Ok(CalculationResults {
        calculation: repo.calculation(calculation)?,
        realizations: repo.read_realizations(calculation)?,
        event_sets: repo.read_ses(calculation)?,
        curves: repo.read_curves(calculation)?,
        maps: repo.read_maps(calculation)?,
    })
}

/// Manifests saved in a result store, oldest first.
pub fn list_saved(store: &ResultStore) -> CalcResult<Vec<CalculationManifest>> {
    Ok(store.list()?)
}

/// Delete a saved calculation from the result store.
pub fn remove_saved(store: &ResultStore, calculation: CalculationId) -> CalcResult<()> {
    Ok(store.delete(calculation)?)
}

pub fn load_saved(
    store: &ResultStore,
    calculation: CalculationId,
) -> CalcResult<(CalculationManifest, Vec<HazardCurveSet>, Vec<HazardMapSet>)> {
    let manifest = store.load_manifest(calculation)?;
    let curves = store.load_curves(calculation)?;
    let maps = store.load_maps(calculation)?;
    Ok((manifest, curves, maps))
}
