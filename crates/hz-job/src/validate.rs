//! Job validation logic.

use std::collections::HashSet;

use hz_gmf::{AttenuationModel, SimulationError, SiteCollection};
use hz_logictree::{LogicTreeError, Uncertainty};
use hz_source::SourceModelError;

use crate::schema::{CalculationParams, JobConfig, LATEST_VERSION};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Logic tree: {0}")]
    LogicTree(#[from] LogicTreeError),

    #[error("Source model: {0}")]
    Source(#[from] SourceModelError),

    #[error("Simulation setup: {0}")]
    Simulation(#[from] SimulationError),
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_job(job: &JobConfig) -> Result<(), ValidationError> {
    if job.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: job.version,
        });
    }
    validate_params(&job.calculation)?;

    if job.sites.is_empty() {
        return Err(invalid("sites", 0, "at least one site is required"));
    }
    SiteCollection::new(job.sites.clone())?;

    if job.source_models.is_empty() {
        return Err(invalid("source_models", 0, "at least one source model is required"));
    }
    let mut names = HashSet::new();
    for model in &job.source_models {
        if !names.insert(model.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: model.name.clone(),
                context: "source_models".to_string(),
            });
        }
        model.validate()?;
    }

    job.logic_tree.validate()?;
    validate_tree_references(job, &names)?;
    Ok(())
}

fn validate_params(params: &CalculationParams) -> Result<(), ValidationError> {
    if params.ses_per_logic_tree_path == 0 {
        return Err(invalid("ses_per_logic_tree_path", 0, "must be at least 1"));
    }
    let t = params.investigation_time;
    if !(t.is_finite() && t > 0.0) {
        return Err(invalid("investigation_time", t, "must be positive"));
    }
    if let Some(level) = params.truncation_level
        && !(level.is_finite() && level >= 0.0)
    {
        return Err(invalid("truncation_level", level, "must be non-negative"));
    }
    let d = params.maximum_distance;
    if !(d.is_finite() && d > 0.0) {
        return Err(invalid("maximum_distance", d, "must be positive"));
    }
    if params.block_size == 0 {
        return Err(invalid("block_size", 0, "must be at least 1"));
    }

    if params.intensity_measure_types_and_levels.is_empty() {
        return Err(invalid(
            "intensity_measure_types_and_levels",
            0,
            "at least one IMT is required",
        ));
    }
    let mut imts = HashSet::new();
    for entry in &params.intensity_measure_types_and_levels {
        if !imts.insert(entry.imt) {
            return Err(ValidationError::DuplicateId {
                id: entry.imt.to_string(),
                context: "intensity_measure_types_and_levels".to_string(),
            });
        }
        let field = format!("levels of {}", entry.imt);
        if entry.levels.is_empty() {
            return Err(invalid(&field, "[]", "at least one level is required"));
        }
        if entry.levels.iter().any(|l| !(l.is_finite() && *l > 0.0)) {
            return Err(invalid(&field, format!("{:?}", entry.levels), "levels must be positive"));
        }
        if entry.levels.windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid(
                &field,
                format!("{:?}", entry.levels),
                "levels must be strictly increasing",
            ));
        }
    }

    for q in &params.quantile_hazard_curves {
        if !(0.0..=1.0).contains(q) {
            return Err(invalid("quantile_hazard_curves", q, "must lie in [0, 1]"));
        }
    }
    for p in &params.poes {
        if !(*p > 0.0 && *p < 1.0) {
            return Err(invalid("poes", p, "must lie in (0, 1)"));
        }
    }
    Ok(())
}

/// Branches must name existing source models and known ground-motion
/// models, and every tectonic region in use must resolve to a model.
fn validate_tree_references(job: &JobConfig, model_names: &HashSet<&str>) -> Result<(), ValidationError> {
    let mut selects_model = false;
    let mut gmpe_regions = HashSet::new();
    for set in &job.logic_tree.branch_sets {
        for branch in &set.branches {
            match &branch.uncertainty {
                Uncertainty::SourceModel { name } => {
                    selects_model = true;
                    if !model_names.contains(name.as_str()) {
                        return Err(ValidationError::MissingReference {
                            id: name.clone(),
                            context: format!("branch {}", branch.id),
                        });
                    }
                }
                Uncertainty::GroundMotionModel {
                    tectonic_region,
                    model,
                } => {
                    model.parse::<AttenuationModel>()?;
                    gmpe_regions.insert(tectonic_region.as_str());
                }
                _ => {}
            }
        }
    }
    if !selects_model && job.source_models.len() > 1 {
        return Err(invalid(
            "logic_tree",
            job.source_models.len(),
            "several source models need a source model branch set",
        ));
    }

    for (region, model) in &job.ground_motion_models {
        model.parse::<AttenuationModel>().map_err(|_| ValidationError::MissingReference {
            id: model.clone(),
            context: format!("ground motion model for {region}"),
        })?;
    }
    for source in job.source_models.iter().flat_map(|m| &m.sources) {
        let region = source.tectonic_region.as_str();
        if !job.ground_motion_models.contains_key(region) && !gmpe_regions.contains(region) {
            return Err(ValidationError::MissingReference {
                id: region.to_string(),
                context: format!("ground motion model for source {}", source.id),
            });
        }
    }
    Ok(())
}
