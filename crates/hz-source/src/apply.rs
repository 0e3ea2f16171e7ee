//! Apply a realization's branch choices to the calculation's source models.

use hz_logictree::{Branch, Uncertainty};

use crate::error::{SourceModelError, SourceResult};
use crate::source::SourceModel;

/// Build the realization-specific source model.
///
/// The source-model branch picks one of `models` by name (a tree without one
/// is only valid for a single model); MFD uncertainties then rewrite the
/// sources they apply to. Ground-motion branches are ignored here.
pub fn apply_path(models: &[SourceModel], branches: &[&Branch]) -> SourceResult<SourceModel> {
    let selected = branches.iter().find_map(|b| match &b.uncertainty {
        Uncertainty::SourceModel { name } => Some(name.as_str()),
        _ => None,
    });

    let base = match (selected, models) {
        (Some(name), _) => models
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| SourceModelError::UnknownSourceModel {
                name: name.to_string(),
            })?,
        (None, [only]) => only,
        (None, _) => {
            return Err(SourceModelError::UnknownSourceModel {
                name: format!("<none selected among {} models>", models.len()),
            });
        }
    };

    let mut model = base.clone();
    for branch in branches {
        for source in model.sources.iter_mut().filter(|s| branch.applies_to(&s.id)) {
            let outcome = match branch.uncertainty {
                Uncertainty::MaxMagRelative { delta } => source.mfd.increment_max_mag(delta),
                Uncertainty::BValueRelative { delta } => source.mfd.increment_b(delta),
                Uncertainty::AbsoluteGutenbergRichter { a_val, b_val } => {
                    source.mfd.set_ab(a_val, b_val)
                }
                Uncertainty::SourceModel { .. } | Uncertainty::GroundMotionModel { .. } => Ok(()),
            };
            outcome.map_err(|reason| SourceModelError::InvalidMfd {
                source_id: source.id.clone(),
                reason: format!("branch {}: {reason}", branch.id),
            })?;
        }
    }
    Ok(model)
}
