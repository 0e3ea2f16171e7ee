//! Job file schema.

use std::collections::BTreeMap;

use hz_aggregate::StatisticsRequest;
use hz_core::Imt;
use hz_gmf::{Correlation, GmfParams, Site};
use hz_logictree::{LogicTree, SamplingMode};
use hz_source::SourceModel;
use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobConfig {
    pub version: u32,
    #[serde(default)]
    pub description: String,
    pub calculation: CalculationParams,
    pub sites: Vec<Site>,
    pub source_models: Vec<SourceModel>,
    pub logic_tree: LogicTree,
    /// Default ground-motion model per tectonic region; ground-motion
    /// branches of the logic tree override these.
    #[serde(default)]
    pub ground_motion_models: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImtLevels {
    pub imt: Imt,
    pub levels: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalculationParams {
    pub random_seed: u64,
    /// 0 selects end-branch enumeration.
    #[serde(default)]
    pub number_of_logic_tree_samples: u32,
    pub ses_per_logic_tree_path: u32,
    /// Years covered by one stochastic event set.
    pub investigation_time: f64,
    pub intensity_measure_types_and_levels: Vec<ImtLevels>,
    #[serde(default)]
    pub truncation_level: Option<f64>,
    /// Integration distance (km).
    pub maximum_distance: f64,
    #[serde(default)]
    pub gmf_correlation: Correlation,
    #[serde(default)]
    pub mean_hazard_curves: bool,
    #[serde(default)]
    pub quantile_hazard_curves: Vec<f64>,
    #[serde(default)]
    pub poes: Vec<f64>,
    /// Sources per work unit.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
}

fn default_block_size() -> usize {
    10
}

impl JobConfig {
    pub fn sampling_mode(&self) -> SamplingMode {
        SamplingMode::from_sample_count(self.calculation.number_of_logic_tree_samples)
    }

    pub fn imts(&self) -> Vec<Imt> {
        self.calculation
            .intensity_measure_types_and_levels
            .iter()
            .map(|l| l.imt)
            .collect()
    }

    pub fn gmf_params(&self) -> GmfParams {
        GmfParams {
            truncation_level: self.calculation.truncation_level,
            maximum_distance: self.calculation.maximum_distance,
        }
    }

    pub fn statistics_request(&self) -> StatisticsRequest {
        StatisticsRequest {
            mean: self.calculation.mean_hazard_curves,
            quantiles: self.calculation.quantile_hazard_curves.clone(),
            poes: self.calculation.poes.clone(),
        }
    }
}
