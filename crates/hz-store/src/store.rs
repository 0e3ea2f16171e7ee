//! On-disk result store: one directory per calculation holding
//! `manifest.json`, `curves.jsonl` and `maps.jsonl`.

use std::fs;
use std::path::{Path, PathBuf};

use hz_aggregate::{HazardCurveSet, HazardMapSet};
use hz_core::CalculationId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::{CalculationStatus, RealizationRecord};
use crate::{StoreError, StoreResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationManifest {
    pub calculation_id: CalculationId,
    pub description: String,
    pub timestamp: String,
    pub digest: String,
    pub engine_version: String,
    pub status: CalculationStatus,
    pub investigation_time: f64,
    pub complete_lt_investigation_time: f64,
    pub realizations: Vec<RealizationRecord>,
    pub curve_count: usize,
    pub map_count: usize,
}

#[derive(Clone)]
pub struct ResultStore {
    root_dir: PathBuf,
}

impl ResultStore {
    pub fn new(root_dir: PathBuf) -> StoreResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Results next to a job file, under `.hazardflow/results`.
    pub fn for_job(job_path: &Path) -> StoreResult<Self> {
        let job_dir = job_path.parent().unwrap_or_else(|| Path::new("."));
        Self::new(job_dir.join(".hazardflow").join("results"))
    }

    fn calc_dir(&self, id: CalculationId) -> PathBuf {
        self.root_dir.join(format!("calc_{id}"))
    }

    pub fn has_calculation(&self, id: CalculationId) -> bool {
        self.calc_dir(id).join("manifest.json").exists()
    }

    pub fn save(
        &self,
        manifest: &CalculationManifest,
        curves: &[HazardCurveSet],
        maps: &[HazardMapSet],
    ) -> StoreResult<()> {
        let dir = self.calc_dir(manifest.calculation_id);
        fs::create_dir_all(&dir)?;
        fs::write(
            dir.join("manifest.json"),
            serde_json::to_string_pretty(manifest)?,
        )?;
        write_jsonl(&dir.join("curves.jsonl"), curves)?;
        write_jsonl(&dir.join("maps.jsonl"), maps)?;
        Ok(())
    }

    pub fn load_manifest(&self, id: CalculationId) -> StoreResult<CalculationManifest> {
        let path = self.calc_dir(id).join("manifest.json");
        if !path.exists() {
            return Err(StoreError::CalculationNotFound(id));
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn load_curves(&self, id: CalculationId) -> StoreResult<Vec<HazardCurveSet>> {
        read_jsonl(&self.calc_dir(id).join("curves.jsonl"), id)
    }

    pub fn load_maps(&self, id: CalculationId) -> StoreResult<Vec<HazardMapSet>> {
        read_jsonl(&self.calc_dir(id).join("maps.jsonl"), id)
    }

    /// Manifests of every stored calculation, oldest id first.
    pub fn list(&self) -> StoreResult<Vec<CalculationManifest>> {
        let mut manifests = Vec::new();
        if !self.root_dir.exists() {
            return Ok(manifests);
        }
        for entry in fs::read_dir(&self.root_dir)? {
            let path = entry?.path();
            let manifest_path = path.join("manifest.json");
            if path.is_dir() && manifest_path.exists() {
                let content = fs::read_to_string(manifest_path)?;
                if let Ok(manifest) = serde_json::from_str::<CalculationManifest>(&content) {
                    manifests.push(manifest);
                }
            }
        }
        manifests.sort_by_key(|m| m.calculation_id);
        Ok(manifests)
    }

    /// First id not used by any stored calculation.
    pub fn next_calculation_id(&self) -> StoreResult<CalculationId> {
        let next = self
            .list()?
            .last()
            .map(|m| m.calculation_id.index() + 1)
            .unwrap_or(0);
        Ok(CalculationId::from_index(next))
    }

    /// Remove a saved calculation and everything written for it.
    pub fn delete(&self, id: CalculationId) -> StoreResult<()> {
        let dir = self.calc_dir(id);
        if !dir.exists() {
            return Err(StoreError::CalculationNotFound(id));
        }
        fs::remove_dir_all(dir)?;
        Ok(())
    }
}

fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> StoreResult<()> {
    let mut content = String::new();
    for record in records {
        content.push_str(&serde_json::to_string(record)?);
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}

fn read_jsonl<T: DeserializeOwned>(path: &Path, id: CalculationId) -> StoreResult<Vec<T>> {
    if !path.exists() {
        return Err(StoreError::CalculationNotFound(id));
    }
    let content = fs::read_to_string(path)?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(StoreError::from))
        .collect()
}
