//! Sparse ground-motion batches.
//!
//! A batch holds one IMT and is laid out per site: for every site with at
//! least one non-zero value there is one record with parallel `rupture_ids`
//! and `gmvs` columns. Zero values are dropped when the batch is built, so a
//! persisted batch never contains them.

use hz_core::{Imt, RuptureId, SiteId};
use serde::{Deserialize, Serialize};

use crate::error::{SimResult, SimulationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GmfSiteRecord {
    pub site: SiteId,
    pub imt: Imt,
    pub rupture_ids: Vec<RuptureId>,
    pub gmvs: Vec<f64>,
}

impl GmfSiteRecord {
    pub fn len(&self) -> usize {
        self.gmvs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gmvs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GmfBatch {
    imt: Imt,
    records: Vec<GmfSiteRecord>,
}

impl GmfBatch {
    /// Build a batch from a `sites x ruptures` matrix.
    pub fn from_matrix(
        imt: Imt,
        site_ids: &[SiteId],
        rupture_ids: &[RuptureId],
        matrix: &[Vec<f64>],
    ) -> SimResult<Self> {
        if matrix.len() != site_ids.len() {
            return Err(SimulationError::ShapeMismatch {
                what: format!("{} rows for {} sites", matrix.len(), site_ids.len()),
            });
        }
        let mut records = Vec::new();
        for (&site, row) in site_ids.iter().zip(matrix) {
            if row.len() != rupture_ids.len() {
                return Err(SimulationError::ShapeMismatch {
                    what: format!(
                        "site {site}: {} values for {} ruptures",
                        row.len(),
                        rupture_ids.len()
                    ),
                });
            }
            let mut record = GmfSiteRecord {
                site,
                imt,
                rupture_ids: Vec::new(),
                gmvs: Vec::new(),
            };
            for (&rupture, &value) in rupture_ids.iter().zip(row) {
                if !value.is_finite() || value < 0.0 {
                    return Err(SimulationError::NonFinite {
                        what: "ground motion value",
                        value,
                    });
                }
                if value != 0.0 {
                    record.rupture_ids.push(rupture);
                    record.gmvs.push(value);
                }
            }
            if !record.is_empty() {
                records.push(record);
            }
        }
        Ok(Self { imt, records })
    }

    pub fn imt(&self) -> Imt {
        self.imt
    }

    pub fn records(&self) -> &[GmfSiteRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<GmfSiteRecord> {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of stored (site, rupture) values.
    pub fn value_count(&self) -> usize {
        self.records.iter().map(GmfSiteRecord::len).sum()
    }

    /// Flattened `(site, rupture, value)` view.
    pub fn triples(&self) -> impl Iterator<Item = (SiteId, RuptureId, f64)> + '_ {
        self.records.iter().flat_map(|r| {
            r.rupture_ids
                .iter()
                .zip(&r.gmvs)
                .map(move |(&rupture, &gmv)| (r.site, rupture, gmv))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ruptures(n: u64) -> Vec<RuptureId> {
        (0..n).map(RuptureId::from_index).collect()
    }

    fn sites(n: u32) -> Vec<SiteId> {
        (0..n).map(SiteId).collect()
    }

    #[test]
    fn all_zero_site_produces_no_record() {
        let matrix = vec![vec![1.0, 1.0], vec![1.0, 1.0], vec![0.0, 0.0]];
        let batch = GmfBatch::from_matrix(Imt::Pga, &sites(3), &ruptures(2), &matrix).unwrap();
        assert_eq!(batch.records().len(), 2);
        assert_eq!(batch.value_count(), 4);
        assert!(batch.records().iter().all(|r| r.site != SiteId(2)));
    }

    #[test]
    fn zeros_are_dropped_from_the_columns() {
        let matrix = vec![vec![0.0, 0.0, 1.0]];
        let batch = GmfBatch::from_matrix(Imt::sa(0.1), &sites(1), &ruptures(3), &matrix).unwrap();
        let records = batch.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].gmvs, vec![1.0]);
        assert_eq!(records[0].rupture_ids.iter().map(|r| r.get()).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn shape_is_checked() {
        let matrix = vec![vec![0.5]];
        assert!(GmfBatch::from_matrix(Imt::Pga, &sites(2), &ruptures(1), &matrix).is_err());
        assert!(GmfBatch::from_matrix(Imt::Pga, &sites(1), &ruptures(2), &matrix).is_err());
    }

    #[test]
    fn triples_follow_site_order() {
        let matrix = vec![vec![0.2, 0.0], vec![0.0, 0.4]];
        let batch = GmfBatch::from_matrix(Imt::Pga, &sites(2), &ruptures(2), &matrix).unwrap();
        let triples: Vec<_> = batch.triples().map(|(s, r, v)| (s.0, r.get(), v)).collect();
        assert_eq!(triples, vec![(0, 1, 0.2), (1, 2, 0.4)]);
    }
}
