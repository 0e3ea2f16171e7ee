use hz_aggregate::{CurveKind, HazardCurveSet, HazardMapSet};
use hz_core::{CalculationId, Imt, Ordinal, SiteId};
use hz_store::*;
use hz_tasks::RealizationStatus;

fn manifest(index: u64) -> CalculationManifest {
    CalculationManifest {
        calculation_id: CalculationId::from_index(index),
        description: "two-site check".to_string(),
        timestamp: "2026-02-25T12:00:00Z".to_string(),
        digest: "abc".to_string(),
        engine_version: "0.1.0".to_string(),
        status: CalculationStatus::Complete,
        investigation_time: 50.0,
        complete_lt_investigation_time: 500.0,
        realizations: vec![RealizationRecord {
            ordinal: Ordinal(0),
            weight: 1.0,
            seed: 7,
            path: vec!["b1".to_string()],
            total_items: 3,
            completed_items: 3,
            status: RealizationStatus::Complete,
        }],
        curve_count: 1,
        map_count: 1,
    }
}

#[test]
fn save_and_load_results() {
    let temp_dir = std::env::temp_dir().join("hz_store_test");
    let _ = std::fs::remove_dir_all(&temp_dir);
    let store = ResultStore::new(temp_dir.clone()).unwrap();

    let curve = HazardCurveSet {
        imt: Imt::sa(0.2),
        kind: CurveKind::Quantile(0.85),
        imls: vec![0.1, 0.2],
        sites: vec![SiteId(0)],
        poes: vec![vec![0.3, 0.1]],
    };
    let map = HazardMapSet {
        imt: Imt::Pga,
        kind: CurveKind::Realization(Ordinal(0)),
        poe: 0.1,
        sites: vec![SiteId(0)],
        values: vec![0.2],
    };
    let m = manifest(0);
    store.save(&m, &[curve.clone()], &[map.clone()]).unwrap();

    let id = CalculationId::from_index(0);
    assert!(store.has_calculation(id));
    assert_eq!(store.load_manifest(id).unwrap(), m);
    assert_eq!(store.load_curves(id).unwrap(), vec![curve]);
    assert_eq!(store.load_maps(id).unwrap(), vec![map]);
}

#[test]
fn list_and_delete() {
    let temp_dir = std::env::temp_dir().join("hz_store_test_list");
    let _ = std::fs::remove_dir_all(&temp_dir);
    let store = ResultStore::new(temp_dir.clone()).unwrap();
    assert_eq!(store.next_calculation_id().unwrap().get(), 1);

    store.save(&manifest(1), &[], &[]).unwrap();
    store.save(&manifest(0), &[], &[]).unwrap();
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].calculation_id.get(), 1);
    assert_eq!(store.next_calculation_id().unwrap().get(), 3);

    store.delete(CalculationId::from_index(0)).unwrap();
    assert_eq!(store.list().unwrap().len(), 1);
    assert!(matches!(
        store.load_manifest(CalculationId::from_index(0)),
        Err(StoreError::CalculationNotFound(_))
    ));
    assert!(matches!(
        store.delete(CalculationId::from_index(0)),
        Err(StoreError::CalculationNotFound(_))
    ));
}
