use hz_core::{Imt, Ordinal, Point, RuptureId, SiteId};
use hz_gmf::GmfSiteRecord;
use hz_source::{PlanarSurface, Rupture, SetOrdinal};
use hz_store::*;
use hz_tasks::RealizationStatus;

fn rupture(ses: u32, magnitude: f64) -> Rupture {
    let hypocenter = Point::new(0.0, 0.0, 10.0);
    Rupture {
        source_id: "s1".to_string(),
        tectonic_region: "Active Shallow Crust".to_string(),
        ses,
        magnitude,
        rake: 0.0,
        hypocenter,
        surface: PlanarSurface::from_magnitude(magnitude, hypocenter, 0.0, 90.0, 1.5, 0.0, 20.0),
        occurred: true,
    }
}

fn realization(ordinal: u32, total: u64) -> RealizationRecord {
    RealizationRecord {
        ordinal: Ordinal(ordinal),
        weight: 0.5,
        seed: u64::from(ordinal),
        path: vec![format!("b{ordinal}")],
        total_items: total,
        completed_items: 0,
        status: RealizationStatus::Pending,
    }
}

fn record(site: u32, ids: &[RuptureId]) -> GmfSiteRecord {
    GmfSiteRecord {
        site: SiteId(site),
        imt: Imt::Pga,
        rupture_ids: ids.to_vec(),
        gmvs: vec![0.1; ids.len()],
    }
}

#[test]
fn progress_is_summed_over_realizations() {
    let repo = MemoryRepository::new();
    let calc = repo.create_calculation("progress", "d").unwrap();
    repo.create_realization(calc, realization(0, 5)).unwrap();
    repo.create_realization(calc, realization(1, 3)).unwrap();
    repo.increment_progress(calc, Ordinal(0), 2).unwrap();
    repo.increment_progress(calc, Ordinal(1), 3).unwrap();

    let progress = repo.get_progress(calc).unwrap();
    assert_eq!((progress.done, progress.total), (5, 8));
    assert!(matches!(
        repo.increment_progress(calc, Ordinal(1), 1),
        Err(StoreError::ProgressOverflow { .. })
    ));
}

#[test]
fn complete_logic_tree_views_skip_failed_realizations() {
    let repo = MemoryRepository::new();
    let calc = repo.create_calculation("views", "d").unwrap();
    repo.create_realization(calc, realization(0, 1)).unwrap();
    repo.create_realization(calc, realization(1, 1)).unwrap();

    let ses0 = repo.create_ses(calc, SesRecord::per_realization(Ordinal(0), 1, 50.0)).unwrap();
    let ses1 = repo.create_ses(calc, SesRecord::per_realization(Ordinal(1), 1, 50.0)).unwrap();
    let complete = repo.create_ses(calc, SesRecord::complete_logic_tree(100.0)).unwrap();
    let gmf0 = repo.create_gmf_set(calc, ses0).unwrap();
    let gmf1 = repo.create_gmf_set(calc, ses1).unwrap();
    let gmf_complete = repo.create_gmf_set(calc, complete).unwrap();

    let ids0 = repo.append_ruptures(ses0, vec![rupture(1, 5.5), rupture(1, 6.0)]).unwrap();
    let ids1 = repo.append_ruptures(ses1, vec![rupture(1, 6.5)]).unwrap();
    assert_eq!(ids0.iter().map(|i| i.get()).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(ids1[0].get(), 3);

    repo.append_gmf_rows(gmf0, vec![record(0, &ids0)]).unwrap();
    repo.append_gmf_rows(gmf1, vec![record(0, &ids1), record(1, &ids1)]).unwrap();

    assert_eq!(repo.read_ruptures(complete).unwrap().len(), 3);
    assert_eq!(repo.read_gmf(gmf_complete).unwrap().len(), 3);

    repo.set_realization_status(calc, Ordinal(1), RealizationStatus::Failed).unwrap();
    assert_eq!(repo.read_ruptures(complete).unwrap().len(), 2);
    assert_eq!(repo.read_gmf(gmf_complete).unwrap().len(), 1);
    // the failed realization's own rows are still there
    assert_eq!(repo.read_gmf(gmf1).unwrap().len(), 2);

    let sets = repo.read_gmf_sets(calc).unwrap();
    let (_, last) = sets.last().unwrap();
    assert_eq!(last.ordinal, SetOrdinal::CompleteLogicTree);
    assert_eq!(last.investigation_time, 100.0);
    assert_eq!(last.realization, None);
}

#[test]
fn complete_sets_do_not_own_rows() {
    let repo = MemoryRepository::new();
    let calc = repo.create_calculation("views", "d").unwrap();
    let complete = repo.create_ses(calc, SesRecord::complete_logic_tree(10.0)).unwrap();
    assert!(repo.append_ruptures(complete, vec![rupture(1, 5.0)]).is_err());
    assert!(matches!(
        repo.create_ses(
            calc,
            SesRecord {
                realization: None,
                ordinal: SetOrdinal::PerRealization(1),
                investigation_time: 10.0,
            }
        ),
        Err(StoreError::Inconsistent { .. })
    ));
}

#[test]
fn status_moves_forward_only() {
    let repo = MemoryRepository::new();
    let calc = repo.create_calculation("status", "d").unwrap();
    repo.set_status(calc, CalculationStatus::Executing).unwrap();
    repo.set_status(calc, CalculationStatus::PostProcessing).unwrap();
    assert!(repo.set_status(calc, CalculationStatus::Executing).is_err());
    repo.set_status(calc, CalculationStatus::Complete).unwrap();
    assert!(repo.set_status(calc, CalculationStatus::Failed).is_err());
    assert_eq!(repo.calculation(calc).unwrap().status, CalculationStatus::Complete);
}

#[test]
fn calculation_ids_can_continue_an_existing_sequence() {
    let repo = MemoryRepository::with_first_id(hz_core::CalculationId::from_index(4));
    let first = repo.create_calculation("a", "digest").unwrap();
    let second = repo.create_calculation("b", "digest").unwrap();
    assert_eq!((first.get(), second.get()), (5, 6));
    assert_eq!(repo.calculation(second).unwrap().description, "b");
}
