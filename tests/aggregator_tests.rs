//! Trip aggregator tests
//!
//! Partial-failure semantics, totals and grouping over whole runs.

mod fixtures;

use milk_run_planner::aggregator::{RunOptions, TripAggregator, TripGroups, TripKey, TripOutcome};
use milk_run_planner::distance::{DistanceTable, EuclideanMatrix, ScaleFactor};
use milk_run_planner::error::{DataIntegrityError, TripError};
use milk_run_planner::solver::{SolveOptions, Strategy};
use milk_run_planner::traits::{Stop, StopId, VendorTable};

use fixtures::*;

// ============================================================================
// Helpers
// ============================================================================

fn groups(entries: &[(TripKey, &[&str])]) -> TripGroups {
    entries
        .iter()
        .map(|(key, stops)| (key.clone(), stops.iter().map(|s| StopId::new(s)).collect()))
        .collect()
}

fn table(entries: &[(&str, &str, f64)]) -> DistanceTable {
    let mut table = DistanceTable::new(ScaleFactor::new(1000).unwrap());
    for &(from, to, km) in entries {
        table.insert(from.into(), to.into(), km);
        table.insert(to.into(), from.into(), km);
    }
    table
}

fn sequential() -> RunOptions {
    RunOptions {
        parallel: false,
        ..RunOptions::default()
    }
}

// ============================================================================
// Partial failures
// ============================================================================

#[test]
fn missing_pair_fails_only_its_trip() {
    // A-B is missing; the C/D trip is complete.
    let distances = table(&[
        ("DIT", "A", 10.0),
        ("DIT", "B", 12.0),
        ("DIT", "C", 4.0),
        ("DIT", "D", 5.0),
        ("C", "D", 3.0),
    ]);
    let broken = TripKey::new("Mon", "TRK-01", 1);
    let healthy = TripKey::new("Mon", "TRK-01", 2);
    let trips = groups(&[(broken.clone(), &["A", "B"]), (healthy.clone(), &["C", "D"])]);

    let report = TripAggregator::new(sequential()).run(&trips, &distances);

    match report.outcome(&broken) {
        Some(TripOutcome::Failed(TripError::Data(DataIntegrityError::MissingDistance { from, to }))) => {
            assert_eq!((from.as_str(), to.as_str()), ("A", "B"));
        }
        other => panic!("expected missing distance, got {:?}", other),
    }

    let routed = report.outcome(&healthy).and_then(TripOutcome::routed).unwrap();
    assert_eq!(routed.distance, 12.0);
    assert_eq!(routed.stops.first().map(StopId::as_str), Some("DIT"));
    assert_eq!(routed.stops.last().map(StopId::as_str), Some("DIT"));

    assert_eq!(report.failures().count(), 1);
    assert_eq!(report.totals.grand_total(), 12.0);
    assert_eq!(report.totals.trip_total(&broken), Some(0.0));
}

#[test]
fn unknown_coordinate_fails_only_its_trip() {
    let vendors = scenario_vendors();
    let source = EuclideanMatrix::new(&vendors, ScaleFactor::new(100_000).unwrap());
    let bad = TripKey::new("Mon", "TRK-01", 1);
    let good = TripKey::new("Mon", "TRK-01", 2);
    let trips = groups(&[(bad.clone(), &["VND1", "GHOST"]), (good.clone(), &["VND1", "VND2", "VND3"])]);

    let report = TripAggregator::new(sequential()).run(&trips, &source);

    assert!(matches!(
        report.outcome(&bad),
        Some(TripOutcome::Failed(TripError::Data(DataIntegrityError::MissingCoordinate { .. })))
    ));
    let routed = report.outcome(&good).and_then(TripOutcome::routed).unwrap();
    assert!((routed.distance - 0.90076).abs() < 1e-9);
}

#[test]
fn depot_only_trip_is_reported_empty() {
    let distances = table(&[("DIT", "A", 1.0)]);
    let empty = TripKey::new("Tue", "TRK-01", 1);
    let trips = groups(&[(empty.clone(), &["DIT"]), (TripKey::new("Tue", "TRK-01", 2), &["A"])]);

    let report = TripAggregator::new(sequential()).run(&trips, &distances);

    match report.outcome(&empty) {
        Some(TripOutcome::Empty(trip)) => {
            assert_eq!(trip.stops, vec![StopId::new("DIT")]);
            assert_eq!(trip.tour.order(), &[0]);
            assert_eq!(trip.distance, 0.0);
        }
        other => panic!("expected empty trip, got {:?}", other),
    }
    assert!(report.outcome(&empty).and_then(TripOutcome::routed).is_none());
    assert_eq!(report.failures().count(), 0);
    assert_eq!(report.totals.trip_total(&empty), Some(0.0));
    assert_eq!(report.totals.grand_total(), 2.0);
}

#[test]
fn empty_trip_draws_at_depot() {
    let vendors = scenario_vendors();
    let source = EuclideanMatrix::new(&vendors, ScaleFactor::default());
    let key = TripKey::new("Tue", "TRK-01", 1);
    let trips = groups(&[(key.clone(), &["DIT", "DIT"])]);

    let report = TripAggregator::new(sequential()).run(&trips, &source);
    let trip = report.outcome(&key).and_then(TripOutcome::trip).unwrap();

    assert_eq!(trip.polyline(&vendors).points(), &[DEPOT.stop().location]);
}

#[test]
fn oversized_table_entry_fails_only_its_trip() {
    let mut distances = table(&[("DIT", "B", 2.0), ("DIT", "C", 3.0), ("B", "C", 1.0)]);
    distances.insert("DIT".into(), "A".into(), 1e300);
    distances.insert("A".into(), "DIT".into(), 1.0);
    let broken = TripKey::new("Mon", "V", 1);
    let healthy = TripKey::new("Mon", "V", 2);
    let trips = groups(&[(broken.clone(), &["A"]), (healthy.clone(), &["B", "C"])]);

    // Default options: solved on the rayon pool.
    let report = TripAggregator::new(RunOptions::default()).run(&trips, &distances);

    assert!(matches!(
        report.outcome(&broken),
        Some(TripOutcome::Failed(TripError::Data(DataIntegrityError::InvalidDistance { .. })))
    ));
    let routed = report.outcome(&healthy).and_then(TripOutcome::routed).unwrap();
    assert_eq!(routed.distance, 6.0);
    assert_eq!(report.trips.len(), 2);
    assert_eq!(report.totals.grand_total(), 6.0);
}

#[test]
fn infinite_coordinate_fails_only_its_trip() {
    let mut vendors: VendorTable = scenario_vendors();
    vendors.insert(Stop::new("BAD", f64::INFINITY, 100.9));
    let source = EuclideanMatrix::new(&vendors, ScaleFactor::new(100_000).unwrap());
    let broken = TripKey::new("Mon", "V", 1);
    let healthy = TripKey::new("Mon", "V", 2);
    let trips = groups(&[(broken.clone(), &["VND1", "BAD"]), (healthy.clone(), &["VND1", "VND2", "VND3"])]);

    let report = TripAggregator::new(RunOptions::default()).run(&trips, &source);

    assert!(matches!(
        report.outcome(&broken),
        Some(TripOutcome::Failed(TripError::Data(DataIntegrityError::InvalidDistance { .. })))
    ));
    let routed = report.outcome(&healthy).and_then(TripOutcome::routed).unwrap();
    assert!((routed.distance - 0.90076).abs() < 1e-9);
    assert_eq!(report.failures().count(), 1);
}

// ============================================================================
// Stop sets and totals
// ============================================================================

#[test]
fn depot_is_anchored_once() {
    let distances = table(&[("DIT", "A", 1.0), ("DIT", "B", 2.0), ("A", "B", 1.5)]);
    let key = TripKey::new("Mon", "TRK-01", 1);
    let trips = groups(&[(key.clone(), &["A", "DIT", "B", "A"])]);

    let report = TripAggregator::new(sequential()).run(&trips, &distances);
    let routed = report.outcome(&key).and_then(TripOutcome::routed).unwrap();

    let depot_visits = routed.stops.iter().filter(|s| s.as_str() == "DIT").count();
    assert_eq!(depot_visits, 2, "depot only at start and end: {:?}", routed.stops);
    assert_eq!(routed.stops.len(), 4);
    assert_eq!(routed.distance, 4.5);
}

#[test]
fn totals_roll_up_by_vehicle_and_day() {
    let distances = table(&[
        ("DIT", "A", 1.0),
        ("DIT", "B", 2.0),
        ("DIT", "C", 3.0),
        ("A", "B", 1.0),
        ("A", "C", 1.0),
        ("B", "C", 1.0),
    ]);
    let trips = groups(&[
        (TripKey::new("Mon", "TRK-01", 1), &["A"]),
        (TripKey::new("Mon", "TRK-01", 2), &["B"]),
        (TripKey::new("Mon", "TRK-02", 1), &["C"]),
        (TripKey::new("Tue", "TRK-01", 1), &["A", "B"]),
    ]);

    let report = TripAggregator::new(sequential()).run(&trips, &distances);
    let totals = &report.totals;

    assert_eq!(totals.vehicle_day_total("Mon", Some("TRK-01")), Some(6.0));
    assert_eq!(totals.vehicle_day_total("Mon", Some("TRK-02")), Some(6.0));
    assert_eq!(totals.vehicle_day_total("Tue", Some("TRK-01")), Some(4.0));
    assert_eq!(totals.vehicle_day_totals().len(), 3);
    assert_eq!(totals.grand_total(), 16.0);

    let keys: Vec<String> = report.trips.iter().map(|trip| trip.key.to_string()).collect();
    assert_eq!(
        keys,
        vec!["Mon/TRK-01/trip 1", "Mon/TRK-01/trip 2", "Mon/TRK-02/trip 1", "Tue/TRK-01/trip 1"]
    );
}

#[test]
fn parallel_run_matches_sequential() {
    let vendors = vendor_table();
    let codes = vendor_codes();
    let mut trips = TripGroups::new();
    for (trip, chunk) in codes.chunks(3).enumerate() {
        let key = TripKey::new("Wed", "TRK-01", trip as u32 + 1);
        trips.insert(key, chunk.iter().map(|code| StopId::new(code)).collect());
    }

    for strategy in [Strategy::CheapestArc, Strategy::Savings] {
        let solve = SolveOptions::with_strategy(strategy);
        let source = EuclideanMatrix::new(&vendors, ScaleFactor::new(100_000).unwrap());

        let parallel = TripAggregator::new(RunOptions {
            solve: solve.clone(),
            parallel: true,
            ..RunOptions::default()
        })
        .run(&trips, &source);
        let serial = TripAggregator::new(RunOptions {
            solve,
            parallel: false,
            ..RunOptions::default()
        })
        .run(&trips, &source);

        assert_eq!(parallel, serial);
        assert_eq!(parallel.trips.len(), 4);
        assert!(parallel.failures().next().is_none());
    }
}

#[test]
fn routed_trip_polyline_follows_tour() {
    let vendors = scenario_vendors();
    let source = EuclideanMatrix::new(&vendors, ScaleFactor::new(100_000).unwrap());
    let key = TripKey::new("Mon", "TRK-01", 1);
    let trips = groups(&[(key.clone(), &["VND1", "VND2", "VND3"])]);

    let report = TripAggregator::new(sequential()).run(&trips, &source);
    let routed = report.outcome(&key).and_then(TripOutcome::routed).unwrap();
    let polyline = routed.polyline(&vendors);

    assert_eq!(polyline.points().len(), 5);
    assert_eq!(polyline.points().first(), Some(&DEPOT.stop().location));
    assert_eq!(polyline.points()[1], (13.45, 100.8));
}
