//! Trip aggregator.
//!
//! Groups schedule rows into trips, solves each trip independently and
//! accumulates per-trip, per-(day, vehicle) and grand-total distances. A
//! failing trip is recorded and never blocks the rest of the run.

use std::collections::BTreeMap;
use std::fmt;

use rayon::prelude::*;
use serde::{Serialize, Serializer};
use tracing::{info, warn};

use crate::error::TripError;
use crate::ingest::ScheduleRow;
use crate::polyline::Polyline;
use crate::solver::{SolveOptions, Tour, solve_with_options};
use crate::stop_set::StopSet;
use crate::traits::{DEFAULT_DEPOT_ID, DistanceSource, StopId, VendorTable};

/// Identifies one trip group. Ordered by day, then vehicle, then trip.
///
/// Coarser groupings leave the vehicle and/or trip unset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TripKey {
    pub day: String,
    pub vehicle: Option<String>,
    pub trip: Option<u32>,
}

impl TripKey {
    pub fn new(day: impl Into<String>, vehicle: impl Into<String>, trip: u32) -> Self {
        Self {
            day: day.into(),
            vehicle: Some(vehicle.into()),
            trip: Some(trip),
        }
    }
}

impl fmt::Display for TripKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.day)?;
        if let Some(vehicle) = &self.vehicle {
            write!(f, "/{}", vehicle)?;
        }
        if let Some(trip) = self.trip {
            write!(f, "/trip {}", trip)?;
        }
        Ok(())
    }
}

/// Granularity at which schedule rows become trip groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Grouping {
    Day,
    DayVehicle,
    #[default]
    DayVehicleTrip,
}

impl Grouping {
    pub fn key(&self, row: &ScheduleRow) -> TripKey {
        let (vehicle, trip) = match self {
            Grouping::Day => (None, None),
            Grouping::DayVehicle => (Some(row.vehicle.clone()), None),
            Grouping::DayVehicleTrip => (Some(row.vehicle.clone()), Some(row.trip)),
        };
        TripKey {
            day: row.day.clone(),
            vehicle,
            trip,
        }
    }
}

/// Raw visitation lists keyed by trip group.
pub type TripGroups = BTreeMap<TripKey, Vec<StopId>>;

/// Collapses schedule rows into trip groups.
///
/// Within a group, stops keep schedule order: by trip number, then by row.
pub fn group_schedule(rows: &[ScheduleRow], grouping: Grouping) -> TripGroups {
    let mut ordered: Vec<&ScheduleRow> = rows.iter().collect();
    ordered.sort_by_key(|row| row.trip);

    let mut groups = TripGroups::new();
    for row in ordered {
        groups.entry(grouping.key(row)).or_default().push(row.stop.clone());
    }
    groups
}

/// Settings for a whole aggregation run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub solve: SolveOptions,
    pub grouping: Grouping,
    pub depot: StopId,
    /// Solve trip groups on the rayon thread pool.
    pub parallel: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            solve: SolveOptions::default(),
            grouping: Grouping::default(),
            depot: StopId::new(DEFAULT_DEPOT_ID),
            parallel: true,
        }
    }
}

/// A successfully routed trip, ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedTrip {
    /// Stop identifiers in visiting order, depot first and last.
    pub stops: Vec<StopId>,
    pub tour: Tour,
    /// Tour length in the distance source's original unit.
    pub distance: f64,
}

impl RoutedTrip {
    /// The zero-length trip that stays at the depot.
    pub fn depot_only(depot: StopId) -> Self {
        Self {
            stops: vec![depot],
            tour: Tour::depot_only(),
            distance: 0.0,
        }
    }

    /// Map overlay geometry for this trip.
    pub fn polyline(&self, vendors: &VendorTable) -> Polyline {
        Polyline::for_stops(&self.stops, vendors)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TripOutcome {
    Routed(RoutedTrip),
    /// Nothing to visit besides the depot; carries the zero-length tour.
    Empty(RoutedTrip),
    Failed(#[serde(serialize_with = "serialize_display")] TripError),
}

impl TripOutcome {
    /// Distance contributed to the totals.
    pub fn distance(&self) -> f64 {
        match self {
            TripOutcome::Routed(trip) | TripOutcome::Empty(trip) => trip.distance,
            TripOutcome::Failed(_) => 0.0,
        }
    }

    /// The tour to present, including the trivial tour of an empty trip.
    pub fn trip(&self) -> Option<&RoutedTrip> {
        match self {
            TripOutcome::Routed(trip) | TripOutcome::Empty(trip) => Some(trip),
            TripOutcome::Failed(_) => None,
        }
    }

    pub fn routed(&self) -> Option<&RoutedTrip> {
        match self {
            TripOutcome::Routed(trip) => Some(trip),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&TripError> {
        match self {
            TripOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripReport {
    pub key: TripKey,
    pub outcome: TripOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleDayTotal {
    pub day: String,
    pub vehicle: Option<String>,
    pub distance: f64,
}

/// Running totals for one optimization run. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregate {
    per_trip: Vec<(TripKey, f64)>,
    per_vehicle_day: Vec<VehicleDayTotal>,
    grand_total: f64,
}

impl Aggregate {
    /// Records a trip's distance. Trips must arrive in key order.
    fn record(&mut self, key: &TripKey, distance: f64) {
        self.per_trip.push((key.clone(), distance));

        match self.per_vehicle_day.last_mut() {
            Some(total) if total.day == key.day && total.vehicle == key.vehicle => {
                total.distance += distance;
            }
            _ => self.per_vehicle_day.push(VehicleDayTotal {
                day: key.day.clone(),
                vehicle: key.vehicle.clone(),
                distance,
            }),
        }

        self.grand_total += distance;
    }

    pub fn trip_total(&self, key: &TripKey) -> Option<f64> {
        self.per_trip
            .iter()
            .find(|(trip, _)| trip == key)
            .map(|(_, distance)| *distance)
    }

    pub fn vehicle_day_total(&self, day: &str, vehicle: Option<&str>) -> Option<f64> {
        self.per_vehicle_day
            .iter()
            .find(|total| total.day == day && total.vehicle.as_deref() == vehicle)
            .map(|total| total.distance)
    }

    pub fn vehicle_day_totals(&self) -> &[VehicleDayTotal] {
        &self.per_vehicle_day
    }

    pub fn grand_total(&self) -> f64 {
        self.grand_total
    }
}

/// Result of one aggregation run, trips in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub trips: Vec<TripReport>,
    pub totals: Aggregate,
}

impl RunReport {
    pub fn outcome(&self, key: &TripKey) -> Option<&TripOutcome> {
        self.trips
            .iter()
            .find(|report| &report.key == key)
            .map(|report| &report.outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&TripKey, &TripError)> {
        self.trips
            .iter()
            .filter_map(|report| report.outcome.error().map(|err| (&report.key, err)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TripAggregator {
    options: RunOptions,
}

impl TripAggregator {
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Groups schedule rows with the configured granularity, then runs.
    pub fn run_schedule<S>(&self, rows: &[ScheduleRow], source: &S) -> RunReport
    where
        S: DistanceSource + Sync,
    {
        self.run(&group_schedule(rows, self.options.grouping), source)
    }

    /// Solves every trip group and accumulates totals.
    ///
    /// Groups are independent; with `parallel` set they are solved on the
    /// rayon pool, but results are always folded in key order.
    pub fn run<S>(&self, groups: &TripGroups, source: &S) -> RunReport
    where
        S: DistanceSource + Sync,
    {
        info!(
            groups = groups.len(),
            strategy = ?self.options.solve.strategy,
            parallel = self.options.parallel,
            "optimizing trips"
        );

        let entries: Vec<(&TripKey, &Vec<StopId>)> = groups.iter().collect();
        let outcomes: Vec<TripOutcome> = if self.options.parallel {
            entries
                .par_iter()
                .map(|(key, raw)| self.solve_group(key, raw, source))
                .collect()
        } else {
            entries
                .iter()
                .map(|(key, raw)| self.solve_group(key, raw, source))
                .collect()
        };

        let mut report = RunReport::default();
        for ((key, _), outcome) in entries.into_iter().zip(outcomes) {
            report.totals.record(key, outcome.distance());
            report.trips.push(TripReport {
                key: key.clone(),
                outcome,
            });
        }

        info!(
            trips = report.trips.len(),
            failed = report.failures().count(),
            total = report.totals.grand_total(),
            "optimization run complete"
        );
        report
    }

    fn solve_group<S>(&self, key: &TripKey, raw: &[StopId], source: &S) -> TripOutcome
    where
        S: DistanceSource,
    {
        match self.route_trip(raw, source) {
            Ok(trip) => {
                info!(trip = %key, stops = trip.stops.len(), distance = trip.distance, "trip routed");
                TripOutcome::Routed(trip)
            }
            Err(TripError::Empty(_)) => {
                info!(trip = %key, "trip has no stops besides the depot");
                TripOutcome::Empty(RoutedTrip::depot_only(self.options.depot.clone()))
            }
            Err(err) => {
                warn!(trip = %key, error = %err, "trip failed");
                TripOutcome::Failed(err)
            }
        }
    }

    fn route_trip<S>(&self, raw: &[StopId], source: &S) -> Result<RoutedTrip, TripError>
    where
        S: DistanceSource,
    {
        let stop_set = StopSet::build(&self.options.depot, raw.iter().cloned())?;
        let matrix = source.matrix_for(&stop_set)?;
        let tour = solve_with_options(&stop_set, &matrix, &self.options.solve)?;

        Ok(RoutedTrip {
            stops: tour.stops(&stop_set),
            distance: tour.distance(matrix.scale()),
            tour,
        })
    }
}

fn serialize_display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: fmt::Display,
    S: Serializer,
{
    serializer.collect_str(value)
}
