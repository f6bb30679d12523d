//! Error kinds raised by ingestion, stop-set building and tour construction.

use std::time::Duration;

use thiserror::Error;

use crate::traits::StopId;

/// Input data does not describe a routable trip.
///
/// Fatal to the affected trip group, never to the whole run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataIntegrityError {
    #[error("no distance entry from {from} to {to}")]
    MissingDistance { from: StopId, to: StopId },

    #[error("stop {stop} is not present in the distance table")]
    UnknownStop { stop: StopId },

    #[error("no coordinate known for stop {stop}")]
    MissingCoordinate { stop: StopId },

    #[error("distance from {from} to {to} is not a usable arc cost: {distance}")]
    InvalidDistance { from: StopId, to: StopId, distance: f64 },

    #[error("malformed row {line} in sheet {sheet}: {reason}")]
    MalformedRow {
        sheet: String,
        line: u64,
        reason: String,
    },

    #[error("distance table is not square ({rows} rows, {columns} columns)")]
    NonSquareTable { rows: usize, columns: usize },
}

/// A trip group has nothing to route once the depot is set aside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("trip has no stops besides the depot")]
pub struct EmptyTripError;

/// The tour constructor could not produce a feasible tour.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizationFailure {
    #[error("cost matrix has no arc from {from} to {to}")]
    MissingArc { from: StopId, to: StopId },

    #[error("stop set has {stops} stops but the cost matrix is {matrix}x{matrix}")]
    SizeMismatch { stops: usize, matrix: usize },

    #[error("arc cost {cost} from {from} to {to} is out of range")]
    CostOutOfRange { from: StopId, to: StopId, cost: i64 },

    #[error("savings merge loop exceeded its budget after {elapsed:?}")]
    BudgetExhausted { elapsed: Duration },
}

/// Everything that can go wrong for a single trip group.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TripError {
    #[error(transparent)]
    Empty(#[from] EmptyTripError),

    #[error(transparent)]
    Data(#[from] DataIntegrityError),

    #[error(transparent)]
    Optimization(#[from] OptimizationFailure),
}

/// Failure to load the input sheets. Surfaced before any optimization runs.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to fetch sheet: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to read csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("sheet {sheet} has no column {column:?}")]
    MissingColumn { sheet: String, column: String },

    #[error(transparent)]
    Data(#[from] DataIntegrityError),
}
