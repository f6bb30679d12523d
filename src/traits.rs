//! Core domain types and the distance-source seam.
//!
//! Stops are identified by short codes (vendor abbreviations plus the
//! reserved depot code). Anything able to price the arcs between the stops
//! of a trip implements [`DistanceSource`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::distance::CostMatrix;
use crate::error::DataIntegrityError;
use crate::stop_set::StopSet;

/// Identifier of the fixed start/end location of every tour.
pub const DEFAULT_DEPOT_ID: &str = "DIT";

/// Unique short code for a stop.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopId(String);

impl StopId {
    /// Creates an identifier, trimming surrounding whitespace.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StopId {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for StopId {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

/// A vendor or depot location.
///
/// Coordinates are only consumed by geographic distance sources and the map
/// overlay; the tour constructor never looks at them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: StopId,
    /// Latitude, longitude.
    pub location: (f64, f64),
    pub name: Option<String>,
}

impl Stop {
    pub fn new(id: impl Into<StopId>, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            location: (lat, lng),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Known stop locations keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VendorTable {
    stops: BTreeMap<StopId, Stop>,
}

impl VendorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a stop.
    pub fn insert(&mut self, stop: Stop) {
        self.stops.insert(stop.id.clone(), stop);
    }

    pub fn get(&self, id: &StopId) -> Option<&Stop> {
        self.stops.get(id)
    }

    /// Coordinate of a stop, or a data error if the stop is unknown.
    pub fn location(&self, id: &StopId) -> Result<(f64, f64), DataIntegrityError> {
        self.stops
            .get(id)
            .map(|stop| stop.location)
            .ok_or_else(|| DataIntegrityError::MissingCoordinate { stop: id.clone() })
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stop> {
        self.stops.values()
    }
}

impl FromIterator<Stop> for VendorTable {
    fn from_iter<T: IntoIterator<Item = Stop>>(iter: T) -> Self {
        let mut table = Self::new();
        for stop in iter {
            table.insert(stop);
        }
        table
    }
}

/// Provides a scaled cost matrix for the stops of one trip.
///
/// The matrix is indexed by stop-set order, so row and column 0 always
/// belong to the depot. Implementations must not perform I/O: all data is
/// loaded before the engine runs.
pub trait DistanceSource {
    fn matrix_for(&self, stops: &StopSet) -> Result<CostMatrix, DataIntegrityError>;
}

impl<S: DistanceSource + ?Sized> DistanceSource for &S {
    fn matrix_for(&self, stops: &StopSet) -> Result<CostMatrix, DataIntegrityError> {
        (**self).matrix_for(stops)
    }
}
