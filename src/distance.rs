//! Integer cost matrices and the planar/lookup distance sources.
//!
//! The tour constructor only compares integral arc costs. Every matrix
//! carries the [`ScaleFactor`] used to convert raw distances, so reported
//! totals can be restored to the original unit.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;

use serde::Serialize;

use crate::error::DataIntegrityError;
use crate::stop_set::StopSet;
use crate::traits::{DistanceSource, StopId, VendorTable};

const DEFAULT_SCALE: u32 = 1000;

/// Largest scaled arc cost a matrix accepts. Tour sums over any stop set
/// that fits in memory stay well inside `i64`.
pub const MAX_ARC_COST: i64 = 1 << 40;

/// Multiplier applied to raw distances before rounding to integer costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ScaleFactor(NonZeroU32);

impl ScaleFactor {
    /// Returns `None` for a zero factor.
    pub fn new(factor: u32) -> Option<Self> {
        NonZeroU32::new(factor).map(Self)
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }

    /// Scales and rounds a raw distance to the nearest integer cost.
    ///
    /// Returns `None` for NaN, infinite or negative distances and for
    /// costs above [`MAX_ARC_COST`].
    pub fn to_cost(&self, distance: f64) -> Option<i64> {
        let scaled = (distance * f64::from(self.get())).round();
        (0.0..=MAX_ARC_COST as f64)
            .contains(&scaled)
            .then_some(scaled as i64)
    }

    /// Restores an integer cost to the original distance unit.
    pub fn to_unit(&self, cost: i64) -> f64 {
        cost as f64 / f64::from(self.get())
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self(NonZeroU32::new(DEFAULT_SCALE).unwrap_or(NonZeroU32::MIN))
    }
}

/// Dense n×n matrix of directed integer arc costs, row-major.
///
/// Entries may be absent; the diagonal is always zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostMatrix {
    data: Vec<Option<i64>>,
    size: usize,
    scale: ScaleFactor,
}

impl CostMatrix {
    /// Creates a matrix with a zero diagonal and every other arc missing.
    pub fn new(size: usize, scale: ScaleFactor) -> Self {
        let mut data = vec![None; size * size];
        for i in 0..size {
            data[i * size + i] = Some(0);
        }
        Self { data, size, scale }
    }

    /// Builds a complete matrix over `stops` from a raw distance function.
    pub fn from_fn<F>(
        stops: &StopSet,
        scale: ScaleFactor,
        mut distance: F,
    ) -> Result<Self, DataIntegrityError>
    where
        F: FnMut(usize, usize) -> f64,
    {
        let size = stops.len();
        let mut matrix = Self::new(size, scale);
        for i in 0..size {
            for j in 0..size {
                if i != j {
                    matrix.set(stops, i, j, distance(i, j))?;
                }
            }
        }
        Ok(matrix)
    }

    /// Builds a complete matrix over `stops` from raw rows in stop-set order.
    pub fn from_rows(
        stops: &StopSet,
        rows: &[Vec<f64>],
        scale: ScaleFactor,
    ) -> Result<Self, DataIntegrityError> {
        let size = stops.len();
        if rows.len() != size {
            return Err(DataIntegrityError::NonSquareTable {
                rows: rows.len(),
                columns: size,
            });
        }
        if let Some(row) = rows.iter().find(|row| row.len() != size) {
            return Err(DataIntegrityError::NonSquareTable {
                rows: size,
                columns: row.len(),
            });
        }
        Self::from_fn(stops, scale, |i, j| rows[i][j])
    }

    /// Sets the arc `from -> to` from a raw distance. Diagonal writes are ignored.
    ///
    /// # Panics
    ///
    /// Panics if either index is outside `stops`.
    pub fn set(
        &mut self,
        stops: &StopSet,
        from: usize,
        to: usize,
        distance: f64,
    ) -> Result<(), DataIntegrityError> {
        let cost = self
            .scale
            .to_cost(distance)
            .ok_or_else(|| DataIntegrityError::InvalidDistance {
                from: stops.stops()[from].clone(),
                to: stops.stops()[to].clone(),
                distance,
            })?;
        self.set_cost(from, to, cost);
        Ok(())
    }

    /// Sets the arc `from -> to` to an already scaled cost.
    pub fn set_cost(&mut self, from: usize, to: usize, cost: i64) {
        if from != to {
            self.data[from * self.size + to] = Some(cost);
        }
    }

    /// Scaled cost of the arc `from -> to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn cost(&self, from: usize, to: usize) -> Option<i64> {
        self.data[from * self.size + to]
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn scale(&self) -> ScaleFactor {
        self.scale
    }

    /// First absent arc in row-major order, if any.
    pub fn first_missing_arc(&self) -> Option<(usize, usize)> {
        self.data
            .iter()
            .position(Option::is_none)
            .map(|pos| (pos / self.size, pos % self.size))
    }

    /// Returns `true` if every arc costs the same in both directions.
    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| ((i + 1)..self.size).all(|j| self.cost(i, j) == self.cost(j, i)))
    }

    /// Sum of consecutive arc costs along `path`, or `None` if an arc is absent.
    pub fn path_cost(&self, path: &[usize]) -> Option<i64> {
        path.windows(2)
            .map(|arc| self.cost(arc[0], arc[1]))
            .sum()
    }

    /// Converts a scaled cost back to the original distance unit.
    pub fn to_unit(&self, cost: i64) -> f64 {
        self.scale.to_unit(cost)
    }
}

/// Straight-line distance over raw (lat, lng) degrees.
///
/// A proxy for road distance: never longer than the real route, fine for
/// comparing tours but not for absolute figures.
#[derive(Debug, Clone)]
pub struct EuclideanMatrix<'a> {
    vendors: &'a VendorTable,
    scale: ScaleFactor,
}

impl<'a> EuclideanMatrix<'a> {
    pub fn new(vendors: &'a VendorTable, scale: ScaleFactor) -> Self {
        Self { vendors, scale }
    }

    pub fn euclidean(from: (f64, f64), to: (f64, f64)) -> f64 {
        (from.0 - to.0).hypot(from.1 - to.1)
    }
}

impl DistanceSource for EuclideanMatrix<'_> {
    fn matrix_for(&self, stops: &StopSet) -> Result<CostMatrix, DataIntegrityError> {
        let locations = stops
            .stops()
            .iter()
            .map(|id| self.vendors.location(id))
            .collect::<Result<Vec<_>, _>>()?;

        CostMatrix::from_fn(stops, self.scale, |i, j| Self::euclidean(locations[i], locations[j]))
    }
}

/// Externally maintained distance table keyed by stop-identifier pairs.
///
/// Slicing a table for a stop set fails on any absent pair: a missing entry
/// is never read as zero or infinity.
#[derive(Debug, Clone, Default)]
pub struct DistanceTable {
    entries: HashMap<(StopId, StopId), f64>,
    known: HashSet<StopId>,
    scale: ScaleFactor,
}

impl DistanceTable {
    pub fn new(scale: ScaleFactor) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    /// Registers a stop without any distances, e.g. a table row of blanks.
    pub fn add_stop(&mut self, id: StopId) {
        self.known.insert(id);
    }

    /// Records the distance `from -> to` in the table's native unit.
    pub fn insert(&mut self, from: StopId, to: StopId, distance: f64) {
        self.known.insert(from.clone());
        self.known.insert(to.clone());
        self.entries.insert((from, to), distance);
    }

    pub fn get(&self, from: &StopId, to: &StopId) -> Option<f64> {
        if from == to && self.known.contains(from) {
            return Some(0.0);
        }
        self.entries.get(&(from.clone(), to.clone())).copied()
    }

    pub fn contains_stop(&self, id: &StopId) -> bool {
        self.known.contains(id)
    }

    pub fn scale(&self) -> ScaleFactor {
        self.scale
    }

    pub fn with_scale(mut self, scale: ScaleFactor) -> Self {
        self.scale = scale;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DistanceSource for DistanceTable {
    fn matrix_for(&self, stops: &StopSet) -> Result<CostMatrix, DataIntegrityError> {
        let ids = stops.stops();
        if let Some(stop) = ids.iter().find(|id| !self.contains_stop(id)) {
            return Err(DataIntegrityError::UnknownStop { stop: stop.clone() });
        }

        let mut matrix = CostMatrix::new(ids.len(), self.scale);
        for (i, from) in ids.iter().enumerate() {
            for (j, to) in ids.iter().enumerate() {
                if i == j {
                    continue;
                }
                let distance =
                    self.get(from, to)
                        .ok_or_else(|| DataIntegrityError::MissingDistance {
                            from: from.clone(),
                            to: to.clone(),
                        })?;
                matrix.set(stops, i, j, distance)?;
            }
        }
        Ok(matrix)
    }
}
