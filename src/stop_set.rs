//! Stop set builder.
//!
//! Turns a trip's raw vendor list into the ordered, duplicate-free set of
//! stops to visit, with the depot anchored at index 0.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::EmptyTripError;
use crate::traits::StopId;

/// Ordered unique stops of one trip. Index 0 is always the depot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopSet {
    stops: Vec<StopId>,
}

impl StopSet {
    /// Builds the stop set for a trip.
    ///
    /// Non-depot stops keep their first-seen order; repeats are dropped. The
    /// depot is moved (or inserted) to the front exactly once.
    pub fn build<I, S>(depot: &StopId, raw: I) -> Result<Self, EmptyTripError>
    where
        I: IntoIterator<Item = S>,
        S: Into<StopId>,
    {
        let mut seen = HashSet::new();
        let mut stops = vec![depot.clone()];

        for id in raw.into_iter().map(Into::into) {
            if &id == depot || id.as_str().is_empty() {
                continue;
            }
            if seen.insert(id.clone()) {
                stops.push(id);
            }
        }

        if stops.len() < 2 {
            return Err(EmptyTripError);
        }

        Ok(Self { stops })
    }

    /// A stop set holding only the depot.
    pub fn depot_only(depot: StopId) -> Self {
        Self { stops: vec![depot] }
    }

    pub fn depot(&self) -> &StopId {
        &self.stops[0]
    }

    pub fn stops(&self) -> &[StopId] {
        &self.stops
    }

    pub fn get(&self, index: usize) -> Option<&StopId> {
        self.stops.get(index)
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Always false: the depot is always present.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Iterates the non-depot stops with their stop-set index.
    pub fn visits(&self) -> impl Iterator<Item = (usize, &StopId)> {
        self.stops.iter().enumerate().skip(1)
    }
}
