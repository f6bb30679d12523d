//! Polyline representation for trip map overlays.
//!
//! The presentation layer draws one polyline per routed trip. Encoding to a
//! compact wire format is left to that layer.

use serde::{Deserialize, Serialize};

use crate::traits::{StopId, VendorTable};

/// A polyline as decoded (latitude, longitude) points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Traces stops in visiting order. Stops without a known coordinate are
    /// skipped rather than drawn at a made-up position.
    pub fn for_stops(stops: &[StopId], vendors: &VendorTable) -> Self {
        let points = stops
            .iter()
            .filter_map(|id| vendors.get(id))
            .map(|stop| stop.location)
            .collect();
        Self { points }
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    /// A line needs at least two points to be drawn.
    pub fn is_drawable(&self) -> bool {
        self.points.len() >= 2
    }
}
