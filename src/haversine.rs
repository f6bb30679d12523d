//! Haversine distance source.
//!
//! Great-circle distance in kilometres between stop coordinates. Closer to
//! road distance than the planar proxy, but still ignores roads.

use crate::distance::{CostMatrix, ScaleFactor};
use crate::error::DataIntegrityError;
use crate::stop_set::StopSet;
use crate::traits::{DistanceSource, VendorTable};

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine-based distance source producing kilometre costs.
#[derive(Debug, Clone)]
pub struct HaversineMatrix<'a> {
    vendors: &'a VendorTable,
    scale: ScaleFactor,
}

impl<'a> HaversineMatrix<'a> {
    pub fn new(vendors: &'a VendorTable, scale: ScaleFactor) -> Self {
        Self { vendors, scale }
    }

    /// Calculate haversine distance between two points in kilometers.
    pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
        let (lat1, lng1) = from;
        let (lat2, lng2) = to;

        let lat1_rad = lat1.to_radians();
        let lat2_rad = lat2.to_radians();
        let delta_lat = (lat2 - lat1).to_radians();
        let delta_lng = (lng2 - lng1).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }
}

impl DistanceSource for HaversineMatrix<'_> {
    fn matrix_for(&self, stops: &StopSet) -> Result<CostMatrix, DataIntegrityError> {
        let locations = stops
            .stops()
            .iter()
            .map(|id| self.vendors.location(id))
            .collect::<Result<Vec<_>, _>>()?;

        CostMatrix::from_fn(stops, self.scale, |i, j| Self::haversine_km(locations[i], locations[j]))
    }
}
