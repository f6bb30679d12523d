//! milk-run-planner
//!
//! Sequences multi-stop pickup/delivery trips between a fixed depot and a
//! set of vendors, one closed tour per trip.

pub mod traits;
pub mod error;
pub mod distance;
pub mod haversine;
pub mod stop_set;
pub mod solver;
pub mod aggregator;
pub mod ingest;
pub mod sheets;
pub mod polyline;
