//! Test fixtures for milk-run-planner.
//!
//! Provides:
//! - Vendor locations around the Chonburi/Rayong industrial estates
//! - Small CSV sheets in the spreadsheet-export layout

pub mod eastern_seaboard_locations;

pub use eastern_seaboard_locations::*;
