//! Vendor locations around the depot on the Eastern Seaboard.
//!
//! Coordinates are approximate and only meant to give realistic spacing.

#![allow(dead_code)]

use milk_run_planner::traits::{Stop, VendorTable};

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub code: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(code: &'static str, lat: f64, lng: f64) -> Self {
        Self { code, lat, lng }
    }

    pub fn stop(&self) -> Stop {
        Stop::new(self.code, self.lat, self.lng)
    }
}

pub const DEPOT: Location = Location::new("DIT", 13.4214, 101.0101);

// ============================================================================
// Minimal four-point scenario
// ============================================================================

pub const SCENARIO: &[Location] = &[
    DEPOT,
    Location::new("VND1", 13.5000, 100.9000),
    Location::new("VND2", 13.6000, 101.2000),
    Location::new("VND3", 13.4500, 100.8000),
];

// ============================================================================
// Wider vendor base
// ============================================================================

pub const VENDORS: &[Location] = &[
    Location::new("AMT", 13.4326, 101.0345),
    Location::new("BWN", 13.3652, 100.9848),
    Location::new("CHB", 13.3611, 100.9847),
    Location::new("EST", 13.0710, 101.1312),
    Location::new("HMR", 13.1120, 101.1420),
    Location::new("LCB", 13.0825, 100.9170),
    Location::new("NKR", 13.5510, 101.1730),
    Location::new("PDG", 13.0060, 101.2150),
    Location::new("PTN", 13.2010, 101.0520),
    Location::new("RYG", 12.6814, 101.2816),
    Location::new("SRC", 13.1740, 100.9310),
    Location::new("WHA", 13.0475, 101.0910),
];

pub fn scenario_vendors() -> VendorTable {
    SCENARIO.iter().map(Location::stop).collect()
}

pub fn vendor_table() -> VendorTable {
    std::iter::once(&DEPOT)
        .chain(VENDORS.iter())
        .map(Location::stop)
        .collect()
}

pub fn vendor_codes() -> Vec<&'static str> {
    VENDORS.iter().map(|location| location.code).collect()
}

// ============================================================================
// Sheets
// ============================================================================

pub const VENDORS_CSV: &str = "\
Ab.,Name,lat,lng
 VND1 ,Vendor One,13.5,100.9
VND2,,13.6,101.2
VND3,Vendor Three,13.45,100.8
DIT,Wrong Depot Row,0.0,0.0
";

pub const ROUTES_CSV: &str = "\
date,vehicle_id,trip_no,Ab.,arrival_time
Monday,TRK-01,1,VND1,08:00
Monday,TRK-01,1,VND2,09:30
Monday,TRK-01,2,VND3,
monday,TRK-02,1.0,VND2,10:00
Tuesday,TRK-01,1,DIT,
";

/// Symmetric table in kilometres; the A-C pair is blank.
pub const DISTANCE_CSV: &str = "\
,DIT,A,B,C
DIT,0,10,12,8
A,10,0,5,
B,12,5,0,7
C,8,,7,0
";
