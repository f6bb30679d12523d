//! Sheet parsing: vendors, trip schedule and the optional distance table.
//!
//! All parsing works on any [`Read`] so sheets can come from HTTP exports or
//! local files alike. Every failure here is raised before the engine runs.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::distance::{DistanceTable, EuclideanMatrix, ScaleFactor};
use crate::error::{DataIntegrityError, IngestError};
use crate::sheets::DepotConfig;
use crate::traits::{Stop, StopId, VendorTable};

const VENDORS_SHEET: &str = "Vendors";
const ROUTES_SHEET: &str = "Routes";
const DISTANCE_SHEET: &str = "Distance Matrix";

/// How the day label of a schedule row is derived from its date column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WeekdayRule {
    /// First three characters, capitalised: `monday` becomes `Mon`.
    #[default]
    Prefix,
    /// The trimmed text as written.
    Verbatim,
}

impl WeekdayRule {
    pub fn day_label(&self, date: &str) -> String {
        let date = date.trim();
        match self {
            WeekdayRule::Prefix => {
                let mut chars = date.chars().take(3);
                match chars.next() {
                    Some(first) => first
                        .to_uppercase()
                        .chain(chars.flat_map(char::to_lowercase))
                        .collect(),
                    None => String::new(),
                }
            }
            WeekdayRule::Verbatim => date.to_string(),
        }
    }
}

/// One scheduled stop of one trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    pub day: String,
    pub vehicle: String,
    pub trip: u32,
    pub stop: StopId,
    pub arrival: Option<String>,
}

/// Everything the engine needs, fully loaded.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub vendors: VendorTable,
    pub schedule: Vec<ScheduleRow>,
    pub distances: Option<DistanceTable>,
}

impl Dataset {
    /// Planar distance source over the vendor coordinates.
    pub fn euclidean(&self, scale: ScaleFactor) -> EuclideanMatrix<'_> {
        EuclideanMatrix::new(&self.vendors, scale)
    }
}

#[derive(Debug, Deserialize)]
struct VendorRecord {
    #[serde(rename = "Ab.")]
    abbr: String,
    lat: f64,
    lng: f64,
    #[serde(rename = "Name", default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RouteRecord {
    date: String,
    vehicle_id: String,
    trip_no: String,
    #[serde(rename = "Ab.")]
    abbr: String,
    #[serde(default)]
    arrival_time: Option<String>,
}

/// Reads the vendor sheet and injects the depot, replacing any sheet row
/// that uses the depot identifier.
pub fn read_vendors<R: Read>(reader: R, depot: &DepotConfig) -> Result<VendorTable, IngestError> {
    let mut reader = csv_reader(reader);
    require_columns(&mut reader, VENDORS_SHEET, &["Ab.", "lat", "lng"])?;

    let mut vendors = VendorTable::new();
    for (index, record) in reader.deserialize::<VendorRecord>().enumerate() {
        let record = record.map_err(|err| malformed(VENDORS_SHEET, index, err))?;
        let id = StopId::new(&record.abbr);
        if id.as_str().is_empty() {
            continue;
        }
        if !valid_coordinate(record.lat, record.lng) {
            return Err(malformed(
                VENDORS_SHEET,
                index,
                format!("invalid coordinate ({}, {})", record.lat, record.lng),
            ));
        }
        let mut stop = Stop::new(id, record.lat, record.lng);
        stop.name = record.name.filter(|name| !name.is_empty());
        vendors.insert(stop);
    }
    vendors.insert(depot.stop());

    Ok(vendors)
}

/// Reads the routes sheet into schedule rows, in sheet order.
pub fn read_schedule<R: Read>(reader: R, rule: WeekdayRule) -> Result<Vec<ScheduleRow>, IngestError> {
    let mut reader = csv_reader(reader);
    require_columns(&mut reader, ROUTES_SHEET, &["date", "vehicle_id", "trip_no", "Ab."])?;

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<RouteRecord>().enumerate() {
        let record = record.map_err(|err| malformed(ROUTES_SHEET, index, err))?;
        let trip = parse_trip_no(&record.trip_no)
            .ok_or_else(|| malformed(ROUTES_SHEET, index, format!("invalid trip_no {:?}", record.trip_no)))?;

        rows.push(ScheduleRow {
            day: rule.day_label(&record.date),
            vehicle: record.vehicle_id.trim().to_string(),
            trip,
            stop: StopId::new(&record.abbr),
            arrival: record.arrival_time.filter(|time| !time.is_empty()),
        });
    }

    Ok(rows)
}

/// Reads a full distance table: the header row names the columns, the first
/// field of each row names the row. Blank cells are absent entries.
pub fn read_distance_table<R: Read>(reader: R, scale: ScaleFactor) -> Result<DistanceTable, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<StopId> = reader.headers()?.iter().skip(1).map(StopId::new).collect();
    let mut table = DistanceTable::new(scale);
    let mut rows = 0;

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != columns.len() + 1 {
            return Err(malformed(
                DISTANCE_SHEET,
                index,
                format!("expected {} fields, found {}", columns.len() + 1, record.len()),
            ));
        }

        let from = StopId::new(record.get(0).unwrap_or_default());
        table.add_stop(from.clone());
        rows += 1;

        for (to, cell) in columns.iter().zip(record.iter().skip(1)) {
            if cell.is_empty() {
                continue;
            }
            let distance = cell
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite() && *value >= 0.0)
                .ok_or_else(|| malformed(DISTANCE_SHEET, index, format!("invalid distance {:?}", cell)))?;
            table.insert(from.clone(), to.clone(), distance);
        }
    }

    if rows != columns.len() {
        return Err(DataIntegrityError::NonSquareTable {
            rows,
            columns: columns.len(),
        }
        .into());
    }

    Ok(table)
}

fn valid_coordinate(lat: f64, lng: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

/// Accepts `3` as well as spreadsheet-style `3.0`.
fn parse_trip_no(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    raw.parse::<u32>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.fract() == 0.0 && *value >= 0.0 && *value <= f64::from(u32::MAX))
            .map(|value| value as u32)
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader)
}

fn require_columns<R: Read>(
    reader: &mut csv::Reader<R>,
    sheet: &str,
    required: &[&str],
) -> Result<(), IngestError> {
    let headers = reader.headers()?;
    match required.iter().find(|column| !headers.iter().any(|header| header == **column)) {
        Some(column) => Err(IngestError::MissingColumn {
            sheet: sheet.to_string(),
            column: column.to_string(),
        }),
        None => Ok(()),
    }
}

/// Data rows start on line 2, below the header.
fn malformed(sheet: &str, index: usize, reason: impl ToString) -> IngestError {
    DataIntegrityError::MalformedRow {
        sheet: sheet.to_string(),
        line: index as u64 + 2,
        reason: reason.to_string(),
    }
    .into()
}
