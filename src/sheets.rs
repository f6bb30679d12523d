//! Spreadsheet CSV-export adapter.
//!
//! Fetches the vendor, routes and distance sheets over HTTP and hands them
//! to the parsers in [`crate::ingest`].

use std::time::Duration;

use tracing::{info, instrument};

use crate::distance::ScaleFactor;
use crate::error::IngestError;
use crate::ingest::{self, Dataset, WeekdayRule};
use crate::traits::{DEFAULT_DEPOT_ID, Stop, StopId};

/// The fixed start/end location of every tour.
#[derive(Debug, Clone, PartialEq)]
pub struct DepotConfig {
    pub id: StopId,
    pub location: (f64, f64),
    pub name: String,
}

impl Default for DepotConfig {
    fn default() -> Self {
        Self {
            id: StopId::new(DEFAULT_DEPOT_ID),
            location: (13.4214134, 101.0101508),
            name: "DAIKIN INDUSTRIES (THAILAND) LTD.".to_string(),
        }
    }
}

impl DepotConfig {
    pub fn stop(&self) -> Stop {
        Stop::new(self.id.clone(), self.location.0, self.location.1).with_name(self.name.clone())
    }
}

/// Where the input sheets live and how to interpret them.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub base_url: String,
    pub spreadsheet_id: String,
    pub vendors_gid: u64,
    pub routes_gid: u64,
    /// Precomputed distance table, if the spreadsheet has one.
    pub distance_gid: Option<u64>,
    pub timeout_secs: u64,
    pub depot: DepotConfig,
    pub weekday_rule: WeekdayRule,
    /// Scale applied to distance-table entries.
    pub distance_scale: ScaleFactor,
}

impl SheetsConfig {
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            base_url: "https://docs.google.com/spreadsheets/d".to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            vendors_gid: 0,
            routes_gid: 498856514,
            distance_gid: Some(703414661),
            timeout_secs: 30,
            depot: DepotConfig::default(),
            weekday_rule: WeekdayRule::default(),
            distance_scale: ScaleFactor::default(),
        }
    }

    pub fn export_url(&self, gid: u64) -> String {
        format!(
            "{}/{}/export?format=csv&gid={}",
            self.base_url.trim_end_matches('/'),
            self.spreadsheet_id,
            gid
        )
    }
}

#[derive(Debug, Clone)]
pub struct SheetsClient {
    config: SheetsConfig,
    client: reqwest::blocking::Client,
}

impl SheetsClient {
    pub fn new(config: SheetsConfig) -> Result<Self, IngestError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &SheetsConfig {
        &self.config
    }

    /// Downloads one sheet as CSV text.
    #[instrument(skip(self))]
    pub fn fetch(&self, gid: u64) -> Result<String, IngestError> {
        let body = self
            .client
            .get(self.config.export_url(gid))
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())?;
        Ok(body)
    }

    /// Loads every sheet. Any failure aborts before optimization starts.
    pub fn load(&self) -> Result<Dataset, IngestError> {
        let vendors = ingest::read_vendors(self.fetch(self.config.vendors_gid)?.as_bytes(), &self.config.depot)?;
        let schedule = ingest::read_schedule(
            self.fetch(self.config.routes_gid)?.as_bytes(),
            self.config.weekday_rule,
        )?;
        let distances = match self.config.distance_gid {
            Some(gid) => Some(ingest::read_distance_table(
                self.fetch(gid)?.as_bytes(),
                self.config.distance_scale,
            )?),
            None => None,
        };

        info!(
            vendors = vendors.len(),
            rows = schedule.len(),
            distance_table = distances.is_some(),
            "loaded sheets"
        );

        Ok(Dataset {
            vendors,
            schedule,
            distances,
        })
    }
}
