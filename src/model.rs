//! Shared data types for the climate query service.
//!
//! The dataset schema is declared here by hand rather than reflected from
//! the database at startup: two fixed tables, `measurement` and `station`,
//! whose column lists are checked once by `db::verify_schema`.
//!
//! The response types at the bottom of the file mirror the JSON shapes the
//! web front end consumes, so field names and ordering matter.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

pub const MEASUREMENT_TABLE: &str = "measurement";
pub const STATION_TABLE: &str = "station";

/// Columns of `measurement` that queries rely on.
pub const MEASUREMENT_COLUMNS: &[&str] = &["station", "date", "prcp", "tobs"];

/// Columns of `station` declared by the dataset. Only `station` and `name`
/// are read by queries; the rest are descriptive.
pub const STATION_COLUMNS: &[&str] = &["station", "name", "latitude", "longitude", "elevation"];

/// Date format stored in `measurement.date`. ISO ordering means string
/// comparison equals chronological comparison.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One row of `measurement`, the declared counterpart of
/// `MEASUREMENT_COLUMNS`. Queries project straight into the response types
/// below; this record is what the dataset holds and what fixtures insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub station: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// Precipitation in inches, absent when the station did not report.
    pub prcp: Option<f64>,
    /// Temperature observation in °F.
    pub tobs: Option<f64>,
}

/// One row of `station`, the declared counterpart of `STATION_COLUMNS`.
/// Only `station` and `name` reach a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub station: String,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// `[date, value]` pair. Serialises as a two-element JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedValue(pub String, pub Option<f64>);

/// `[station_id, name]` pair. Serialises as a two-element JSON array; a
/// station without a name is emitted as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationEntry(pub String, pub Option<String>);

/// Raw min/avg/max of `tobs` over a date window. All three are `None` when
/// no rows matched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TemperatureStats {
    pub min: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
}

/// The date window echoed back as the first stats record.
///
/// Keys are declared in sorted order so the output matches what the front
/// end has always received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsPeriod {
    #[serde(rename = "End Date", skip_serializing_if = "Option::is_none", default)]
    pub end: Option<String>,
    #[serde(rename = "Start Date")]
    pub start: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsObservation {
    #[serde(rename = "Observation")]
    pub observation: String,
    #[serde(rename = "Temperature(F)")]
    pub temperature_f: Option<f64>,
}

/// One element of the `/api/v1.0/<start>[/<end>]` response array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatsRecord {
    Period(StatsPeriod),
    Observation(StatsObservation),
}

impl TemperatureStats {
    /// Lay the stats out as the fixed four-record response: the period
    /// marker followed by minimum, average and maximum.
    pub fn into_records(self, start: &str, end: Option<&str>) -> Vec<StatsRecord> {
        let observation = |label: &str, value: Option<f64>| {
            StatsRecord::Observation(StatsObservation {
                observation: label.to_string(),
                temperature_f: value,
            })
        };

        vec![
            StatsRecord::Period(StatsPeriod {
                end: end.map(str::to_string),
                start: start.to_string(),
            }),
            observation("Minimum Temperature", self.min),
            observation("Average Temperature", self.avg),
            observation("Maximum Temperature", self.max),
        ]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
