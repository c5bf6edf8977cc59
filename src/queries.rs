//! Query shapes over the `measurement` and `station` tables.
//!
//! Each function takes a borrowed connection and returns rows already shaped
//! for the JSON responses. Date arguments are bound as plain strings and
//! compared lexicographically; they are never parsed, so a malformed date
//! simply narrows the result (possibly to nothing) rather than erroring.

use crate::error::{Result, ServiceError};
use crate::model::{DATE_FORMAT, DatedValue, StationEntry, TemperatureStats};
use chrono::{Duration, NaiveDate};
use rusqlite::{Connection, OptionalExtension, params};

/// Width of the "last year" window ending at the newest measurement.
pub const LAST_YEAR_DAYS: i64 = 365;

// ---------------------------------------------------------------------------
// Cutoff
// ---------------------------------------------------------------------------

/// Newest `measurement.date`, or `None` for an empty table.
pub fn latest_date(conn: &Connection) -> Result<Option<String>> {
    let latest = conn
        .query_row(
            "SELECT date FROM measurement ORDER BY date DESC LIMIT 1",
            [],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()?;
    Ok(latest.flatten())
}

/// Returns the date `LAST_YEAR_DAYS` before `latest`, formatted `YYYY-MM-DD`.
pub fn cutoff_from_latest(latest: &str) -> Result<String> {
    let latest_date = NaiveDate::parse_from_str(latest, DATE_FORMAT).map_err(|source| {
        ServiceError::InvalidStoredDate {
            value: latest.to_string(),
            source,
        }
    })?;
    let cutoff = latest_date - Duration::days(LAST_YEAR_DAYS);
    Ok(cutoff.format(DATE_FORMAT).to_string())
}

/// Computes the "last year" cutoff for the dataset behind `conn`.
pub fn compute_cutoff_date(conn: &Connection) -> Result<String> {
    let latest = latest_date(conn)?.ok_or(ServiceError::EmptyDataset)?;
    cutoff_from_latest(&latest)
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// `(date, prcp)` for every measurement strictly after `cutoff`, by date.
/// Stations reporting on the same day each contribute a pair.
pub fn precipitation_since(conn: &Connection, cutoff: &str) -> Result<Vec<DatedValue>> {
    let mut stmt = conn.prepare_cached(
        "SELECT date, prcp FROM measurement WHERE date > ?1 ORDER BY date",
    )?;
    let rows = stmt
        .query_map([cutoff], |row| Ok(DatedValue(row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// `(station, name)` for every station, in table order. A NULL name is
/// passed through rather than treated as an error.
pub fn station_list(conn: &Connection) -> Result<Vec<StationEntry>> {
    let mut stmt = conn.prepare_cached("SELECT station, name FROM station")?;
    let rows = stmt
        .query_map([], |row| Ok(StationEntry(row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Station with the most measurement rows. Ties go to the lowest station id.
pub fn most_active_station(conn: &Connection) -> Result<Option<String>> {
    let station = conn
        .query_row(
            "SELECT station, COUNT(*) AS observations
             FROM measurement
             WHERE station IS NOT NULL
             GROUP BY station
             ORDER BY observations DESC, station ASC
             LIMIT 1",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(station)
}

/// `(date, tobs)` for one station strictly after `cutoff`, by date.
pub fn temperature_observations(
    conn: &Connection,
    station: &str,
    cutoff: &str,
) -> Result<Vec<DatedValue>> {
    let mut stmt = conn.prepare_cached(
        "SELECT date, tobs FROM measurement
         WHERE station = ?1 AND date > ?2
         ORDER BY date",
    )?;
    let rows = stmt
        .query_map(params![station, cutoff], |row| {
            Ok(DatedValue(row.get(0)?, row.get(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Temperature observations of the most active station over the last year.
/// Empty when there are no measurements at all.
pub fn most_active_temperatures(conn: &Connection, cutoff: &str) -> Result<Vec<DatedValue>> {
    match most_active_station(conn)? {
        Some(station) => temperature_observations(conn, &station, cutoff),
        None => Ok(Vec::new()),
    }
}

/// min/avg/max of `tobs` for `date >= start`, and `date <= end` when given.
pub fn temperature_stats(
    conn: &Connection,
    start: &str,
    end: Option<&str>,
) -> Result<TemperatureStats> {
    let stats = match end {
        Some(end) => conn.query_row(
            "SELECT MIN(tobs), AVG(tobs), MAX(tobs) FROM measurement
             WHERE date >= ?1 AND date <= ?2",
            params![start, end],
            stats_from_row,
        )?,
        None => conn.query_row(
            "SELECT MIN(tobs), AVG(tobs), MAX(tobs) FROM measurement WHERE date >= ?1",
            params![start],
            stats_from_row,
        )?,
    };
    Ok(stats)
}

fn stats_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TemperatureStats> {
    Ok(TemperatureStats {
        min: row.get(0)?,
        avg: row.get(1)?,
        max: row.get(2)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
