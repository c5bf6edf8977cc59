//! Climate query service.
//!
//! `ClimateService` owns the read-only connection pool and the "last year"
//! cutoff. The cutoff is derived exactly once, in `initialize`, from the
//! newest measurement in the dataset; the dataset is static, so it is never
//! refreshed for the life of the process.
//!
//! The service is `Send + Sync` and shared across request workers behind an
//! `Arc`. Each call checks a connection out of the pool for its duration.

use crate::db::{ConnectionPool, PooledConn};
use crate::error::Result;
use crate::model::{DatedValue, StationEntry, StatsRecord};
use crate::queries;
use std::fmt;
use tracing::info;

pub struct ClimateService {
    pool: ConnectionPool,
    cutoff_date: String,
}

impl fmt::Debug for ClimateService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClimateService")
            .field("cutoff_date", &self.cutoff_date)
            .field("connections", &self.pool.state().connections)
            .finish()
    }
}

impl ClimateService {
    /// Compute the cutoff date and wrap the pool.
    pub fn initialize(pool: ConnectionPool) -> Result<Self> {
        let cutoff_date = {
            let conn = pool.get()?;
            queries::compute_cutoff_date(&conn)?
        };
        info!(cutoff_date = %cutoff_date, "Computed last-year cutoff");

        Ok(Self { pool, cutoff_date })
    }

    /// Newest measurement date minus 365 days, `YYYY-MM-DD`.
    pub fn cutoff_date(&self) -> &str {
        &self.cutoff_date
    }

    fn conn(&self) -> Result<PooledConn> {
        Ok(self.pool.get()?)
    }

    /// Precipitation pairs for the last year of data.
    pub fn precipitation(&self) -> Result<Vec<DatedValue>> {
        let conn = self.conn()?;
        queries::precipitation_since(&conn, &self.cutoff_date)
    }

    pub fn stations(&self) -> Result<Vec<StationEntry>> {
        let conn = self.conn()?;
        queries::station_list(&conn)
    }

    /// Last-year temperature observations of the most active station.
    pub fn tobs(&self) -> Result<Vec<DatedValue>> {
        let conn = self.conn()?;
        queries::most_active_temperatures(&conn, &self.cutoff_date)
    }

    /// Temperature summary from `start` onward.
    pub fn stats_from(&self, start: &str) -> Result<Vec<StatsRecord>> {
        let conn = self.conn()?;
        let stats = queries::temperature_stats(&conn, start, None)?;
        Ok(stats.into_records(start, None))
    }

    /// Temperature summary for `start..=end`.
    pub fn stats_between(&self, start: &str, end: &str) -> Result<Vec<StatsRecord>> {
        let conn = self.conn()?;
        let stats = queries::temperature_stats(&conn, start, Some(end))?;
        Ok(stats.into_records(start, Some(end)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::model::StatsObservation;
    use r2d2_sqlite::SqliteConnectionManager;

    /// A shared-cache in-memory database so every pooled connection sees
    /// the same tables.
    fn memory_pool(name: &str, setup: &str) -> ConnectionPool {
        let uri = format!("file:{name}?mode=memory&cache=shared");
        let manager = SqliteConnectionManager::file(uri).with_flags(
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        );
        let pool = r2d2::Pool::builder().max_size(2).build(manager).unwrap();
        pool.get().unwrap().execute_batch(setup).unwrap();
        pool
    }

    const DATASET: &str = "
        CREATE TABLE measurement (station TEXT, date TEXT, prcp FLOAT, tobs FLOAT);
        CREATE TABLE station (station TEXT, name TEXT, latitude FLOAT, longitude FLOAT, elevation FLOAT);
        INSERT INTO station VALUES ('USC00519281', 'WAIHEE 837.5, HI US', 21.45, -157.85, 32.9);
        INSERT INTO measurement VALUES
            ('USC00519281', '2017-01-01', 0.1, 60.0),
            ('USC00519281', '2017-06-01', 0.2, 70.0),
            ('USC00519281', '2017-08-23', 0.3, 80.0);
    ";

    #[test]
    fn test_initialize_computes_cutoff_once() {
        let service = ClimateService::initialize(memory_pool("svc_cutoff", DATASET)).unwrap();
        assert_eq!(service.cutoff_date(), "2016-08-23");
    }

    #[test]
    fn test_initialize_fails_on_empty_dataset() {
        let pool = memory_pool(
            "svc_empty",
            "CREATE TABLE measurement (station TEXT, date TEXT, prcp FLOAT, tobs FLOAT);",
        );
        let err = ClimateService::initialize(pool).expect_err("no measurements");
        assert!(matches!(err, ServiceError::EmptyDataset));
    }

    #[test]
    fn test_stats_records_from_service() {
        let service = ClimateService::initialize(memory_pool("svc_stats", DATASET)).unwrap();
        let records = service.stats_from("2017-01-01").unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(
            records[2],
            StatsRecord::Observation(StatsObservation {
                observation: "Average Temperature".to_string(),
                temperature_f: Some(70.0),
            })
        );
    }

    #[test]
    fn test_every_query_runs_on_pooled_connection() {
        let service = ClimateService::initialize(memory_pool("svc_all", DATASET)).unwrap();
        assert_eq!(service.precipitation().unwrap().len(), 3);
        assert_eq!(service.stations().unwrap().len(), 1);
        assert_eq!(service.tobs().unwrap().len(), 3);
        assert_eq!(service.stats_from("2017-06-01").unwrap().len(), 4);
        assert_eq!(service.stats_between("2017-01-01", "2017-06-01").unwrap().len(), 4);
    }

    #[test]
    fn test_tobs_and_stations_from_service() {
        let service = ClimateService::initialize(memory_pool("svc_tobs", DATASET)).unwrap();
        assert_eq!(service.tobs().unwrap().len(), 3);
        assert_eq!(service.stations().unwrap().len(), 1);
        assert_eq!(service.precipitation().unwrap().len(), 3);
    }
}
