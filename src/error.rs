//! Error types for the climate query service.

use crate::config::ConfigError;
use crate::db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("The measurement table is empty; no cutoff date can be derived")]
    EmptyDataset,

    #[error("Stored date {value:?} is not in YYYY-MM-DD form: {source}")]
    InvalidStoredDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("HTTP server error: {0}")]
    Server(String),
}

impl From<rusqlite::Error> for ServiceError {
    fn from(e: rusqlite::Error) -> Self {
        ServiceError::Db(DbError::Sqlite(e))
    }
}

impl From<r2d2::Error> for ServiceError {
    fn from(e: r2d2::Error) -> Self {
        ServiceError::Db(DbError::Pool(e))
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
