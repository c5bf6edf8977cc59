//! climate_service: read-only JSON API over the Hawaii climate dataset.
//!
//! # Module structure
//!
//! ```text
//! climate_service
//! ├── model     — hand-declared schema (Measurement, Station) and JSON response shapes
//! ├── config    — service configuration loader (climate.toml + environment)
//! ├── db        — read-only SQLite pool and schema verification
//! ├── queries   — the query shapes over measurement/station, plus the cutoff date
//! ├── service   — ClimateService: pool + process-lifetime cutoff date
//! ├── endpoint  — HTTP routing and the tiny_http server loop
//! └── error     — ServiceError and the crate Result alias
//! ```

pub mod config;
pub mod db;
pub mod endpoint;
pub mod error;
pub mod model;
pub mod queries;
pub mod service;
