//! Travelbook - a personal travel journal service
//!
//! Users record visits to cities, mark countries, follow curated collections,
//! build their own city lists and explore aggregated statistics and rankings.
//!
//! # Architecture
//! - `config`: TOML + environment configuration
//! - `storage`: SeaORM connection, migrations, retry and COUNT cache
//! - `services`: business logic, filter/sort pipelines and SQL queries
//! - `api`: actix-web JSON API, JWT authentication and middleware
//! - `runtime`: server startup/shutdown and one-shot commands
//! - `system`: logging and panic hook
//! - `utils`: passwords, CSV export and small helpers

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
