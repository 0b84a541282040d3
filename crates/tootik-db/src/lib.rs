//! Database layer for tootik's frontend core.
//!
//! Schema creation is an external collaborator; this crate only
//! reads and writes rows through `sea-orm`, against whatever connection
//! string `Config::database.url` names.

pub mod entities;
pub mod repositories;

use std::time::Duration;
use tootik_common::{AppError, Config};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::log::LevelFilter;

/// Initialize the database connection pool.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}
