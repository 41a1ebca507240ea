//! Postgres access for the `agg_prices` table.
//!
//! The store is the program's single upstream interface: one table, read in
//! full, once per load. Connection parameters come from the environment
//! (`.env` supported); initialization is explicit and fallible so a dead
//! connection can never be queried.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::domain::PriceRow;
use crate::error::AppError;

// Casts fix the row type regardless of the exact numeric column types the
// upstream aggregation job created (NUMERIC vs INT vs BIGINT).
const FETCH_SQL: &str = "SELECT main_category_name, sub_category_name, sub_sub_category_name, \
     day, count_rows::int8 AS count_rows, avg_price::float8 AS avg_price \
     FROM agg_prices";

/// Connection settings, read from the environment.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: String,
    pub database: String,
}

impl StoreConfig {
    /// Read the five connection variables the deployment provisions.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Ok(Self {
            user: env_var("user")?,
            password: env_var("password")?,
            host: env_var("host")?,
            port: env_var("port")?,
            database: env_var("database")?,
        })
    }

    fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

fn env_var(name: &str) -> Result<String, AppError> {
    std::env::var(name)
        .map_err(|_| AppError::new(2, format!("Missing `{name}` in environment (.env).")))
}

/// Blocking facade over the async Postgres pool.
///
/// The store owns a small current-thread runtime so the rest of the program
/// stays synchronous; everything async lives behind `block_on` here.
pub struct PriceStore {
    runtime: tokio::runtime::Runtime,
    pool: PgPool,
}

impl PriceStore {
    /// Connect using environment configuration.
    ///
    /// A missing variable or an unreachable server is an error here, before
    /// any query runs.
    pub fn connect_from_env() -> Result<Self, AppError> {
        let config = StoreConfig::from_env()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to start async runtime: {e}")))?;

        let url = config.url();
        let pool = runtime
            .block_on(
                PgPoolOptions::new()
                    .max_connections(2)
                    .acquire_timeout(Duration::from_secs(30))
                    .connect(&url),
            )
            .map_err(|e| {
                AppError::new(
                    4,
                    format!(
                        "Failed to connect to Postgres at {}:{}/{}: {e}",
                        config.host, config.port, config.database
                    ),
                )
            })?;

        tracing::info!(host = %config.host, database = %config.database, "connected to Postgres");

        Ok(Self { runtime, pool })
    }

    /// Fetch the full contents of `agg_prices`.
    pub fn fetch_price_rows(&self) -> Result<Vec<PriceRow>, AppError> {
        let rows = self
            .runtime
            .block_on(sqlx::query_as::<_, PriceRow>(FETCH_SQL).fetch_all(&self.pool))
            .map_err(|e| AppError::new(4, format!("Failed to read `agg_prices`: {e}")))?;

        tracing::info!(rows = rows.len(), "fetched agg_prices");
        Ok(rows)
    }
}
