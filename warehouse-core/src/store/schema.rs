use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{EtlError, Result};

pub const DIM_CITY: &str = "dim_city";
pub const DIM_DATE: &str = "dim_date";
pub const CURRENT_WEATHER: &str = "current_weather";
pub const HISTORICAL_WEATHER: &str = "historical_weather";

// Ordered so that referenced tables exist before the facts pointing at them.
const TABLES: &[(&str, &str)] = &[
    (
        DIM_CITY,
        "CREATE TABLE IF NOT EXISTS dim_city (
            city_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name    TEXT NOT NULL UNIQUE CHECK (length(name) > 0),
            lat     REAL NOT NULL,
            lon     REAL NOT NULL
        )",
    ),
    (
        DIM_DATE,
        "CREATE TABLE IF NOT EXISTS dim_date (
            date_id      INTEGER PRIMARY KEY AUTOINCREMENT,
            full_date    TEXT NOT NULL UNIQUE,
            year         INTEGER NOT NULL,
            month        INTEGER NOT NULL,
            day          INTEGER NOT NULL,
            quarter      INTEGER NOT NULL,
            day_name     TEXT NOT NULL,
            week_of_year INTEGER NOT NULL
        )",
    ),
    (
        CURRENT_WEATHER,
        "CREATE TABLE IF NOT EXISTS current_weather (
            city_id        INTEGER PRIMARY KEY REFERENCES dim_city (city_id),
            temp_now       REAL,
            temp_min       REAL,
            temp_max       REAL,
            humidity       REAL,
            wind_speed     REAL,
            condition_text TEXT,
            last_updated   TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    ),
    (
        HISTORICAL_WEATHER,
        "CREATE TABLE IF NOT EXISTS historical_weather (
            history_id     INTEGER PRIMARY KEY AUTOINCREMENT,
            city_id        INTEGER NOT NULL REFERENCES dim_city (city_id),
            date_id        INTEGER NOT NULL REFERENCES dim_date (date_id),
            time_measured  TEXT NOT NULL,
            temp_now       REAL,
            temp_min       REAL,
            temp_max       REAL,
            humidity       REAL,
            wind_speed     REAL,
            condition_text TEXT
        )",
    ),
];

/// Creates the warehouse tables if they are missing.
pub struct SchemaProvisioner<'a> {
    conn: &'a Connection,
}

impl<'a> SchemaProvisioner<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Each table is created by its own reentrant statement, so a run that
    /// stopped halfway is completed by the next one.
    pub fn ensure_schema(&self) -> Result<()> {
        for &(table, ddl) in TABLES {
            self.conn
                .execute(ddl, [])
                .map_err(|source| EtlError::Schema { table, source })?;
            debug!(table, "Table ensured");
        }

        info!(tables = TABLES.len(), "Warehouse schema ready");
        Ok(())
    }
}
