use thiserror::Error;

/// Failures of the ETL pipeline.
///
/// `Store`, `StoreDirectory` and `Schema` abort the whole run. Every other
/// variant is scoped to a single city: the batch records it in the report and
/// moves on.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Failed to open warehouse database: {0}")]
    Store(#[source] rusqlite::Error),

    #[error("Failed to prepare database directory: {0}")]
    StoreDirectory(#[from] std::io::Error),

    #[error("Failed to create table `{table}`: {source}")]
    Schema {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Geocoding failed for {city}: {reason}")]
    Geocode { city: String, reason: String },

    #[error("Forecast fetch failed: {0}")]
    Fetch(String),

    #[error("Failed to write dimension row: {0}")]
    DimensionWrite(#[source] rusqlite::Error),

    #[error("Failed to write fact row: {0}")]
    DatabaseWrite(#[source] rusqlite::Error),
}

impl EtlError {
    /// Whether this error must stop the process rather than a single city.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EtlError::Store(_) | EtlError::StoreDirectory(_) | EtlError::Schema { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
