//! Core library for the `weather-etl` warehouse loader.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Collaborator traits for geocoding and forecasts, with an OpenWeather client
//! - The SQLite warehouse: schema, dimension catalog, snapshot and history facts
//! - The per-city collection batch and its report
//!
//! It is used by `warehouse-cli`, but can also be driven directly with fake
//! collaborators.

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod store;

pub use batch::BatchOrchestrator;
pub use config::{Config, ProviderConfig};
pub use error::EtlError;
pub use model::{BatchReport, CityOutcome, Coordinates, ForecastEntry, Reading};
pub use provider::{GeocodeResolver, WeatherFetcher};
