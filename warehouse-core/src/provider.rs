use crate::{Config, model::{Coordinates, ForecastEntry}, provider::openweather::OpenWeatherClient};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Resolves a city name to coordinates.
#[async_trait]
pub trait GeocodeResolver: Send + Sync + Debug {
    /// Returns `Ok(None)` when the provider knows no place by that name.
    async fn resolve(&self, city: &str, region: &str) -> anyhow::Result<Option<Coordinates>>;
}

/// Fetches the forecast series for a location, ordered by time.
#[async_trait]
pub trait WeatherFetcher: Send + Sync + Debug {
    async fn fetch(&self, coordinates: Coordinates) -> anyhow::Result<Vec<ForecastEntry>>;
}

/// Construct the OpenWeather client from config.
pub fn openweather_from_config(config: &Config) -> anyhow::Result<OpenWeatherClient> {
    let api_key = config.openweather_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `weather-etl configure` or set OPENWEATHER_API_KEY."
        )
    })?;

    OpenWeatherClient::new(api_key.to_owned(), config.request_timeout())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn openweather_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = openweather_from_config(&cfg).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No OpenWeather API key configured"));
        assert!(msg.contains("Hint: run `weather-etl configure`"));
    }

    #[test]
    fn openweather_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.set_openweather_api_key("KEY".to_string());

        assert!(openweather_from_config(&cfg).is_ok());
    }
}
