use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;

use crate::model::{Coordinates, ForecastEntry};

use super::{GeocodeResolver, WeatherFetcher};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// OpenWeather direct geocoding and 5-day/3-hour forecast.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, timeout, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, timeout: Duration, base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get_body(&self, path: &str, query: &[(&str, String)], what: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather {} request failed with status {}: {}",
                what,
                status,
                truncate_body(&body),
            ));
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt_txt: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

fn parse_geocode(body: &str) -> Result<Option<Coordinates>> {
    let parsed: Vec<OwGeoEntry> =
        serde_json::from_str(body).context("Failed to parse OpenWeather geocoding JSON")?;

    Ok(parsed
        .first()
        .map(|e| Coordinates { lat: e.lat, lon: e.lon }))
}

fn parse_forecast(body: &str) -> Result<Vec<ForecastEntry>> {
    let parsed: OwForecastResponse =
        serde_json::from_str(body).context("Failed to parse OpenWeather forecast JSON")?;

    parsed
        .list
        .into_iter()
        .map(|entry| -> Result<ForecastEntry> {
            let timestamp = NaiveDateTime::parse_from_str(&entry.dt_txt, "%Y-%m-%d %H:%M:%S")
                .with_context(|| format!("Invalid forecast timestamp '{}'", entry.dt_txt))?;

            let condition = entry
                .weather
                .into_iter()
                .next()
                .map(|w| w.description)
                .ok_or_else(|| {
                    anyhow!("Forecast entry '{}' has no weather description", entry.dt_txt)
                })?;

            Ok(ForecastEntry {
                timestamp,
                temperature_c: entry.main.temp,
                humidity_pct: entry.main.humidity,
                wind_speed_mps: entry.wind.speed,
                condition,
            })
        })
        .collect()
}

#[async_trait]
impl GeocodeResolver for OpenWeatherClient {
    async fn resolve(&self, city: &str, region: &str) -> Result<Option<Coordinates>> {
        let body = self
            .get_body(
                "/geo/1.0/direct",
                &[("q", format!("{city},{region}")), ("limit", "1".to_string())],
                "geocoding",
            )
            .await?;

        parse_geocode(&body)
    }
}

#[async_trait]
impl WeatherFetcher for OpenWeatherClient {
    async fn fetch(&self, coordinates: Coordinates) -> Result<Vec<ForecastEntry>> {
        let body = self
            .get_body(
                "/data/2.5/forecast",
                &[
                    ("lat", coordinates.lat.to_string()),
                    ("lon", coordinates.lon.to_string()),
                    ("units", "metric".to_string()),
                ],
                "forecast",
            )
            .await?;

        parse_forecast(&body)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
