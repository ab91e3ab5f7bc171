use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::error::EtlError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One step of a provider forecast series.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEntry {
    pub timestamp: NaiveDateTime,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_mps: f64,
    pub condition: String,
}

/// Measurements written to both fact tables for one city and one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub temp_now: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub condition_text: String,
}

/// Calendar attributes stored on a `dim_date` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateAttributes {
    pub full_date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub quarter: u32,
    pub day_name: String,
    pub week_of_year: u32,
}

impl DateAttributes {
    pub fn from_date(date: NaiveDate) -> Self {
        let month = date.month();
        Self {
            full_date: date,
            year: date.year(),
            month,
            day: date.day(),
            quarter: (month - 1) / 3 + 1,
            day_name: date.format("%A").to_string(),
            week_of_year: date.iso_week().week(),
        }
    }
}

/// A resolved `dim_city` row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CityKey {
    pub id: i64,
    pub coordinates: Coordinates,
}

/// Outcome of one city within a batch.
#[derive(Debug)]
pub enum CityOutcome {
    Collected { city: String, reading: Reading },
    Failed { city: String, error: EtlError },
}

impl CityOutcome {
    pub fn city(&self) -> &str {
        match self {
            CityOutcome::Collected { city, .. } | CityOutcome::Failed { city, .. } => city,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CityOutcome::Collected { .. })
    }
}

impl std::fmt::Display for CityOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CityOutcome::Collected { city, reading } => {
                write!(f, "OK    {city}: {}°C", reading.temp_now)
            }
            CityOutcome::Failed { city, error } => write!(f, "ERROR {city}: {error}"),
        }
    }
}

/// Ordered per-city results of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<CityOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_attributes_for_new_year_iso_week() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        let attrs = DateAttributes::from_date(date);

        assert_eq!(attrs.year, 2024);
        assert_eq!(attrs.month, 12);
        assert_eq!(attrs.day, 30);
        assert_eq!(attrs.quarter, 4);
        assert_eq!(attrs.day_name, "Monday");
        assert_eq!(attrs.week_of_year, 1);
    }

    #[test]
    fn quarter_boundaries() {
        let quarter = |month| {
            let first = NaiveDate::from_ymd_opt(2025, month, 1).unwrap();
            DateAttributes::from_date(first).quarter
        };
        assert_eq!(quarter(1), 1);
        assert_eq!(quarter(3), 1);
        assert_eq!(quarter(4), 2);
        assert_eq!(quarter(9), 3);
        assert_eq!(quarter(10), 4);
    }

    #[test]
    fn report_counts_and_lines() {
        let report = BatchReport {
            outcomes: vec![
                CityOutcome::Collected {
                    city: "Rabat".into(),
                    reading: Reading {
                        temp_now: 21.5,
                        temp_min: 18.0,
                        temp_max: 24.0,
                        humidity: 60.0,
                        wind_speed: 3.1,
                        condition_text: "clear sky".into(),
                    },
                },
                CityOutcome::Failed {
                    city: "Safi".into(),
                    error: EtlError::Fetch("timed out".into()),
                },
            ],
        };

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.outcomes[0].to_string(), "OK    Rabat: 21.5°C");
        assert_eq!(
            report.outcomes[1].to_string(),
            "ERROR Safi: Forecast fetch failed: timed out"
        );
    }
}
