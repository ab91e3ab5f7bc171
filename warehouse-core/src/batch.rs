use chrono::{Local, NaiveDateTime};
use rusqlite::Connection;
use tracing::{Instrument, info, info_span, warn};

use crate::{
    aggregate::aggregate_reading,
    error::{EtlError, Result},
    model::{BatchReport, CityOutcome, Reading},
    provider::{GeocodeResolver, WeatherFetcher},
    store::{DimensionCatalog, HistoryAppender, SnapshotUpserter},
};

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Runs one collection pass over a list of cities.
///
/// Cities are processed one after another on a single connection. A failure
/// is recorded against its city and never stops the remaining ones.
pub struct BatchOrchestrator<'a> {
    conn: &'a Connection,
    geocoder: &'a dyn GeocodeResolver,
    fetcher: &'a dyn WeatherFetcher,
    region: String,
    clock: fn() -> NaiveDateTime,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(
        conn: &'a Connection,
        geocoder: &'a dyn GeocodeResolver,
        fetcher: &'a dyn WeatherFetcher,
        region: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            geocoder,
            fetcher,
            region: region.into(),
            clock: local_now,
        }
    }

    /// Replace the wall clock used to pick the collection day.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub async fn run<S: AsRef<str>>(&self, cities: &[S]) -> BatchReport {
        info!(cities = cities.len(), region = %self.region, "Starting collection batch");

        let mut report = BatchReport::default();
        for city in cities {
            let city = city.as_ref();
            let outcome = match self
                .collect_city(city)
                .instrument(info_span!("city", name = city))
                .await
            {
                Ok(reading) => {
                    info!(city, temp_now = reading.temp_now, "City collected");
                    CityOutcome::Collected {
                        city: city.to_string(),
                        reading,
                    }
                }
                Err(error) => {
                    warn!(city, %error, "City collection failed");
                    CityOutcome::Failed {
                        city: city.to_string(),
                        error,
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Collection batch finished"
        );
        report
    }

    /// The per-city pipeline; every write commits on its own. The forecast is
    /// requested for the coordinates geocoded in this pass.
    async fn collect_city(&self, city: &str) -> Result<Reading> {
        let catalog = DimensionCatalog::new(self.conn);

        let key = catalog
            .resolve_city(city, &self.region, self.geocoder)
            .await?;

        let now = (self.clock)();
        let date_id = catalog.resolve_date(now)?;

        let forecast = self
            .fetcher
            .fetch(key.coordinates)
            .await
            .map_err(|e| EtlError::Fetch(format!("{e:#}")))?;

        let reading = aggregate_reading(now.date(), &forecast)
            .ok_or_else(|| EtlError::Fetch("forecast contained no entries".to_string()))?;

        SnapshotUpserter::new(self.conn).upsert(key.id, &reading)?;
        HistoryAppender::new(self.conn).append(key.id, date_id, now.time(), &reading)?;

        Ok(reading)
    }
}
