use chrono::NaiveDate;

use crate::model::{ForecastEntry, Reading};

/// Fold a forecast series into the reading stored for `day`.
///
/// Temperatures come from the entries dated `day` (falling back to the first
/// entry of the series when none match). Humidity, wind and condition always
/// come from the first entry of the unfiltered series, even when it belongs to
/// another day. Returns `None` for an empty series.
pub fn aggregate_reading(day: NaiveDate, forecast: &[ForecastEntry]) -> Option<Reading> {
    let first = forecast.first()?;

    let mut temps = forecast
        .iter()
        .filter(|e| e.timestamp.date() == day)
        .map(|e| e.temperature_c);

    let (temp_now, temp_min, temp_max) = match temps.next() {
        Some(now) => temps.fold((now, now, now), |(now, min, max), t| {
            (now, min.min(t), max.max(t))
        }),
        None => (
            first.temperature_c,
            first.temperature_c,
            first.temperature_c,
        ),
    };

    Some(Reading {
        temp_now,
        temp_min,
        temp_max,
        humidity: first.humidity_pct,
        wind_speed: first.wind_speed_mps,
        condition_text: first.condition.clone(),
    })
}
