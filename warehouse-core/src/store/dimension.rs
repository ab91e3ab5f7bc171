use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::{
    error::{EtlError, Result},
    model::{CityKey, Coordinates, DateAttributes},
    provider::GeocodeResolver,
};

/// Resolves business keys (city name, calendar date) to surrogate ids,
/// creating dimension rows on first sighting.
pub struct DimensionCatalog<'a> {
    conn: &'a Connection,
}

impl<'a> DimensionCatalog<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Geocode `name` and return its `dim_city` key, inserting the row on
    /// first sighting.
    ///
    /// The resolver is asked on every call and the returned key carries those
    /// fresh coordinates; an existing row keeps the coordinates it was created
    /// with.
    pub async fn resolve_city(
        &self,
        name: &str,
        region: &str,
        geocoder: &dyn GeocodeResolver,
    ) -> Result<CityKey> {
        let coordinates = geocoder
            .resolve(name, region)
            .await
            .map_err(|e| EtlError::Geocode {
                city: name.to_string(),
                reason: format!("{e:#}"),
            })?
            .ok_or_else(|| EtlError::Geocode {
                city: name.to_string(),
                reason: "no coordinates returned".to_string(),
            })?;

        let stored = self.insert_city(name, coordinates)?;
        Ok(CityKey {
            id: stored.id,
            coordinates,
        })
    }

    pub fn find_city(&self, name: &str) -> Result<Option<CityKey>> {
        self.conn
            .query_row(
                "SELECT city_id, lat, lon FROM dim_city WHERE name = ?1",
                params![name],
                |row| {
                    Ok(CityKey {
                        id: row.get(0)?,
                        coordinates: Coordinates {
                            lat: row.get(1)?,
                            lon: row.get(2)?,
                        },
                    })
                },
            )
            .optional()
            .map_err(EtlError::DimensionWrite)
    }

    // INSERT OR IGNORE keeps a concurrent writer's row; the select then picks
    // up whichever row won.
    fn insert_city(&self, name: &str, coordinates: Coordinates) -> Result<CityKey> {
        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO dim_city (name, lat, lon) VALUES (?1, ?2, ?3)",
                params![name, coordinates.lat, coordinates.lon],
            )
            .map_err(EtlError::DimensionWrite)?;

        let key = self.find_city(name)?.ok_or_else(|| {
            EtlError::DimensionWrite(rusqlite::Error::QueryReturnedNoRows)
        })?;

        debug!(city = name, city_id = key.id, inserted = inserted > 0, "City dimension stored");
        Ok(key)
    }

    /// Surrogate id for the calendar date of `timestamp`.
    pub fn resolve_date(&self, timestamp: NaiveDateTime) -> Result<i64> {
        let date = timestamp.date();

        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT date_id FROM dim_date WHERE full_date = ?1",
                params![date],
                |row| row.get(0),
            )
            .optional()
            .map_err(EtlError::DimensionWrite)?;

        if let Some(id) = existing {
            debug!(%date, date_id = id, "Date dimension hit");
            return Ok(id);
        }

        let attrs = DateAttributes::from_date(date);
        self.conn
            .execute(
                "INSERT OR IGNORE INTO dim_date
                    (full_date, year, month, day, quarter, day_name, week_of_year)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    attrs.full_date,
                    attrs.year,
                    attrs.month,
                    attrs.day,
                    attrs.quarter,
                    attrs.day_name,
                    attrs.week_of_year,
                ],
            )
            .map_err(EtlError::DimensionWrite)?;

        let id: i64 = self
            .conn
            .query_row(
                "SELECT date_id FROM dim_date WHERE full_date = ?1",
                params![date],
                |row| row.get(0),
            )
            .map_err(EtlError::DimensionWrite)?;

        debug!(%date, date_id = id, "Date dimension stored");
        Ok(id)
    }
}
