use chrono::NaiveTime;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::{
    error::{EtlError, Result},
    model::Reading,
};

/// The `current_weather` row for a city.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRow {
    pub city_id: i64,
    pub reading: Reading,
    pub last_updated: String,
}

/// One `historical_weather` row.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub history_id: i64,
    pub city_id: i64,
    pub date_id: i64,
    pub time_measured: String,
    pub reading: Reading,
}

fn reading_from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Reading> {
    Ok(Reading {
        temp_now: row.get(offset)?,
        temp_min: row.get(offset + 1)?,
        temp_max: row.get(offset + 2)?,
        humidity: row.get(offset + 3)?,
        wind_speed: row.get(offset + 4)?,
        condition_text: row.get(offset + 5)?,
    })
}

/// Maintains exactly one `current_weather` row per city.
pub struct SnapshotUpserter<'a> {
    conn: &'a Connection,
}

impl<'a> SnapshotUpserter<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert or fully overwrite the city's snapshot in one transaction.
    pub fn upsert(&self, city_id: i64, reading: &Reading) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(EtlError::DatabaseWrite)?;

        tx.execute(
            "INSERT INTO current_weather
                (city_id, temp_now, temp_min, temp_max, humidity, wind_speed, condition_text, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, CURRENT_TIMESTAMP)
             ON CONFLICT (city_id) DO UPDATE SET
                temp_now = excluded.temp_now,
                temp_min = excluded.temp_min,
                temp_max = excluded.temp_max,
                humidity = excluded.humidity,
                wind_speed = excluded.wind_speed,
                condition_text = excluded.condition_text,
                last_updated = CURRENT_TIMESTAMP",
            params![
                city_id,
                reading.temp_now,
                reading.temp_min,
                reading.temp_max,
                reading.humidity,
                reading.wind_speed,
                reading.condition_text,
            ],
        )
        .map_err(EtlError::DatabaseWrite)?;

        tx.commit().map_err(EtlError::DatabaseWrite)?;
        debug!(city_id, "Snapshot upserted");
        Ok(())
    }

    pub fn get(&self, city_id: i64) -> Result<Option<SnapshotRow>> {
        self.conn
            .query_row(
                "SELECT city_id, temp_now, temp_min, temp_max, humidity, wind_speed,
                        condition_text, last_updated
                 FROM current_weather WHERE city_id = ?1",
                params![city_id],
                |row| {
                    Ok(SnapshotRow {
                        city_id: row.get(0)?,
                        reading: reading_from_row(row, 1)?,
                        last_updated: row.get(7)?,
                    })
                },
            )
            .optional()
            .map_err(EtlError::DatabaseWrite)
    }
}

/// Append-only writer for `historical_weather`.
pub struct HistoryAppender<'a> {
    conn: &'a Connection,
}

impl<'a> HistoryAppender<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Record one collection event; returns the new `history_id`.
    pub fn append(
        &self,
        city_id: i64,
        date_id: i64,
        time_of_day: NaiveTime,
        reading: &Reading,
    ) -> Result<i64> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(EtlError::DatabaseWrite)?;

        tx.execute(
            "INSERT INTO historical_weather
                (city_id, date_id, time_measured, temp_now, temp_min, temp_max,
                 humidity, wind_speed, condition_text)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                city_id,
                date_id,
                time_of_day.format("%H:%M:%S").to_string(),
                reading.temp_now,
                reading.temp_min,
                reading.temp_max,
                reading.humidity,
                reading.wind_speed,
                reading.condition_text,
            ],
        )
        .map_err(EtlError::DatabaseWrite)?;

        let history_id = tx.last_insert_rowid();
        tx.commit().map_err(EtlError::DatabaseWrite)?;

        debug!(city_id, date_id, history_id, "History record appended");
        Ok(history_id)
    }

    pub fn count_for_city(&self, city_id: i64) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM historical_weather WHERE city_id = ?1",
                params![city_id],
                |row| row.get(0),
            )
            .map_err(EtlError::DatabaseWrite)
    }

    /// History for a city in insertion order.
    pub fn list_for_city(&self, city_id: i64) -> Result<Vec<HistoryRow>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT history_id, city_id, date_id, time_measured, temp_now, temp_min,
                        temp_max, humidity, wind_speed, condition_text
                 FROM historical_weather WHERE city_id = ?1 ORDER BY history_id",
            )
            .map_err(EtlError::DatabaseWrite)?;

        let rows = stmt
            .query_map(params![city_id], |row| {
                Ok(HistoryRow {
                    history_id: row.get(0)?,
                    city_id: row.get(1)?,
                    date_id: row.get(2)?,
                    time_measured: row.get(3)?,
                    reading: reading_from_row(row, 4)?,
                })
            })
            .map_err(EtlError::DatabaseWrite)?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(EtlError::DatabaseWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{self, SchemaProvisioner};

    fn reading(temp_now: f64, condition: &str) -> Reading {
        Reading {
            temp_now,
            temp_min: temp_now - 3.0,
            temp_max: temp_now + 4.0,
            humidity: 65.0,
            wind_speed: 5.5,
            condition_text: condition.to_string(),
        }
    }

    /// Warehouse with one city (id 1) and one date (id 1).
    fn seeded() -> Connection {
        let conn = store::open_in_memory().unwrap();
        SchemaProvisioner::new(&conn).ensure_schema().unwrap();
        conn.execute_batch(
            "INSERT INTO dim_city (name, lat, lon) VALUES ('Agadir', 30.42, -9.6);
             INSERT INTO dim_date (full_date, year, month, day, quarter, day_name, week_of_year)
             VALUES ('2025-06-02', 2025, 6, 2, 2, 'Monday', 23);",
        )
        .unwrap();
        conn
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M:%S").unwrap()
    }

    #[test]
    fn upsert_keeps_one_row_with_latest_values() {
        let conn = seeded();
        let snapshots = SnapshotUpserter::new(&conn);

        snapshots.upsert(1, &reading(20.0, "clear sky")).unwrap();
        snapshots.upsert(1, &reading(25.5, "light rain")).unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM current_weather", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);

        let snapshot = snapshots.get(1).unwrap().expect("snapshot row");
        assert_eq!(snapshot.reading, reading(25.5, "light rain"));
        assert!(!snapshot.last_updated.is_empty());
    }

    #[test]
    fn upsert_refreshes_last_updated() {
        let conn = seeded();
        let snapshots = SnapshotUpserter::new(&conn);

        snapshots.upsert(1, &reading(20.0, "clear sky")).unwrap();
        conn.execute(
            "UPDATE current_weather SET last_updated = '2000-01-01 00:00:00'",
            [],
        )
        .unwrap();
        snapshots.upsert(1, &reading(21.0, "clear sky")).unwrap();

        let snapshot = snapshots.get(1).unwrap().unwrap();
        assert_ne!(snapshot.last_updated, "2000-01-01 00:00:00");
    }

    #[test]
    fn upsert_for_unknown_city_fails_without_writing() {
        let conn = seeded();
        let snapshots = SnapshotUpserter::new(&conn);

        let err = snapshots.upsert(99, &reading(20.0, "clear sky")).unwrap_err();
        assert!(matches!(err, EtlError::DatabaseWrite(_)));
        assert!(snapshots.get(99).unwrap().is_none());
    }

    #[test]
    fn append_always_adds_and_never_rewrites() {
        let conn = seeded();
        let history = HistoryAppender::new(&conn);

        let first = history
            .append(1, 1, time("09:00:00"), &reading(18.0, "mist"))
            .unwrap();
        let second = history
            .append(1, 1, time("15:30:10"), &reading(23.0, "clear sky"))
            .unwrap();

        assert!(second > first);
        assert_eq!(history.count_for_city(1).unwrap(), 2);

        let rows = history.list_for_city(1).unwrap();
        assert_eq!(rows[0].time_measured, "09:00:00");
        assert_eq!(rows[0].reading, reading(18.0, "mist"));
        assert_eq!(rows[1].time_measured, "15:30:10");
        assert_eq!(rows[1].date_id, 1);
    }

    #[test]
    fn append_rejects_dangling_date() {
        let conn = seeded();
        let history = HistoryAppender::new(&conn);

        let err = history
            .append(1, 42, time("09:00:00"), &reading(18.0, "mist"))
            .unwrap_err();
        assert!(matches!(err, EtlError::DatabaseWrite(_)));
        assert_eq!(history.count_for_city(1).unwrap(), 0);
    }
}
