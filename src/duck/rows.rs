// src/duck/rows.rs

use chrono::{DateTime, Utc};
use duckdb::types::Type;
use duckdb::Row;

use crate::model::{Artist, Song, SongPlay, TimeDim, User};
use crate::schema::Table;

/// A warehouse table row that can be read back out of DuckDB.
/// - `SELECT` lists the expressions in the order `from_row` reads them; decimals are
///   cast to `DOUBLE` and timestamps to epoch milliseconds.
/// - `ORDER_BY` gives a stable order for reads.
pub trait DuckRow: Sized {
    const TABLE: Table;
    const SELECT: &'static [&'static str];
    const ORDER_BY: &'static str;
    fn from_row(row: &Row<'_>) -> duckdb::Result<Self>;
}

fn utc_from_millis(idx: usize, ms: i64) -> duckdb::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        duckdb::Error::FromSqlConversionFailure(
            idx,
            Type::BigInt,
            format!("{ms} ms is outside the representable range").into(),
        )
    })
}

impl DuckRow for SongPlay {
    const TABLE: Table = Table::SongPlay;
    const SELECT: &'static [&'static str] = &[
        "CAST(songplay_id AS BIGINT)",
        "epoch_ms(start_time)",
        "user_id",
        "level",
        "song_id",
        "artist_id",
        "session_id",
        "location",
        "user_agent",
    ];
    const ORDER_BY: &'static str = "songplay_id";

    fn from_row(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(SongPlay {
            songplay_id: row.get(0)?,
            start_time: utc_from_millis(1, row.get(1)?)?,
            user_id: row.get(2)?,
            level: row.get(3)?,
            song_id: row.get(4)?,
            artist_id: row.get(5)?,
            session_id: row.get(6)?,
            location: row.get(7)?,
            user_agent: row.get(8)?,
        })
    }
}

impl DuckRow for User {
    const TABLE: Table = Table::Users;
    const SELECT: &'static [&'static str] =
        &["user_id", "first_name", "last_name", "gender", "level"];
    const ORDER_BY: &'static str = "user_id";

    fn from_row(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(User {
            user_id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            gender: row.get(3)?,
            level: row.get(4)?,
        })
    }
}

impl DuckRow for Song {
    const TABLE: Table = Table::Songs;
    const SELECT: &'static [&'static str] = &[
        "song_id",
        "title",
        "artist_id",
        "year",
        "CAST(duration AS DOUBLE)",
    ];
    const ORDER_BY: &'static str = "song_id";

    fn from_row(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Song {
            song_id: row.get(0)?,
            title: row.get(1)?,
            artist_id: row.get(2)?,
            year: row.get(3)?,
            duration: row.get(4)?,
        })
    }
}

impl DuckRow for Artist {
    const TABLE: Table = Table::Artists;
    const SELECT: &'static [&'static str] = &[
        "artist_id",
        "name",
        "location",
        "CAST(latitude AS DOUBLE)",
        "CAST(longitude AS DOUBLE)",
    ];
    const ORDER_BY: &'static str = "artist_id";

    fn from_row(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Artist {
            artist_id: row.get(0)?,
            name: row.get(1)?,
            location: row.get(2)?,
            latitude: row.get(3)?,
            longitude: row.get(4)?,
        })
    }
}

impl DuckRow for TimeDim {
    const TABLE: Table = Table::Time;
    const SELECT: &'static [&'static str] = &[
        "epoch_ms(start_time)",
        "hour",
        "day",
        "week",
        "month",
        "year",
        "weekday",
    ];
    const ORDER_BY: &'static str = "start_time";

    fn from_row(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(TimeDim {
            start_time: utc_from_millis(0, row.get(0)?)?,
            hour: row.get(1)?,
            day: row.get(2)?,
            week: row.get(3)?,
            month: row.get(4)?,
            year: row.get(5)?,
            weekday: row.get(6)?,
        })
    }
}
