// src/model.rs
//! Row shapes of the staging and warehouse tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of the listening log, keyed the way the source JSON is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedEvent {
    pub artist: Option<String>,
    pub auth: Option<String>,
    pub first_name: Option<String>,
    pub gender: Option<String>,
    pub item_in_session: Option<i32>,
    pub last_name: Option<String>,
    pub length: Option<f64>,
    pub level: Option<String>,
    pub location: Option<String>,
    pub method: Option<String>,
    pub page: Option<String>,
    pub registration: Option<f64>,
    pub session_id: Option<i32>,
    pub song: Option<String>,
    pub status: Option<i32>,
    pub ts: Option<i64>,
    pub user_agent: Option<String>,
    pub user_id: Option<String>,
}

/// One song file of the catalog. Keys match the `staging_songs` columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagedSong {
    pub num_songs: Option<i32>,
    pub artist_id: Option<String>,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
    pub artist_location: Option<String>,
    pub artist_name: Option<String>,
    pub song_id: Option<String>,
    pub title: Option<String>,
    pub duration: Option<f64>,
    /// `0` in the source means the year is unknown.
    pub year: Option<i32>,
}

/// Fact row: one playback resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongPlay {
    pub songplay_id: i64,
    pub start_time: DateTime<Utc>,
    pub user_id: Option<String>,
    pub level: Option<String>,
    pub song_id: String,
    pub artist_id: String,
    pub session_id: Option<i32>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Song {
    pub song_id: String,
    pub title: String,
    pub artist_id: Option<String>,
    /// `None` when the catalog did not know the year.
    pub year: Option<i32>,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artist {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Calendar breakdown of one `start_time`. `weekday` counts from Sunday = 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeDim {
    pub start_time: DateTime<Utc>,
    pub hour: i32,
    pub day: i32,
    pub week: i32,
    pub month: i32,
    pub year: i32,
    pub weekday: i32,
}
