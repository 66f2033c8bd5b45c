// src/testing.rs
//! Fixtures shared by the unit tests: NDJSON sources on disk and a test subscriber.

use std::fs;
use std::path::Path;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::SourceConfig;
use crate::load::FieldPathSpec;
use crate::model::{StagedEvent, StagedSong};

pub fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sparkify_dwh=debug")),
        )
        .with_test_writer()
        .finish();
    // Ignore the error if another test already installed one.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// A `NextSong` play of "Nothin' On You" by B.o.B.
pub fn next_song_event(user_id: &str, ts: i64) -> StagedEvent {
    StagedEvent {
        artist: Some("B.o.B".into()),
        auth: Some("Logged In".into()),
        first_name: Some("Ryan".into()),
        gender: Some("M".into()),
        item_in_session: Some(0),
        last_name: Some("Smith".into()),
        length: Some(236.09),
        level: Some("free".into()),
        location: Some("San Jose-Sunnyvale-Santa Clara, CA".into()),
        method: Some("PUT".into()),
        page: Some("NextSong".into()),
        registration: Some(1541016707796.0),
        session_id: Some(583),
        song: Some("Nothin' On You".into()),
        status: Some(200),
        ts: Some(ts),
        user_agent: Some("Mozilla/5.0 (X11; Linux x86_64)".into()),
        user_id: Some(user_id.into()),
    }
}

/// The catalog entry matching [`next_song_event`].
pub fn catalog_song(song_id: &str, artist_id: &str, year: i32) -> StagedSong {
    StagedSong {
        num_songs: Some(1),
        artist_id: Some(artist_id.into()),
        artist_latitude: None,
        artist_longitude: None,
        artist_location: Some("Winston-Salem, NC".into()),
        artist_name: Some("B.o.B".into()),
        song_id: Some(song_id.into()),
        title: Some("Nothin' On You".into()),
        duration: Some(236.09),
        year: Some(year),
    }
}

/// Lay out sources the way the raw buckets are organised and return a config pointing
/// at them:
/// - `log_data/2018-11-01-events.json` with every event, one per line
/// - `song_data/A/<song>.json` with one song per file
/// - `log_json_path.json` holding the default event mapping
pub fn write_sources(dir: &Path, events: &[StagedEvent], songs: &[StagedSong]) -> SourceConfig {
    let log_dir = dir.join("log_data");
    let song_dir = dir.join("song_data").join("A");
    fs::create_dir_all(&log_dir).unwrap();
    fs::create_dir_all(&song_dir).unwrap();

    let lines: String = events
        .iter()
        .map(|e| serde_json::to_string(e).unwrap() + "\n")
        .collect();
    fs::write(log_dir.join("2018-11-01-events.json"), lines).unwrap();

    for (i, song) in songs.iter().enumerate() {
        let line = serde_json::to_string(song).unwrap() + "\n";
        fs::write(song_dir.join(format!("TR{i:05}.json")), line).unwrap();
    }

    let spec_path = dir.join("log_json_path.json");
    fs::write(&spec_path, FieldPathSpec::event_log().to_json()).unwrap();

    SourceConfig {
        events_source_uri: log_dir.to_string_lossy().into_owned(),
        events_field_path_spec: spec_path.to_string_lossy().into_owned(),
        songs_source_uri: dir.join("song_data").to_string_lossy().into_owned(),
        credential_reference: None,
    }
}
