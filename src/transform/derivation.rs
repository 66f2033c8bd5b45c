// src/transform/derivation.rs

use std::fmt;

use crate::schema::Table;
use crate::sql::{extract, row_number_over, Dialect, InsertSelect, Select};

/// One insert-select from the staging tables (or the fact table) into a warehouse table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Derivation {
    SongPlays,
    Users,
    Songs,
    Artists,
    Time,
}

impl Derivation {
    pub const ALL: [Derivation; 5] = [
        Derivation::SongPlays,
        Derivation::Users,
        Derivation::Songs,
        Derivation::Artists,
        Derivation::Time,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Derivation::SongPlays => "song_plays",
            Derivation::Users => "users",
            Derivation::Songs => "songs",
            Derivation::Artists => "artists",
            Derivation::Time => "time",
        }
    }

    pub fn target(&self) -> Table {
        match self {
            Derivation::SongPlays => Table::SongPlay,
            Derivation::Users => Table::Users,
            Derivation::Songs => Table::Songs,
            Derivation::Artists => Table::Artists,
            Derivation::Time => Table::Time,
        }
    }

    /// Derivations whose output this one reads.
    pub fn depends_on(&self) -> &'static [Derivation] {
        match self {
            Derivation::Time => &[Derivation::SongPlays],
            _ => &[],
        }
    }

    pub fn statement(&self, dialect: Dialect) -> String {
        let def = self.target().def();
        let select = match self {
            Derivation::SongPlays => song_plays(dialect),
            Derivation::Users => users(),
            Derivation::Songs => songs(),
            Derivation::Artists => artists(),
            Derivation::Time => time(),
        };
        InsertSelect::new(def.name, def.insert_columns(), select).render()
    }
}

impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// NextSong events joined to the catalog on title, artist name and track length.
///
/// The join is exact equality on all three, so plays whose metadata differs from the
/// catalog in any way (spelling, a rounding difference in length) are dropped. Both
/// length columns are DECIMAL(9, 5), which keeps the comparison off binary floats.
fn song_plays(dialect: Dialect) -> Select {
    Select::from_source("staging_events se")
        .column(dialect.epoch_millis_to_timestamp("se.ts"))
        .columns([
            "se.user_id",
            "se.level",
            "ss.song_id",
            "ss.artist_id",
            "se.session_id",
            "se.location",
            "se.user_agent",
        ])
        .inner_join(
            "staging_songs ss",
            &[
                ("se.song", "ss.title"),
                ("se.artist", "ss.artist_name"),
                ("se.length", "ss.duration"),
            ],
        )
        .filter("se.page = 'NextSong'")
        .filter("ss.song_id IS NOT NULL")
        .filter("ss.artist_id IS NOT NULL")
}

/// Attributes from each user's most recent event. A blank id is still a user; only
/// events without one are skipped.
fn users() -> Select {
    let ranked = Select::from_source("staging_events se")
        .columns([
            "se.user_id",
            "se.first_name",
            "se.last_name",
            "se.gender",
            "se.level",
        ])
        .column_as(
            row_number_over(
                "se.user_id",
                &[
                    "se.ts DESC NULLS LAST",
                    "se.session_id DESC NULLS LAST",
                    "se.item_in_session DESC NULLS LAST",
                    "se.level DESC NULLS LAST",
                ],
            ),
            "recency",
        )
        .filter("se.user_id IS NOT NULL");

    Select::from_source(ranked.subquery("latest"))
        .columns([
            "latest.user_id",
            "latest.first_name",
            "latest.last_name",
            "latest.gender",
            "latest.level",
        ])
        .filter("latest.recency = 1")
}

/// One row per catalog entry; year 0 means unknown.
fn songs() -> Select {
    Select::from_source("staging_songs ss").columns([
        "ss.song_id",
        "ss.title",
        "ss.artist_id",
        "NULLIF(ss.year, 0)",
        "ss.duration",
    ])
}

/// Per artist, the catalog entry with the latest year (ties by song id, then title).
fn artists() -> Select {
    let ranked = Select::from_source("staging_songs ss")
        .columns([
            "ss.artist_id",
            "ss.artist_name",
            "ss.artist_location",
            "ss.artist_latitude",
            "ss.artist_longitude",
        ])
        .column_as(
            row_number_over(
                "ss.artist_id",
                &["ss.year DESC NULLS LAST", "ss.song_id", "ss.title"],
            ),
            "recency",
        )
        .filter("ss.artist_id IS NOT NULL");

    Select::from_source(ranked.subquery("latest"))
        .columns([
            "latest.artist_id",
            "latest.artist_name",
            "latest.artist_location",
            "latest.artist_latitude",
            "latest.artist_longitude",
        ])
        .filter("latest.recency = 1")
}

/// Calendar parts of every distinct play time. `dow` counts from Sunday = 0.
fn time() -> Select {
    let distinct = Select::from_source(Table::SongPlay.name())
        .distinct()
        .column("start_time");
    let mut select = Select::from_source(distinct.subquery("sp")).column("sp.start_time");
    for part in ["hour", "day", "week", "month", "year", "dow"] {
        select = select.column(extract(part, "sp.start_time"));
    }
    select
}
