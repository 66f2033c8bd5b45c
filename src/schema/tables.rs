// src/schema/tables.rs

use super::types::{Column, ColumnType::*, TableDef};

/// The seven tables of the warehouse: two staging tables, one fact, four dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    StagingEvents,
    StagingSongs,
    SongPlay,
    Users,
    Songs,
    Artists,
    Time,
}

impl Table {
    /// Every table, in creation order.
    pub const ALL: [Table; 7] = [
        Table::StagingEvents,
        Table::StagingSongs,
        Table::SongPlay,
        Table::Users,
        Table::Songs,
        Table::Artists,
        Table::Time,
    ];

    pub fn name(&self) -> &'static str {
        self.def().name
    }

    pub fn def(&self) -> &'static TableDef {
        match self {
            Table::StagingEvents => &STAGING_EVENTS,
            Table::StagingSongs => &STAGING_SONGS,
            Table::SongPlay => &SONGPLAY,
            Table::Users => &USERS,
            Table::Songs => &SONGS,
            Table::Artists => &ARTISTS,
            Table::Time => &TIME,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Table::ALL.into_iter().find(|t| t.name() == name)
    }
}

/// One row per line of the listening log. Columns line up positionally with the
/// event field path spec.
static STAGING_EVENTS: TableDef = TableDef {
    name: "staging_events",
    columns: &[
        Column::new("artist", Varchar(300)),
        Column::new("auth", Varchar(25)),
        Column::new("first_name", Varchar(25)),
        Column::new("gender", Varchar(1)),
        Column::new("item_in_session", Integer),
        Column::new("last_name", Varchar(25)),
        Column::new("length", Decimal(9, 5)),
        Column::new("level", Varchar(10)),
        Column::new("location", Varchar(300)),
        Column::new("method", Varchar(6)),
        Column::new("page", Varchar(50)),
        Column::new("registration", Decimal(14, 1)),
        Column::new("session_id", Integer),
        Column::new("song", Varchar(300)),
        Column::new("status", Integer),
        Column::new("ts", BigInt),
        Column::new("user_agent", Varchar(150)),
        Column::new("user_id", Varchar(10)),
    ],
};

/// One row per catalog song file. Column names equal the source JSON keys.
static STAGING_SONGS: TableDef = TableDef {
    name: "staging_songs",
    columns: &[
        Column::new("num_songs", Integer),
        Column::new("artist_id", Varchar(25)),
        Column::new("artist_latitude", Decimal(10, 5)),
        Column::new("artist_longitude", Decimal(10, 5)),
        Column::new("artist_location", Varchar(300)),
        Column::new("artist_name", Varchar(300)),
        Column::new("song_id", Varchar(25)),
        Column::new("title", Varchar(300)),
        Column::new("duration", Decimal(9, 5)),
        Column::new("year", Integer),
    ],
};

static SONGPLAY: TableDef = TableDef {
    name: "songplay",
    columns: &[
        Column::new("songplay_id", Identity).primary_key(),
        Column::new("start_time", Timestamp).not_null(),
        Column::new("user_id", Varchar(10)),
        Column::new("level", Varchar(10)),
        Column::new("song_id", Varchar(25)).not_null(),
        Column::new("artist_id", Varchar(25)).not_null(),
        Column::new("session_id", Integer),
        Column::new("location", Varchar(300)),
        Column::new("user_agent", Varchar(150)),
    ],
};

static USERS: TableDef = TableDef {
    name: "sparkify_user",
    columns: &[
        Column::new("user_id", Varchar(10)).primary_key(),
        Column::new("first_name", Varchar(25)),
        Column::new("last_name", Varchar(25)),
        Column::new("gender", Varchar(1)),
        Column::new("level", Varchar(10)),
    ],
};

static SONGS: TableDef = TableDef {
    name: "song",
    columns: &[
        Column::new("song_id", Varchar(25)).primary_key(),
        Column::new("title", Varchar(300)).not_null(),
        Column::new("artist_id", Varchar(25)),
        Column::new("year", Integer),
        Column::new("duration", Decimal(9, 5)).not_null(),
    ],
};

static ARTISTS: TableDef = TableDef {
    name: "artist",
    columns: &[
        Column::new("artist_id", Varchar(25)).primary_key(),
        Column::new("name", Varchar(300)).not_null(),
        Column::new("location", Varchar(300)),
        Column::new("latitude", Decimal(10, 5)),
        Column::new("longitude", Decimal(10, 5)),
    ],
};

static TIME: TableDef = TableDef {
    name: "start_time",
    columns: &[
        Column::new("start_time", Timestamp).primary_key(),
        Column::new("hour", Integer),
        Column::new("day", Integer),
        Column::new("week", Integer),
        Column::new("month", Integer),
        Column::new("year", Integer),
        Column::new("weekday", Integer),
    ],
};
