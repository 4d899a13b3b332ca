use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// Column order is the output contract; serialized field order
// below must stay in sync with these
pub const SONG_COLUMNS: [&str; 8] = [
    "song_id", "song_name", "duration_ms", "url",
    "popularity", "song_added", "album_id", "artist_id",
];

pub const ALBUM_COLUMNS: [&str; 5] = [
    "album_id", "name", "release_date", "total_tracks", "url",
];

pub const ARTIST_COLUMNS: [&str; 3] = [
    "artist_id", "name", "url",
];

/// One playlist entry, keyed to its album and primary artist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    pub song_id: String,
    pub song_name: String,
    pub duration_ms: u64,
    pub url: Option<String>,
    pub popularity: Option<u32>,
    pub song_added: DateTime<Utc>,
    pub album_id: Option<String>,
    pub artist_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumRecord {
    pub album_id: String,
    pub name: String,
    pub release_date: NaiveDate,
    pub total_tracks: u32,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRecord {
    pub artist_id: String,
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Songs,
    Albums,
    Artists,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Songs => "songs",
            RecordKind::Albums => "albums",
            RecordKind::Artists => "artists",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            RecordKind::Songs => "transformed/songs",
            RecordKind::Albums => "transformed/albums",
            RecordKind::Artists => "transformed/artists",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            RecordKind::Songs => &SONG_COLUMNS,
            RecordKind::Albums => &ALBUM_COLUMNS,
            RecordKind::Artists => &ARTIST_COLUMNS,
        }
    }
}
