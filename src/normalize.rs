//!
//! src/normalize.rs  Andrew Belles  Oct 3rd, 2025
//!
//! Flattens raw playlist entries into song, album, and artist
//! collections. Albums and artists are deduplicated by id within
//! one batch; songs keep the input order
//!
//!

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::PipelineError;
use crate::records::{AlbumRecord, ArtistRecord, SongRecord};
use crate::types::TrackEntry;

/// Output of one normalization pass over a raw batch
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    pub songs: Vec<SongRecord>,
    pub albums: Vec<AlbumRecord>,
    pub artists: Vec<ArtistRecord>,
}

fn missing(idx: usize, field: &str) -> PipelineError {
    PipelineError::MalformedInput(format!("entry {idx}: {field} missing"))
}

fn require<T: Clone>(idx: usize, field: &str, value: &Option<T>) ->
    Result<T, PipelineError> {
    value.clone().ok_or_else(|| missing(idx, field))
}

/// Accepts the three precisions the api emits: YYYY, YYYY-MM,
/// YYYY-MM-DD. Missing parts floor to january / the 1st
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.split('-');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = match parts.next() {
        Some(m) => m.parse::<u32>().ok()?,
        None => 1,
    };
    let day = match parts.next() {
        Some(d) => d.parse::<u32>().ok()?,
        None => 1,
    };
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

///
/// Walks the batch once. Any malformed required field fails the
/// whole batch so a partial invocation never lands downstream.
/// Duplicate albums/artists are skipped before their remaining
/// fields are checked, first occurrence wins
///
pub fn normalize(entries: &[TrackEntry], song_added: DateTime<Utc>) ->
    Result<RecordSet, PipelineError> {

    let mut songs: Vec<SongRecord>     = Vec::with_capacity(entries.len());
    let mut albums: Vec<AlbumRecord>   = Vec::new();
    let mut artists: Vec<ArtistRecord> = Vec::new();

    let mut seen_albums: HashSet<String>  = HashSet::new();
    let mut seen_artists: HashSet<String> = HashSet::new();

    for (idx, entry) in entries.iter().enumerate() {
        let track = entry.track.as_ref().ok_or_else(|| missing(idx, "track"))?;

        let song_id     = require(idx, "track.id", &track.id)?;
        let song_name   = require(idx, "track.name", &track.name)?;
        let duration_ms = require(idx, "track.duration_ms", &track.duration_ms)?;

        let mut album_id: Option<String> = None;
        if let Some(album) = &track.album {
            let id = require(idx, "album.id", &album.id)?;
            if seen_albums.insert(id.clone()) {
                let raw_date = require(idx, "album.release_date", &album.release_date)?;
                let release_date = parse_release_date(&raw_date)
                    .ok_or_else(|| PipelineError::MalformedInput(format!(
                        "entry {idx}: album.release_date unparseable: {raw_date:?}"
                    )))?;
                let name         = require(idx, "album.name", &album.name)?;
                let total_tracks = require(idx, "album.total_tracks", &album.total_tracks)?;

                albums.push(AlbumRecord {
                    album_id: id.clone(),
                    name,
                    release_date,
                    total_tracks,
                    url: album.external_urls.spotify.clone(),
                });
            }
            album_id = Some(id);
        }

        let mut artist_id: Option<String> = None;
        for artist in &track.artists {
            let id = require(idx, "artist.id", &artist.id)?;
            if artist_id.is_none() {
                artist_id = Some(id.clone());
            }
            if seen_artists.insert(id.clone()) {
                let name = require(idx, "artist.name", &artist.name)?;
                artists.push(ArtistRecord {
                    artist_id: id,
                    name,
                    url: artist.external_urls.spotify.clone(),
                });
            }
        }

        songs.push(SongRecord {
            song_id,
            song_name,
            duration_ms,
            url: track.external_urls.spotify.clone(),
            popularity: track.popularity,
            song_added,
            album_id,
            artist_id,
        });
    }

    Ok( RecordSet { songs, albums, artists } )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_batch;
    use chrono::TimeZone;
    use serde_json::{json, Value};

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 5, 12, 0, 0).unwrap()
    }

    fn entry(track_id: &str, album_id: &str, artist_id: &str) -> Value {
        json!({
            "track": {
                "id": track_id,
                "name": format!("song {track_id}"),
                "duration_ms": 200_000,
                "popularity": 50,
                "external_urls": {
                    "spotify": format!("https://open.spotify.com/track/{track_id}")
                },
                "album": {
                    "id": album_id,
                    "name": format!("album {album_id}"),
                    "release_date": "2004-06-15",
                    "total_tracks": 12,
                    "external_urls": {
                        "spotify": format!("https://open.spotify.com/album/{album_id}")
                    }
                },
                "artists": [{
                    "id": artist_id,
                    "name": format!("artist {artist_id}"),
                    "external_urls": {
                        "spotify": format!("https://open.spotify.com/artist/{artist_id}")
                    }
                }]
            }
        })
    }

    fn batch(entries: &[Value]) -> Vec<TrackEntry> {
        let doc = Value::Array(entries.to_vec()).to_string();
        parse_batch(&doc).unwrap()
    }

    #[test]
    fn flattens_one_entry_per_collection() {
        let entries = batch(&[entry("t1", "a1", "r1")]);
        let set = normalize(&entries, ts()).unwrap();

        assert_eq!(set.songs.len(), 1);
        assert_eq!(set.albums.len(), 1);
        assert_eq!(set.artists.len(), 1);

        let song = &set.songs[0];
        assert_eq!(song.song_id, "t1");
        assert_eq!(song.song_name, "song t1");
        assert_eq!(song.duration_ms, 200_000);
        assert_eq!(song.popularity, Some(50));
        assert_eq!(song.song_added, ts());
        assert_eq!(song.album_id.as_deref(), Some("a1"));
        assert_eq!(song.artist_id.as_deref(), Some("r1"));

        assert_eq!(set.albums[0].album_id, "a1");
        assert_eq!(set.albums[0].total_tracks, 12);
        assert_eq!(set.artists[0].artist_id, "r1");
    }

    #[test]
    fn deduplicates_shared_album() {
        let entries = batch(&[
            entry("t1", "a1", "r1"),
            entry("t2", "a1", "r2"),
        ]);
        let set = normalize(&entries, ts()).unwrap();

        assert_eq!(set.songs.len(), 2);
        assert_eq!(set.albums.len(), 1);
        assert_eq!(set.artists.len(), 2);

        // song order mirrors the input
        assert_eq!(set.songs[0].song_id, "t1");
        assert_eq!(set.songs[1].song_id, "t2");
        assert_eq!(set.songs[1].album_id.as_deref(), Some("a1"));
    }

    #[test]
    fn multiple_artists_fan_out() {
        let mut e = entry("t1", "a1", "r1");
        e["track"]["artists"] = json!([
            { "id": "r1", "name": "lead" },
            { "id": "r2", "name": "feature one" },
            { "id": "r3", "name": "feature two" }
        ]);
        let entries = batch(&[e]);
        let set = normalize(&entries, ts()).unwrap();

        assert_eq!(set.artists.len(), 3);
        assert_eq!(set.songs[0].artist_id.as_deref(), Some("r1"));
        assert!(set.artists[1].url.is_none());
    }

    #[test]
    fn missing_album_keeps_song() {
        let mut e = entry("t1", "a1", "r1");
        e["track"]["album"] = Value::Null;
        let entries = batch(&[e]);
        let set = normalize(&entries, ts()).unwrap();

        assert_eq!(set.songs.len(), 1);
        assert!(set.albums.is_empty());
        assert!(set.songs[0].album_id.is_none());
    }

    #[test]
    fn missing_artists_keeps_song() {
        let mut e = entry("t1", "a1", "r1");
        e["track"]["artists"] = json!([]);
        let entries = batch(&[e]);
        let set = normalize(&entries, ts()).unwrap();

        assert_eq!(set.songs.len(), 1);
        assert!(set.artists.is_empty());
        assert!(set.songs[0].artist_id.is_none());
    }

    #[test]
    fn empty_batch_yields_empty_set() {
        let set = normalize(&[], ts()).unwrap();
        assert!(set.songs.is_empty());
        assert!(set.albums.is_empty());
        assert!(set.artists.is_empty());
    }

    #[test]
    fn null_track_fails_batch() {
        let entries = batch(&[json!({ "track": null })]);
        let err = normalize(&entries, ts()).unwrap_err();
        match err {
            PipelineError::MalformedInput(msg) => assert!(msg.contains("track")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_track_id_fails_batch() {
        let mut e = entry("t1", "a1", "r1");
        e["track"]["id"] = Value::Null;
        let entries = batch(&[e]);
        let err = normalize(&entries, ts()).unwrap_err();
        match err {
            PipelineError::MalformedInput(msg) => assert!(msg.contains("track.id")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unparseable_release_date_fails_batch() {
        let mut e = entry("t1", "a1", "r1");
        e["track"]["album"]["release_date"] = json!("next Tuesday");
        let entries = batch(&[e]);
        let err = normalize(&entries, ts()).unwrap_err();
        match err {
            PipelineError::MalformedInput(msg) => {
                assert!(msg.contains("release_date"));
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn first_seen_album_fields_win() {
        let mut dup = entry("t2", "a1", "r2");
        dup["track"]["album"]["release_date"] = json!("garbage");
        dup["track"]["album"]["name"] = Value::Null;

        let entries = batch(&[entry("t1", "a1", "r1"), dup]);
        let set = normalize(&entries, ts()).unwrap();

        assert_eq!(set.albums.len(), 1);
        assert_eq!(set.albums[0].name, "album a1");
        assert_eq!(
            set.albums[0].release_date,
            NaiveDate::from_ymd_opt(2004, 6, 15).unwrap()
        );
    }

    #[test]
    fn same_batch_same_stamp_is_identical() {
        let entries = batch(&[
            entry("t1", "a1", "r1"),
            entry("t2", "a2", "r1"),
        ]);

        let first  = normalize(&entries, ts()).unwrap();
        let second = normalize(&entries, ts()).unwrap();
        assert_eq!(first, second);

        let later = ts() + chrono::Duration::hours(1);
        let mut shifted = normalize(&entries, later).unwrap();
        assert_ne!(first.songs[0].song_added, shifted.songs[0].song_added);
        for song in &mut shifted.songs {
            song.song_added = ts();
        }
        assert_eq!(first, shifted);
    }

    #[test]
    fn release_date_precisions() {
        assert_eq!(
            parse_release_date("1967"),
            NaiveDate::from_ymd_opt(1967, 1, 1)
        );
        assert_eq!(
            parse_release_date("1967-03"),
            NaiveDate::from_ymd_opt(1967, 3, 1)
        );
        assert_eq!(
            parse_release_date("1967-03-05"),
            NaiveDate::from_ymd_opt(1967, 3, 5)
        );
        assert_eq!(parse_release_date("1967-13"), None);
        assert_eq!(parse_release_date("1967-03-05-01"), None);
        assert_eq!(parse_release_date(""), None);
    }
}
