use serde::Deserialize;

use crate::errors::PipelineError;

// One element of the playlist items array. The api nests the
// track object and nulls it for removed/local entries
#[derive(Debug, Clone, Deserialize)]
pub struct TrackEntry {
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: Option<String>,
    pub duration_ms: Option<u64>,
    pub popularity: Option<u32>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    pub album: Option<Album>,
    #[serde(default)]
    pub artists: Vec<Artist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    pub id: Option<String>,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub total_tracks: Option<u32>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

/// Parses a staged raw document back into playlist entries
pub fn parse_batch(doc: &str) -> Result<Vec<TrackEntry>, PipelineError> {
    serde_json::from_str::<Vec<TrackEntry>>(doc)
        .map_err(|e| PipelineError::MalformedInput(format!("raw batch: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_and_ignores_unknown_fields() {
        let doc = r#"[
            {
                "added_at": "2025-09-30T08:00:00Z",
                "track": {
                    "id": "3n3Ppam7vgaVa1iaRUc9Lp",
                    "name": "Mr. Brightside",
                    "duration_ms": 222075,
                    "popularity": 77,
                    "href": "https://api.spotify.com/v1/tracks/3n3Ppam7vgaVa1iaRUc9Lp",
                    "external_urls": { "spotify": "https://open.spotify.com/track/3n3Ppam7vgaVa1iaRUc9Lp" },
                    "album": {
                        "id": "4OHNH3sDzIxnmUADXzv2kT",
                        "name": "Hot Fuss",
                        "release_date": "2004-06-15",
                        "release_date_precision": "day",
                        "total_tracks": 12,
                        "external_urls": { "spotify": "https://open.spotify.com/album/4OHNH3sDzIxnmUADXzv2kT" }
                    },
                    "artists": [
                        {
                            "id": "0C0XlULifJtAgn6ZNCW2eu",
                            "name": "The Killers",
                            "uri": "spotify:artist:0C0XlULifJtAgn6ZNCW2eu"
                        }
                    ]
                }
            }
        ]"#;

        let entries = parse_batch(doc).unwrap();
        assert_eq!(entries.len(), 1);

        let track = entries[0].track.as_ref().unwrap();
        assert_eq!(track.id.as_deref(), Some("3n3Ppam7vgaVa1iaRUc9Lp"));
        assert_eq!(track.duration_ms, Some(222075));
        assert_eq!(track.artists.len(), 1);

        let album = track.album.as_ref().unwrap();
        assert_eq!(album.release_date.as_deref(), Some("2004-06-15"));
        assert_eq!(album.total_tracks, Some(12));
    }

    #[test]
    fn null_track_deserializes_to_none() {
        let doc = r#"[ { "track": null } ]"#;
        let entries = parse_batch(doc).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].track.is_none());
    }

    #[test]
    fn rejects_non_array_document() {
        let doc = r#"{ "items": [] }"#;
        let err = parse_batch(doc).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput(_)));
    }
}
