//!
//! src/pipeline.rs  Andrew Belles  Oct 4th, 2025
//!
//! The two invocation entry points. Extract pulls one playlist
//! batch into the raw store; transform normalizes one staged
//! object and lands the csv datasets. Each invocation is all or
//! nothing and carries a run id through its log events
//!
//!

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::{PlaylistConfig, StoreConfig};
use crate::errors::{PipelineError, Stage};
use crate::fetch::{self, SpotifyClient};
use crate::normalize;
use crate::sink::{RawStore, TabularStore};
use crate::types;

/// Millisecond-precision utc stamp used in object keys
pub fn invocation_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%S%.3fZ").to_string()
}

#[derive(Debug)]
pub struct ExtractOutcome {
    pub object: PathBuf,
    pub entries: usize,
}

#[derive(Debug)]
pub struct TransformSummary {
    pub songs: usize,
    pub albums: usize,
    pub artists: usize,
    pub outputs: Vec<PathBuf>,
    pub archived: PathBuf,
}

///
/// Timer-triggered entry point. Fetches one playlist batch and
/// stages it verbatim under raw/to_process
///
pub async fn run_extract(
    client: &SpotifyClient,
    playlist: &PlaylistConfig,
    store: &StoreConfig
) -> Result<ExtractOutcome, PipelineError> {
    let run = Uuid::new_v4();
    let mut stage = Stage::Received;
    info!(%run, playlist = %playlist.playlist_id, "extract.start");

    match extract_inner(client, playlist, store, &mut stage).await {
        Ok(outcome) => {
            info!(
                %run,
                stage = Stage::Done.as_str(),
                entries = outcome.entries,
                object = %outcome.object.display(),
                "extract.done"
            );
            Ok(outcome)
        }
        Err(e) => {
            error!(
                %run,
                stage = stage.as_str(),
                kind = e.kind(),
                error = %e,
                "extract.failed"
            );
            Err(e)
        }
    }
}

async fn extract_inner(
    client: &SpotifyClient,
    playlist: &PlaylistConfig,
    store: &StoreConfig,
    stage: &mut Stage
) -> Result<ExtractOutcome, PipelineError> {
    let bearer  = client.access_token().await?;
    let entries = fetch::fetch_playlist_batch(client, playlist, &bearer).await?;
    *stage = Stage::Extracted;

    let stamp  = invocation_stamp(Utc::now());
    let object = RawStore::new(&store.data_root).write_batch(&stamp, &entries)?;
    Ok( ExtractOutcome { object, entries: entries.len() } )
}

///
/// Upload-triggered entry point. Normalizes one staged raw
/// object, lands the three csv datasets under one stamp, then
/// archives the object. Nothing lands if any step fails
///
pub fn run_transform(store: &StoreConfig, object: &Path) ->
    Result<TransformSummary, PipelineError> {
    let run = Uuid::new_v4();
    let mut stage = Stage::Received;
    info!(%run, object = %object.display(), "transform.start");

    match transform_inner(store, object, &mut stage) {
        Ok(summary) => {
            info!(
                %run,
                stage = Stage::Done.as_str(),
                songs = summary.songs,
                albums = summary.albums,
                artists = summary.artists,
                "transform.done"
            );
            Ok(summary)
        }
        Err(e) => {
            error!(
                %run,
                stage = stage.as_str(),
                kind = e.kind(),
                error = %e,
                object = %object.display(),
                "transform.failed"
            );
            Err(e)
        }
    }
}

fn transform_inner(store: &StoreConfig, object: &Path, stage: &mut Stage) ->
    Result<TransformSummary, PipelineError> {
    let raw = RawStore::new(&store.data_root);
    let doc = raw.read_object(object)?;
    let entries = types::parse_batch(&doc)?;

    let now = Utc::now();
    let set = normalize::normalize(&entries, now)?;
    *stage = Stage::Normalized;

    let tabular = TabularStore::new(&store.data_root);
    let stamp = invocation_stamp(now);

    // every dataset serializes before any lands at its key
    let staged = [
        tabular.stage_songs(&stamp, &set.songs)?,
        tabular.stage_albums(&stamp, &set.albums)?,
        tabular.stage_artists(&stamp, &set.artists)?,
    ];
    let mut outputs = Vec::with_capacity(staged.len());
    for dataset in staged {
        outputs.push(dataset.persist()?);
    }
    *stage = Stage::Written;

    let archived = raw.archive(object)?;

    Ok( TransformSummary {
        songs: set.songs.len(),
        albums: set.albums.len(),
        artists: set.artists.len(),
        outputs,
        archived,
    })
}
