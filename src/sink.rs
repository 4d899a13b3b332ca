use std::{fs, io::ErrorKind, path::{Path, PathBuf}};

use serde::Serialize;
use serde_json::Value;

use crate::errors::PipelineError;
use crate::records::{AlbumRecord, ArtistRecord, RecordKind, SongRecord};

pub const RAW_PENDING_PREFIX: &str = "raw/to_process";
pub const RAW_PROCESSED_PREFIX: &str = "raw/processed";

pub struct RawStore {
    root: PathBuf,
}

impl RawStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    /// Key a fresh batch lands under, relative to the root
    pub fn pending_key(stamp: &str) -> PathBuf {
        PathBuf::from(RAW_PENDING_PREFIX).join(format!("{stamp}.json"))
    }

    /// Stages one batch verbatim as a json array. Writes through
    /// a tempfile so a partial object is never visible, and an
    /// object already at the key is never replaced
    pub fn write_batch(&self, stamp: &str, batch: &[Value]) ->
        Result<PathBuf, PipelineError> {

        let path = self.root.join(Self::pending_key(stamp));

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e|
                PipelineError::Write(
                    format!("create dir {}: {e}", parent.display())
            ))?;
        }

        let temp = tempfile::NamedTempFile::new_in(path.parent().unwrap())
            .map_err(|e| PipelineError::Write(
                format!("tempfile in {}: {e}", path.parent().unwrap().display())
            ))?;

        serde_json::to_writer(temp.as_file(), batch)
            .map_err(|e| PipelineError::Write(format!("serialize batch: {e}")))?;

        temp.persist_noclobber(&path).map_err(|e|
            PipelineError::Write(format!("persist {}: {e}", path.display())))?;

        Ok(path)
    }

    /// Reads one staged object. The key may be relative to the
    /// root or absolute
    pub fn read_object(&self, key: &Path) -> Result<String, PipelineError> {
        let path = self.root.join(key);
        match fs::read_to_string(&path) {
            Ok(doc) => Ok(doc),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(
                PipelineError::NotFound(format!("{}", path.display()))
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// Moves a consumed raw object from to_process to processed
    pub fn archive(&self, key: &Path) -> Result<PathBuf, PipelineError> {
        let src = self.root.join(key);
        let name = src.file_name().ok_or_else(|| PipelineError::Write(
            format!("no file name in {}", src.display())
        ))?;

        let dest_dir = self.root.join(RAW_PROCESSED_PREFIX);
        fs::create_dir_all(&dest_dir).map_err(|e|
            PipelineError::Write(
                format!("create dir {}: {e}", dest_dir.display())
        ))?;

        let dest = dest_dir.join(name);
        fs::rename(&src, &dest).map_err(|e|
            PipelineError::Write(format!("archive {}: {e}", src.display())))?;

        Ok(dest)
    }
}

///
/// One serialized csv dataset parked in a tempfile next to its
/// final key. Nothing is visible at the key until persist runs,
/// so a caller can serialize several datasets and only land
/// them once all of them succeeded
///
pub struct StagedDataset {
    temp: tempfile::NamedTempFile,
    path: PathBuf,
}

impl StagedDataset {
    /// Moves the dataset to its final key. An object already at
    /// the key is never replaced
    pub fn persist(self) -> Result<PathBuf, PipelineError> {
        let StagedDataset { temp, path } = self;
        temp.persist_noclobber(&path).map_err(|e|
            PipelineError::Write(format!("persist {}: {e}", path.display())))?;
        Ok(path)
    }
}

pub struct TabularStore {
    root: PathBuf,
}

impl TabularStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    fn rel_path(kind: RecordKind, stamp: &str) -> PathBuf {
        PathBuf::from(kind.prefix()).join(format!("{}_{stamp}.csv", kind.as_str()))
    }

    pub fn stage_songs(&self, stamp: &str, rows: &[SongRecord]) ->
        Result<StagedDataset, PipelineError> {
        self.stage_records(RecordKind::Songs, stamp, rows)
    }

    pub fn stage_albums(&self, stamp: &str, rows: &[AlbumRecord]) ->
        Result<StagedDataset, PipelineError> {
        self.stage_records(RecordKind::Albums, stamp, rows)
    }

    pub fn stage_artists(&self, stamp: &str, rows: &[ArtistRecord]) ->
        Result<StagedDataset, PipelineError> {
        self.stage_records(RecordKind::Artists, stamp, rows)
    }

    /// Serializes one csv dataset without landing it. An empty
    /// batch still gets the header row so the column contract
    /// holds. Kept private so the kind and row type stay paired
    /// through the methods above
    fn stage_records<T: Serialize>(
        &self,
        kind: RecordKind,
        stamp: &str,
        rows: &[T]
    ) -> Result<StagedDataset, PipelineError> {
        let path = self.root.join(Self::rel_path(kind, stamp));

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e|
                PipelineError::Write(
                    format!("create dir {}: {e}", parent.display())
            ))?;
        }

        let temp = tempfile::NamedTempFile::new_in(path.parent().unwrap())
            .map_err(|e| PipelineError::Write(
                format!("tempfile in {}: {e}", path.parent().unwrap().display())
            ))?;

        {
            let mut writer = csv::Writer::from_writer(temp.as_file());
            if rows.is_empty() {
                writer.write_record(kind.columns())?;
            }
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush().map_err(|e|
                PipelineError::Write(format!("flush csv: {e}")))?;
        }

        Ok( StagedDataset { temp, path } )
    }
}
