use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

use crate::constants::artifacts::{JSON_EXTENSION, SEQUENCE_WIDTH, TIMESTAMP_FORMAT};
use crate::errors::PipelineError;
use crate::transport::fs::write_new_json_pretty;
use crate::types::{SourceId, TimestampString};

/// Named category of persisted pipeline output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Every discovered URL, duplicates included.
    AggregatedUrls,
    /// Deduplicated, keyword-filtered URLs.
    FilteredUrls,
    /// Primary work batch, mutated by the collector.
    UrlsToCollect,
    /// Immutable copy of a work batch.
    UrlsToCollectAnchor,
}

impl ArtifactKind {
    /// Stable name used in file names (`aggregated_urls`, ...).
    pub const fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::AggregatedUrls => "aggregated_urls",
            ArtifactKind::FilteredUrls => "filtered_urls",
            ArtifactKind::UrlsToCollect => "urls_to_collect",
            ArtifactKind::UrlsToCollectAnchor => "urls_to_collect_anchor",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addresses one save: what kind, for which source, into which folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactKey {
    /// Artifact category.
    pub kind: ArtifactKind,
    /// Source namespacing the file name.
    pub source: SourceId,
    /// Destination folder.
    pub dir: PathBuf,
}

impl ArtifactKey {
    /// Key for one save.
    pub fn new(kind: ArtifactKind, source: impl Into<SourceId>, dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            source: source.into(),
            dir: dir.into(),
        }
    }
}

/// Persistence backend for pipeline artifacts.
///
/// Successive saves of the same kind must produce distinct names that sort in
/// save order.
pub trait ArtifactStore: Send + Sync {
    /// Persist `payload` as one JSON array and return where it went.
    fn save(&self, key: &ArtifactKey, payload: &[Value]) -> Result<PathBuf, PipelineError>;
}

/// Serialize typed records into the store's payload form.
pub fn to_payload<T: Serialize>(records: &[T]) -> Result<Vec<Value>, PipelineError> {
    records
        .iter()
        .map(|record| {
            serde_json::to_value(record)
                .map_err(|err| PipelineError::Persistence(format!("unserializable record: {err}")))
        })
        .collect()
}

/// Current local time formatted for file-name prefixes.
pub fn timestamp_now() -> TimestampString {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// File-backed store writing `{timestamp}_{sequence}_{kind}_{source}.json`.
///
/// Each kind has its own sequence counter, so batch `i` of a partitioning run
/// carries the same sequence in both the primary and anchor folders. A name
/// that already exists on disk is never overwritten; the sequence advances
/// past it instead.
pub struct FileArtifactStore {
    sequences: Mutex<HashMap<ArtifactKind, u64>>,
}

impl fmt::Debug for FileArtifactStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileArtifactStore").finish_non_exhaustive()
    }
}

impl Default for FileArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileArtifactStore {
    /// Store with all sequences starting at zero.
    pub fn new() -> Self {
        Self {
            sequences: Mutex::new(HashMap::new()),
        }
    }

    fn next_sequence(&self, kind: ArtifactKind) -> Result<u64, PipelineError> {
        let mut guard = self
            .sequences
            .lock()
            .map_err(|_| PipelineError::Persistence("sequence lock poisoned".into()))?;
        let slot = guard.entry(kind).or_insert(0);
        let sequence = *slot;
        *slot += 1;
        Ok(sequence)
    }
}

/// File name for one artifact.
pub fn artifact_file_name(
    timestamp: &str,
    sequence: u64,
    kind: ArtifactKind,
    source: &str,
) -> String {
    format!(
        "{timestamp}_{sequence:0width$}_{kind}_{source}.{JSON_EXTENSION}",
        width = SEQUENCE_WIDTH
    )
}

impl ArtifactStore for FileArtifactStore {
    fn save(&self, key: &ArtifactKey, payload: &[Value]) -> Result<PathBuf, PipelineError> {
        let timestamp = timestamp_now();
        loop {
            let sequence = self.next_sequence(key.kind)?;
            let path = key
                .dir
                .join(artifact_file_name(&timestamp, sequence, key.kind, &key.source));
            if write_new_json_pretty(&path, payload)? {
                return Ok(path);
            }
        }
    }
}

/// One save captured by [`MemoryArtifactStore`].
#[derive(Clone, Debug, PartialEq)]
pub struct SavedArtifact {
    /// Key the payload was saved under.
    pub key: ArtifactKey,
    /// Saved records.
    pub payload: Vec<Value>,
}

/// In-memory store that records saves in order; useful for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    saved: RwLock<Vec<SavedArtifact>>,
}

impl MemoryArtifactStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All saves so far, in save order.
    pub fn saved(&self) -> Result<Vec<SavedArtifact>, PipelineError> {
        self.saved
            .read()
            .map_err(|_| PipelineError::Persistence("memory store lock poisoned".into()))
            .map(|guard| guard.clone())
    }

    /// Saves of one kind, in save order.
    pub fn saved_of(&self, kind: ArtifactKind) -> Result<Vec<SavedArtifact>, PipelineError> {
        Ok(self
            .saved()?
            .into_iter()
            .filter(|artifact| artifact.key.kind == kind)
            .collect())
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn save(&self, key: &ArtifactKey, payload: &[Value]) -> Result<PathBuf, PipelineError> {
        let mut guard = self
            .saved
            .write()
            .map_err(|_| PipelineError::Persistence("memory store lock poisoned".into()))?;
        let sequence = guard
            .iter()
            .filter(|artifact| artifact.key.kind == key.kind)
            .count() as u64;
        guard.push(SavedArtifact {
            key: key.clone(),
            payload: payload.to_vec(),
        });
        Ok(key
            .dir
            .join(artifact_file_name("memory", sequence, key.kind, &key.source)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fs::{list_json_files, read_json};
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn file_names_embed_zero_padded_sequence() {
        assert_eq!(
            artifact_file_name("2025_02_25_14_03_59", 7, ArtifactKind::UrlsToCollect, "shop"),
            "2025_02_25_14_03_59_000007_urls_to_collect_shop.json"
        );
    }

    #[test]
    fn file_store_names_sort_in_save_order() {
        let temp = tempdir().unwrap();
        let store = FileArtifactStore::new();
        let key = ArtifactKey::new(ArtifactKind::UrlsToCollect, "shop", temp.path());
        let mut written = Vec::new();
        for batch in 0..12 {
            written.push(store.save(&key, &[json!({"batch": batch})]).unwrap());
        }
        let listed = list_json_files(temp.path()).unwrap();
        assert_eq!(listed.len(), 12);
        let batches: Vec<i64> = listed
            .iter()
            .map(|path| read_json::<Vec<Value>>(path).unwrap()[0]["batch"].as_i64().unwrap())
            .collect();
        assert_eq!(batches, (0..12).collect::<Vec<i64>>());
        assert_eq!(written.len(), 12);
    }

    #[test]
    fn file_store_keeps_per_kind_sequences() {
        let temp = tempdir().unwrap();
        let store = FileArtifactStore::new();
        let primary = ArtifactKey::new(ArtifactKind::UrlsToCollect, "shop", temp.path().join("a"));
        let anchor = ArtifactKey::new(
            ArtifactKind::UrlsToCollectAnchor,
            "shop",
            temp.path().join("b"),
        );
        let first = store.save(&primary, &[]).unwrap();
        let first_anchor = store.save(&anchor, &[]).unwrap();
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        let anchor_name = first_anchor.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("_000000_urls_to_collect_shop.json"));
        assert!(anchor_name.ends_with("_000000_urls_to_collect_anchor_shop.json"));
    }

    #[test]
    fn file_store_never_overwrites_existing_names() {
        let temp = tempdir().unwrap();
        let key = ArtifactKey::new(ArtifactKind::FilteredUrls, "shop", temp.path());
        let first = FileArtifactStore::new().save(&key, &[json!(1)]).unwrap();
        let second = FileArtifactStore::new().save(&key, &[json!(2)]).unwrap();
        assert_ne!(first, second);
        assert_eq!(read_json::<Vec<Value>>(&first).unwrap(), vec![json!(1)]);
        assert_eq!(read_json::<Vec<Value>>(&second).unwrap(), vec![json!(2)]);
    }

    #[test]
    fn memory_store_records_saves_in_order() {
        let store = MemoryArtifactStore::new();
        let urls = ArtifactKey::new(ArtifactKind::FilteredUrls, "shop", "/tmp/filtered");
        let batch = ArtifactKey::new(ArtifactKind::UrlsToCollect, "shop", "/tmp/collect");
        store.save(&urls, &[json!({"url": "a"})]).unwrap();
        let path = store.save(&batch, &[]).unwrap();
        store.save(&batch, &[json!({"url": "b"})]).unwrap();

        assert_eq!(store.saved().unwrap().len(), 3);
        let batches = store.saved_of(ArtifactKind::UrlsToCollect).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].payload, vec![json!({"url": "b"})]);
        assert!(path.ends_with("memory_000000_urls_to_collect_shop.json"));
    }
}
