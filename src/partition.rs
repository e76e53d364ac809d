//! Split filtered URLs into fixed-stride collection batches.
//!
//! Batch `i` covers `[i * stride, (i + 1) * stride)` where
//! `stride = total / n_parts`; the last batch runs to the end of the list and
//! so absorbs the remainder. When `n_parts > total` the stride would be zero,
//! so every record gets its own batch instead and fewer than `n_parts` batches
//! are produced. Each batch is saved twice: once as the primary
//! `urls_to_collect` copy the collector mutates and once as the
//! `urls_to_collect_anchor` copy that records the original partitioning.
//! Store-side sequence numbers keep artifact names distinct and ordered.

use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::aggregate::read_url_file;
use crate::config::{PartitionConfig, PipelineConfig};
use crate::data::{Batch, CollectRecord, UrlRecord};
use crate::errors::PipelineError;
use crate::store::{ArtifactKey, ArtifactKind, ArtifactStore, to_payload};
use crate::transport::fs::most_recent_json_file;

/// Where one batch was persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedBatch {
    /// Zero-based batch index.
    pub index: usize,
    /// Records in the batch.
    pub len: usize,
    /// Primary `urls_to_collect` file.
    pub primary: PathBuf,
    /// Anchor copy.
    pub anchor: PathBuf,
}

/// Outcome of [`generate_urls_to_collect`].
#[derive(Clone, Debug)]
pub struct PartitionReport {
    /// Filtered-URLs file the batches were derived from.
    pub input: PathBuf,
    /// Records read from the input.
    pub total: usize,
    /// `n_parts` as requested.
    pub requested_parts: usize,
    /// Saved batches in emission order.
    pub batches: Vec<SavedBatch>,
}

/// Pending to-collect records for each filtered URL, in input order.
pub fn to_collect_records(records: &[UrlRecord]) -> Vec<CollectRecord> {
    records.iter().map(CollectRecord::from).collect()
}

/// Index ranges of each batch over a list of `total` records.
pub fn partition_bounds(total: usize, n_parts: usize) -> Result<Vec<Range<usize>>, PipelineError> {
    PartitionConfig { n_parts }.validate()?;
    if total == 0 {
        return Ok(Vec::new());
    }
    let parts = n_parts.min(total);
    let stride = total / parts;
    Ok((0..parts)
        .map(|index| {
            let start = index * stride;
            let end = if index + 1 == parts { total } else { start + stride };
            start..end
        })
        .collect())
}

/// Split `records` into order-preserving, disjoint batches covering the input.
pub fn partition(records: Vec<CollectRecord>, n_parts: usize) -> Result<Vec<Batch>, PipelineError> {
    let bounds = partition_bounds(records.len(), n_parts)?;
    let mut remaining = records.into_iter();
    Ok(bounds
        .into_iter()
        .enumerate()
        .map(|(index, range)| Batch {
            index,
            start: range.start,
            records: remaining.by_ref().take(range.len()).collect(),
        })
        .collect())
}

/// Explicit file name inside the filtered folder, else its most recent file.
pub fn resolve_filtered_urls_file(
    filtered_urls_dir: &Path,
    file_name: Option<&str>,
) -> Result<PathBuf, PipelineError> {
    match file_name {
        Some(name) if !name.trim().is_empty() => Ok(filtered_urls_dir.join(name)),
        _ => most_recent_json_file(filtered_urls_dir),
    }
}

/// Partition one filtered-URLs file and save every batch to both batch folders.
pub fn generate_urls_to_collect(
    config: &PipelineConfig,
    filtered_urls_file: &Path,
    partition_config: PartitionConfig,
    store: &dyn ArtifactStore,
) -> Result<PartitionReport, PipelineError> {
    config.validate()?;
    partition_config.validate()?;
    if filtered_urls_file.as_os_str().is_empty() {
        return Err(PipelineError::Configuration(
            "filtered urls file path must not be empty".to_string(),
        ));
    }

    info!(path = %filtered_urls_file.display(), "filtered urls file selected");
    let filtered = read_url_file(filtered_urls_file)?;
    info!(count = filtered.len(), "filtered urls loaded");

    let total = filtered.len();
    let n_parts = partition_config.n_parts;
    if total == 0 {
        warn!(path = %filtered_urls_file.display(), "no urls to partition");
    } else if n_parts > total {
        warn!(
            requested = n_parts,
            produced = total,
            "more parts requested than urls, emitting one url per batch"
        );
    }

    let primary_key = ArtifactKey::new(
        ArtifactKind::UrlsToCollect,
        config.source_id().clone(),
        &config.folders.urls_to_collect,
    );
    let anchor_key = ArtifactKey::new(
        ArtifactKind::UrlsToCollectAnchor,
        config.source_id().clone(),
        &config.folders.urls_to_collect_anchor,
    );

    let mut saved = Vec::new();
    for batch in partition(to_collect_records(&filtered), n_parts)? {
        let payload = to_payload(&batch.records)?;
        let primary = store.save(&primary_key, &payload)?;
        let anchor = store.save(&anchor_key, &payload)?;
        info!(
            batch = batch.index,
            count = batch.len(),
            primary = %primary.display(),
            anchor = %anchor.display(),
            "urls to collect batch saved"
        );
        saved.push(SavedBatch {
            index: batch.index,
            len: batch.len(),
            primary,
            anchor,
        });
    }

    info!(
        source = %config.source_id(),
        batches = saved.len(),
        count = total,
        "urls to collect generated"
    );
    Ok(PartitionReport {
        input: filtered_urls_file.to_path_buf(),
        total,
        requested_parts: n_parts,
        batches: saved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(count: usize) -> Vec<CollectRecord> {
        (0..count)
            .map(|i| CollectRecord::pending(format!("https://s/p/{i}")))
            .collect()
    }

    fn sizes(batches: &[Batch]) -> Vec<usize> {
        batches.iter().map(Batch::len).collect()
    }

    #[test]
    fn remainder_folds_into_last_batch() {
        let batches = partition(pending(10), 3).unwrap();
        assert_eq!(sizes(&batches), vec![3, 3, 4]);
        assert_eq!(
            batches.iter().map(|b| b.start).collect::<Vec<_>>(),
            vec![0, 3, 6]
        );
    }

    #[test]
    fn single_part_is_the_whole_list() {
        let batches = partition(pending(7), 1).unwrap();
        assert_eq!(sizes(&batches), vec![7]);
    }

    #[test]
    fn one_record_per_batch_when_parts_exceed_records() {
        let batches = partition(pending(3), 8).unwrap();
        assert_eq!(sizes(&batches), vec![1, 1, 1]);
    }

    #[test]
    fn empty_input_yields_no_batches() {
        assert!(partition(Vec::new(), 4).unwrap().is_empty());
    }

    #[test]
    fn zero_parts_is_rejected() {
        assert!(matches!(
            partition(pending(3), 0),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn concatenated_batches_reconstruct_the_input_for_every_valid_part_count() {
        for total in 1..=25 {
            let records = pending(total);
            for n_parts in 1..=total {
                let batches = partition(records.clone(), n_parts).unwrap();
                assert_eq!(batches.len(), n_parts);
                let rebuilt: Vec<CollectRecord> =
                    batches.into_iter().flat_map(|batch| batch.records).collect();
                assert_eq!(rebuilt, records, "total={total} n_parts={n_parts}");
            }
        }
    }

    #[test]
    fn only_the_last_batch_may_differ_in_size() {
        let batches = partition(pending(23), 5).unwrap();
        let (last, rest) = batches.split_last().unwrap();
        assert!(rest.iter().all(|batch| batch.len() == 4));
        assert_eq!(last.len(), 7);
    }

    #[test]
    fn to_collect_records_start_pending() {
        let records = to_collect_records(&[UrlRecord::new("a", "x").with_extra("brand", "b")]);
        assert_eq!(records, vec![CollectRecord::pending("a")]);
    }

    #[test]
    fn explicit_file_name_is_joined_to_folder() {
        let path = resolve_filtered_urls_file(Path::new("/data/filtered_urls"), Some("f.json"))
            .unwrap();
        assert_eq!(path, PathBuf::from("/data/filtered_urls/f.json"));
    }
}
