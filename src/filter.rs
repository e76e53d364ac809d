//! The canonical "new URLs -> filtered URLs" transform.

use std::path::PathBuf;

use tracing::info;

use crate::aggregate::load_url_records;
use crate::config::{FilterConfig, PipelineConfig};
use crate::constants::fields::{KEYWORD_FILTER_FIELDS, URL};
use crate::data::UrlRecord;
use crate::dedup::dedup_by_key;
use crate::errors::PipelineError;
use crate::keywords::{KeywordMatcher, KeywordPolicy};
use crate::store::{ArtifactKey, ArtifactKind, ArtifactStore, to_payload};

/// Record counts after each filter stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Records loaded from the discovery folder.
    pub loaded: usize,
    /// Records left after the first dedup.
    pub after_dedup: usize,
    /// `None` when no exclude keywords were configured.
    pub after_exclude: Option<usize>,
    /// `None` when no select keywords were configured.
    pub after_select: Option<usize>,
    /// Records in the saved artifact.
    pub filtered: usize,
}

/// Outcome of [`filter_new_urls`].
#[derive(Clone, Debug)]
pub struct FilterReport {
    /// Number of discovery files read.
    pub files_read: usize,
    /// Per-stage counts.
    pub stats: FilterStats,
    /// Where the artifact landed.
    pub artifact: PathBuf,
}

/// Dedup by `url`, exclude, select, then dedup again.
///
/// Keyword passes with an empty list are skipped, not run. The result never
/// holds two records with the same `url`.
pub fn filter_url_records(
    records: Vec<UrlRecord>,
    filter: &FilterConfig,
) -> Result<(Vec<UrlRecord>, FilterStats), PipelineError> {
    let mut stats = FilterStats {
        loaded: records.len(),
        ..FilterStats::default()
    };

    let mut records = dedup_by_key(records, URL)?;
    stats.after_dedup = records.len();

    if !filter.exclude_keywords.is_empty() {
        records = KeywordMatcher::new(&filter.exclude_keywords).apply(
            records,
            &KEYWORD_FILTER_FIELDS,
            KeywordPolicy::Exclude,
        );
        stats.after_exclude = Some(records.len());
    }

    if !filter.select_keywords.is_empty() {
        records = KeywordMatcher::new(&filter.select_keywords).apply(
            records,
            &KEYWORD_FILTER_FIELDS,
            KeywordPolicy::Select,
        );
        stats.after_select = Some(records.len());
    }

    let records = dedup_by_key(records, URL)?;
    stats.filtered = records.len();
    Ok((records, stats))
}

/// Load the discovery folder, filter it, and save a `filtered_urls` artifact.
pub fn filter_new_urls(
    config: &PipelineConfig,
    filter: &FilterConfig,
    store: &dyn ArtifactStore,
) -> Result<FilterReport, PipelineError> {
    config.validate()?;
    info!(source = %config.source_id(), "start to filter new urls");

    let loaded = load_url_records(&config.folders.new_urls)?;
    let files_read = loaded.files.len();
    let (filtered, stats) = filter_url_records(loaded.records, filter)?;

    let key = ArtifactKey::new(
        ArtifactKind::FilteredUrls,
        config.source_id().clone(),
        &config.folders.filtered_urls,
    );
    let artifact = store.save(&key, &to_payload(&filtered)?)?;

    info!(
        source = %config.source_id(),
        loaded = stats.loaded,
        after_dedup = stats.after_dedup,
        after_exclude = ?stats.after_exclude,
        after_select = ?stats.after_select,
        count = stats.filtered,
        artifact = %artifact.display(),
        "filtered urls saved"
    );
    Ok(FilterReport {
        files_read,
        stats,
        artifact,
    })
}
