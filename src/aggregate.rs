//! Merge per-run URL discovery files into one aggregated artifact.

use serde_json::Value;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::data::UrlRecord;
use crate::errors::PipelineError;
use crate::store::{ArtifactKey, ArtifactKind, ArtifactStore, to_payload};
use crate::transport::fs::{list_json_files, read_json};

/// URL records read from a discovery folder.
#[derive(Clone, Debug, Default)]
pub struct LoadedUrls {
    /// Files read, in read order.
    pub files: Vec<PathBuf>,
    /// Records flattened in file order, then in-file order.
    pub records: Vec<UrlRecord>,
}

/// Outcome of [`aggregate_new_urls`].
#[derive(Clone, Debug)]
pub struct AggregationReport {
    /// Number of discovery files read.
    pub files_read: usize,
    /// Records saved, duplicates included.
    pub aggregated: usize,
    /// Where the artifact landed.
    pub artifact: PathBuf,
}

/// Read every URL record from one discovery file.
///
/// The file must hold a JSON array; any parse failure or record without `url`
/// is returned as an error.
pub fn read_url_file(path: &Path) -> Result<Vec<UrlRecord>, PipelineError> {
    let values: Vec<Value> = read_json(path)?;
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| UrlRecord::from_json(value, index, path))
        .collect()
}

/// Load and flatten all `*.json` URL files in `dir`, in file-name order.
///
/// URL files are produced by this pipeline, so the first bad file aborts the load.
pub fn load_url_records(dir: &Path) -> Result<LoadedUrls, PipelineError> {
    let mut loaded = LoadedUrls::default();
    for path in list_json_files(dir)? {
        let records = read_url_file(&path)?;
        debug!(path = %path.display(), count = records.len(), "loaded url file");
        loaded.records.extend(records);
        loaded.files.push(path);
    }
    Ok(loaded)
}

/// Save every discovered URL, duplicates included, as an `aggregated_urls` artifact.
pub fn aggregate_new_urls(
    config: &PipelineConfig,
    store: &dyn ArtifactStore,
) -> Result<AggregationReport, PipelineError> {
    config.validate()?;
    info!(source = %config.source_id(), "start to aggregate new urls");

    let loaded = load_url_records(&config.folders.new_urls)?;
    let key = ArtifactKey::new(
        ArtifactKind::AggregatedUrls,
        config.source_id().clone(),
        &config.folders.aggregated_urls,
    );
    let artifact = store.save(&key, &to_payload(&loaded.records)?)?;

    info!(
        source = %config.source_id(),
        files = loaded.files.len(),
        count = loaded.records.len(),
        artifact = %artifact.display(),
        "aggregated urls saved"
    );
    Ok(AggregationReport {
        files_read: loaded.files.len(),
        aggregated: loaded.records.len(),
        artifact,
    })
}
