//! Fold per-item collected result files into one dated snapshot.
//!
//! Result files come from the page collector and may be truncated or corrupt,
//! so each file is loaded into its own `Result` and bad files are skipped and
//! counted. Products fold one file into one entry; reviews splice each file's
//! array into a single flat list.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::constants::SKIP_MALFORMED_RESULT_MSG;
use crate::constants::artifacts::JSON_EXTENSION;
use crate::data::ResultRecord;
use crate::errors::PipelineError;
use crate::store::timestamp_now;
use crate::transport::fs::{list_json_files, write_new_json_pretty};

/// Which collected results are being folded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultKind {
    /// One JSON object per file.
    Products,
    /// One JSON array of reviews per file.
    Reviews,
}

impl ResultKind {
    /// Folder-style name (`products` / `reviews`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Products => "products",
            ResultKind::Reviews => "reviews",
        }
    }

    /// Input and snapshot folders for this kind.
    pub fn folders<'a>(&self, config: &'a PipelineConfig) -> (&'a Path, &'a Path) {
        let folders = &config.folders;
        match self {
            ResultKind::Products => (
                folders.products.as_path(),
                folders.aggregated_products.as_path(),
            ),
            ResultKind::Reviews => (
                folders.reviews.as_path(),
                folders.aggregated_reviews.as_path(),
            ),
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A result file excluded from the snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedFile {
    /// Skipped result file.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: String,
}

/// Records gathered from a result folder.
#[derive(Clone, Debug, Default)]
pub struct ResultCollection {
    /// Records in file-name order.
    pub records: Vec<ResultRecord>,
    /// Files that parsed.
    pub loaded_files: usize,
    /// Files left out.
    pub skipped: Vec<SkippedFile>,
}

/// Outcome of [`aggregate_results`].
#[derive(Clone, Debug)]
pub struct SnapshotReport {
    /// Which results were folded.
    pub kind: ResultKind,
    /// Records in the snapshot.
    pub records: usize,
    /// Files that parsed.
    pub loaded_files: usize,
    /// Files left out.
    pub skipped: Vec<SkippedFile>,
    /// Snapshot file written.
    pub snapshot: PathBuf,
}

/// Parse one result file.
///
/// Unparseable JSON, and for reviews anything but an array, is reported as
/// [`PipelineError::MalformedResultFile`]; filesystem failures keep their own
/// variant.
pub fn load_result_file(path: &Path, kind: ResultKind) -> Result<Vec<ResultRecord>, PipelineError> {
    let bytes = std::fs::read(path)?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|err| PipelineError::MalformedResultFile {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    match (kind, value) {
        (ResultKind::Products, product) => Ok(vec![product]),
        (ResultKind::Reviews, Value::Array(reviews)) => Ok(reviews),
        (ResultKind::Reviews, other) => Err(PipelineError::MalformedResultFile {
            path: path.to_path_buf(),
            reason: format!("expected a JSON array of reviews, found {}", json_type(&other)),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Load every `*.json` result file in `dir`, skipping malformed ones.
pub fn collect_results(dir: &Path, kind: ResultKind) -> Result<ResultCollection, PipelineError> {
    let mut collection = ResultCollection::default();
    for path in list_json_files(dir)? {
        match load_result_file(&path, kind) {
            Ok(records) => {
                collection.records.extend(records);
                collection.loaded_files += 1;
            }
            Err(err) if err.is_skippable_result() => {
                warn!(path = %path.display(), error = %err, kind = %kind, SKIP_MALFORMED_RESULT_MSG);
                collection.skipped.push(SkippedFile {
                    path,
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }
    Ok(collection)
}

/// `{timestamp}_aggregated_{kind}_{source}.json`, or with a `_{attempt}` suffix
/// before the extension when an earlier snapshot already took the plain name.
pub fn snapshot_file_name(timestamp: &str, kind: ResultKind, source: &str, attempt: u64) -> String {
    if attempt == 0 {
        format!("{timestamp}_aggregated_{kind}_{source}.{JSON_EXTENSION}")
    } else {
        format!("{timestamp}_aggregated_{kind}_{source}_{attempt}.{JSON_EXTENSION}")
    }
}

/// Fold the result folder for `kind` into a snapshot in its aggregated folder.
pub fn aggregate_results(
    config: &PipelineConfig,
    kind: ResultKind,
) -> Result<SnapshotReport, PipelineError> {
    config.validate()?;
    info!(source = %config.source_id(), kind = %kind, "start to aggregate result files");

    let (input_dir, snapshot_dir) = kind.folders(config);
    let collection = collect_results(input_dir, kind)?;
    let timestamp = timestamp_now();
    let mut attempt = 0;
    let snapshot = loop {
        let path =
            snapshot_dir.join(snapshot_file_name(&timestamp, kind, config.source_id(), attempt));
        if write_new_json_pretty(&path, &collection.records)? {
            break path;
        }
        attempt += 1;
    };

    info!(
        source = %config.source_id(),
        kind = %kind,
        count = collection.records.len(),
        loaded = collection.loaded_files,
        skipped = collection.skipped.len(),
        snapshot = %snapshot.display(),
        "result files aggregated"
    );
    Ok(SnapshotReport {
        kind,
        records: collection.records.len(),
        loaded_files: collection.loaded_files,
        skipped: collection.skipped,
        snapshot,
    })
}

/// [`aggregate_results`] for products.
pub fn aggregate_products_files(config: &PipelineConfig) -> Result<SnapshotReport, PipelineError> {
    aggregate_results(config, ResultKind::Products)
}

/// [`aggregate_results`] for reviews.
pub fn aggregate_reviews_files(config: &PipelineConfig) -> Result<SnapshotReport, PipelineError> {
    aggregate_results(config, ResultKind::Reviews)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fs::read_json;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn products_keep_one_entry_per_file() {
        let temp = tempdir().unwrap();
        let dir = temp.path();
        fs::write(dir.join("a.json"), br#"{"name": "A", "tags": ["x"]}"#).unwrap();
        fs::write(dir.join("b.json"), br#"[{"name": "B"}]"#).unwrap();
        let collection = collect_results(dir, ResultKind::Products).unwrap();
        assert_eq!(
            collection.records,
            vec![json!({"name": "A", "tags": ["x"]}), json!([{"name": "B"}])]
        );
        assert_eq!(collection.loaded_files, 2);
    }

    #[test]
    fn reviews_are_flattened_across_files() {
        let temp = tempdir().unwrap();
        let dir = temp.path();
        fs::write(dir.join("a.json"), br#"[{"r": 1}, {"r": 2}]"#).unwrap();
        fs::write(dir.join("b.json"), br#"[]"#).unwrap();
        fs::write(dir.join("c.json"), br#"[{"r": 3}]"#).unwrap();
        let collection = collect_results(dir, ResultKind::Reviews).unwrap();
        assert_eq!(
            collection.records,
            vec![json!({"r": 1}), json!({"r": 2}), json!({"r": 3})]
        );
    }

    #[test]
    fn malformed_files_are_skipped_and_counted() {
        let temp = tempdir().unwrap();
        let dir = temp.path();
        fs::write(dir.join("a.json"), br#"[{"r": 1}]"#).unwrap();
        fs::write(dir.join("b.json"), br#"[{"r": "#).unwrap();
        fs::write(dir.join("c.json"), br#"{"not": "an array"}"#).unwrap();
        fs::write(dir.join("d.json"), b"").unwrap();
        let collection = collect_results(dir, ResultKind::Reviews).unwrap();
        assert_eq!(collection.records, vec![json!({"r": 1})]);
        assert_eq!(collection.loaded_files, 1);
        let skipped: Vec<String> = collection
            .skipped
            .iter()
            .map(|file| file.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(skipped, vec!["b.json", "c.json", "d.json"]);
        assert!(collection.skipped[1].reason.contains("an object"));
    }

    #[test]
    fn snapshot_names_follow_kind_and_source() {
        assert_eq!(
            snapshot_file_name("2025_01_02_03_04_05", ResultKind::Reviews, "shop", 0),
            "2025_01_02_03_04_05_aggregated_reviews_shop.json"
        );
        assert_eq!(
            snapshot_file_name("2025_01_02_03_04_05", ResultKind::Reviews, "shop", 2),
            "2025_01_02_03_04_05_aggregated_reviews_shop_2.json"
        );
    }

    #[test]
    fn aggregate_writes_snapshot_into_kind_folder() {
        let temp = tempdir().unwrap();
        let config = PipelineConfig::under(temp.path(), "shop");
        fs::create_dir_all(&config.folders.products).unwrap();
        fs::write(config.folders.products.join("p1.json"), r#"{"name": "Thé vert"}"#).unwrap();
        fs::write(config.folders.products.join("p2.json"), b"{oops").unwrap();

        let report = aggregate_products_files(&config).unwrap();
        assert_eq!(report.records, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(
            report.snapshot.parent().unwrap(),
            config.folders.aggregated_products.as_path()
        );
        let name = report.snapshot.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("_aggregated_products_shop.json"));

        let text = fs::read_to_string(&report.snapshot).unwrap();
        assert!(text.contains("Thé vert"));
        assert!(text.contains("\n        \"name\""));
    }

    #[test]
    fn repeated_snapshots_keep_distinct_files() {
        let temp = tempdir().unwrap();
        let config = PipelineConfig::under(temp.path(), "shop");
        fs::create_dir_all(&config.folders.reviews).unwrap();
        fs::write(config.folders.reviews.join("r.json"), br#"[{"r": 1}]"#).unwrap();

        let first = aggregate_reviews_files(&config).unwrap();
        fs::write(config.folders.reviews.join("s.json"), br#"[{"r": 2}]"#).unwrap();
        let second = aggregate_reviews_files(&config).unwrap();
        assert_ne!(first.snapshot, second.snapshot);
        assert_eq!(read_json::<Vec<Value>>(&first.snapshot).unwrap().len(), 1);
        assert_eq!(read_json::<Vec<Value>>(&second.snapshot).unwrap().len(), 2);
    }

    #[test]
    fn missing_result_folder_yields_empty_snapshot() {
        let temp = tempdir().unwrap();
        let config = PipelineConfig::under(temp.path(), "shop");
        let report = aggregate_products_files(&config).unwrap();
        assert_eq!(report.records, 0);
        assert_eq!(report.loaded_files, 0);
        assert!(read_json::<Vec<Value>>(&report.snapshot).unwrap().is_empty());
    }
}
