use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::folders;
use crate::errors::PipelineError;
use crate::transport::fs::read_json;
use crate::types::{Keyword, SourceId};

/// Identifies the data source that namespaces every persisted artifact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Source name embedded in artifact and snapshot file names.
    pub source: SourceId,
}

impl SourceDescriptor {
    /// Descriptor for `source`; call [`SourceDescriptor::validate`] before use.
    pub fn new(source: impl Into<SourceId>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Load a descriptor from a JSON object such as `{"source": "shop"}`.
    ///
    /// Unknown keys are ignored so a fuller source configuration file can be reused.
    pub fn from_json_file(path: &Path) -> Result<Self, PipelineError> {
        read_json(path)
    }

    /// Reject names that would produce empty or path-escaping file names.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let name = self.source.trim();
        if name.is_empty() {
            return Err(PipelineError::Configuration(
                "source name must not be empty".to_string(),
            ));
        }
        if name.contains(['/', '\\']) {
            return Err(PipelineError::Configuration(format!(
                "source name '{name}' must not contain path separators"
            )));
        }
        Ok(())
    }
}

/// Input and output folders used by the pipeline stages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderLayout {
    /// Per-run URL discovery files.
    pub new_urls: PathBuf,
    /// Every discovered URL, one artifact per aggregation run.
    pub aggregated_urls: PathBuf,
    /// Deduplicated, keyword-filtered URLs.
    pub filtered_urls: PathBuf,
    /// Primary work batches, mutated by the collector.
    pub urls_to_collect: PathBuf,
    /// Immutable copies of the original partitioning.
    pub urls_to_collect_anchor: PathBuf,
    /// Collected product files, one JSON object each.
    pub products: PathBuf,
    /// Collected review files, one JSON array each.
    pub reviews: PathBuf,
    /// Dated product snapshots.
    pub aggregated_products: PathBuf,
    /// Dated review snapshots.
    pub aggregated_reviews: PathBuf,
}

impl FolderLayout {
    /// Conventional layout with one folder per artifact kind under `root`.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            new_urls: root.join(folders::NEW_URLS),
            aggregated_urls: root.join(folders::AGGREGATED_URLS),
            filtered_urls: root.join(folders::FILTERED_URLS),
            urls_to_collect: root.join(folders::URLS_TO_COLLECT),
            urls_to_collect_anchor: root.join(folders::URLS_TO_COLLECT_ANCHOR),
            products: root.join(folders::PRODUCTS),
            reviews: root.join(folders::REVIEWS),
            aggregated_products: root.join(folders::AGGREGATED_PRODUCTS),
            aggregated_reviews: root.join(folders::AGGREGATED_REVIEWS),
        }
    }

    fn entries(&self) -> [(&'static str, &Path); 9] {
        [
            (folders::NEW_URLS, &self.new_urls),
            (folders::AGGREGATED_URLS, &self.aggregated_urls),
            (folders::FILTERED_URLS, &self.filtered_urls),
            (folders::URLS_TO_COLLECT, &self.urls_to_collect),
            (folders::URLS_TO_COLLECT_ANCHOR, &self.urls_to_collect_anchor),
            (folders::PRODUCTS, &self.products),
            (folders::REVIEWS, &self.reviews),
            (folders::AGGREGATED_PRODUCTS, &self.aggregated_products),
            (folders::AGGREGATED_REVIEWS, &self.aggregated_reviews),
        ]
    }

    /// Reject layouts with an empty folder path.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for (name, path) in self.entries() {
            if path.as_os_str().is_empty() {
                return Err(PipelineError::Configuration(format!(
                    "folder path for '{name}' must not be empty"
                )));
            }
        }
        Ok(())
    }
}

/// Keyword lists for the filter pipeline. Empty lists disable their pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterConfig {
    /// Records matching any of these are removed.
    pub exclude_keywords: Vec<Keyword>,
    /// When non-empty, only records matching one of these are kept.
    pub select_keywords: Vec<Keyword>,
}

/// Partitioning settings for urls-to-collect generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartitionConfig {
    /// Requested number of batches (at least 1).
    pub n_parts: usize,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self { n_parts: 1 }
    }
}

impl PartitionConfig {
    /// Reject `n_parts == 0`.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.n_parts == 0 {
            return Err(PipelineError::Configuration(
                "n_parts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything a pipeline entry point needs; passed explicitly to each call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Source namespacing every artifact.
    pub source: SourceDescriptor,
    /// Folders read and written by the stages.
    pub folders: FolderLayout,
}

impl PipelineConfig {
    /// Pair a source with a folder layout.
    pub fn new(source: SourceDescriptor, folders: FolderLayout) -> Self {
        Self { source, folders }
    }

    /// Conventional layout under `root` for `source`.
    pub fn under(root: impl AsRef<Path>, source: impl Into<SourceId>) -> Self {
        Self::new(SourceDescriptor::new(source), FolderLayout::under(root))
    }

    /// Source name used in artifact file names.
    pub fn source_id(&self) -> &SourceId {
        &self.source.source
    }

    /// Validate the source and every folder.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.source.validate()?;
        self.folders.validate()
    }
}
