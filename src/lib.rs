#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// URL aggregation over discovery folders.
pub mod aggregate;
/// Command-line entry point shared by the binary.
pub mod cli;
/// Pipeline configuration types.
pub mod config;
/// Centralized constants for field names, folders, and artifact naming.
pub mod constants;
/// URL, to-collect, and batch record types.
pub mod data;
/// Key-based duplicate elimination.
pub mod dedup;
/// Dedup + keyword filter pipeline.
pub mod filter;
/// Keyword exclude/select filtering.
pub mod keywords;
/// Collection progress helpers.
pub mod metrics;
/// Partitioning into urls-to-collect batches.
pub mod partition;
/// Product and review snapshot aggregation.
pub mod results;
/// Artifact persistence backends.
pub mod store;
/// Input transports (filesystem today).
pub mod transport;
/// Shared type aliases.
pub mod types;

mod errors;

pub use aggregate::{AggregationReport, LoadedUrls, aggregate_new_urls, load_url_records};
pub use config::{FilterConfig, FolderLayout, PartitionConfig, PipelineConfig, SourceDescriptor};
pub use data::{Batch, CollectRecord, CollectedStatus, FieldLookup, ResultRecord, UrlRecord};
pub use dedup::dedup_by_key;
pub use errors::PipelineError;
pub use filter::{FilterReport, FilterStats, filter_new_urls, filter_url_records};
pub use keywords::{KeywordMatcher, KeywordPolicy, exclude_with_keywords, select_with_keywords};
pub use metrics::{CollectProgress, collect_progress, evaluate_collect_progression};
pub use partition::{
    PartitionReport, SavedBatch, generate_urls_to_collect, partition, partition_bounds,
    to_collect_records,
};
pub use results::{
    ResultKind, SnapshotReport, aggregate_products_files, aggregate_results,
    aggregate_reviews_files, collect_results,
};
pub use store::{ArtifactKey, ArtifactKind, ArtifactStore, FileArtifactStore, MemoryArtifactStore};
pub use types::{FieldName, Keyword, SourceId, UrlString};
