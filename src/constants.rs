/// Canonical record field names.
pub mod fields {
    /// Identity key of a URL record.
    pub const URL: &str = "url";
    /// Product display name carried by discovered URL records.
    pub const PRODUCT_NAME: &str = "product_name";
    /// Work-status key of a to-collect record.
    pub const COLLECTED: &str = "collected";
    /// Fields inspected by the exclude and select keyword passes.
    pub const KEYWORD_FILTER_FIELDS: [&str; 2] = [PRODUCT_NAME, URL];
}

/// Constants used by artifact naming and file layout.
pub mod artifacts {
    /// Extension of every JSON artifact and input file.
    pub const JSON_EXTENSION: &str = "json";
    /// `chrono` format used for timestamp prefixes in file names.
    pub const TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";
    /// Zero-padded width of the per-store sequence number in artifact names.
    pub const SEQUENCE_WIDTH: usize = 6;
    /// Indentation used when pretty-printing artifacts.
    pub const JSON_INDENT: &[u8] = b"    ";
}

/// Conventional folder names under a data root.
pub mod folders {
    /// Per-run URL discovery drops.
    pub const NEW_URLS: &str = "new_urls";
    /// Aggregated URL artifacts.
    pub const AGGREGATED_URLS: &str = "aggregated_urls";
    /// Filtered URL artifacts.
    pub const FILTERED_URLS: &str = "filtered_urls";
    /// Primary batches the collector updates.
    pub const URLS_TO_COLLECT: &str = "urls_to_collect";
    /// Untouched copies of each batch.
    pub const URLS_TO_COLLECT_ANCHOR: &str = "urls_to_collect_anchor";
    /// Collected product files.
    pub const PRODUCTS: &str = "products";
    /// Collected review files.
    pub const REVIEWS: &str = "reviews";
    /// Product snapshots.
    pub const AGGREGATED_PRODUCTS: &str = "aggregated_products";
    /// Review snapshots.
    pub const AGGREGATED_REVIEWS: &str = "aggregated_reviews";
}

/// Constants used by the command-line entry point.
pub mod cli {
    /// Environment variable consulted when `--data-root` is not given.
    pub const DATA_ROOT_ENV: &str = "CRAWL_BATCHES_DATA_ROOT";
    /// Fallback data root relative to the working directory.
    pub const DEFAULT_DATA_ROOT: &str = "data";
}

/// Log message used when a result file is skipped.
pub const SKIP_MALFORMED_RESULT_MSG: &str = "skipping malformed result file";

/// Log message used when an input folder does not exist.
pub const MISSING_INPUT_DIR_MSG: &str = "input folder missing, treating as empty";
