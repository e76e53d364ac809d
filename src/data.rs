use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::fields::{COLLECTED, PRODUCT_NAME, URL};
use crate::errors::PipelineError;

use crate::types::UrlString;

/// Read access to record fields by name, used by dedup and keyword filtering.
pub trait FieldLookup {
    /// Stringified value for `field`, or `None` when the record lacks it.
    fn field_text(&self, field: &str) -> Option<Cow<'_, str>>;
}

/// A discovered candidate URL with its product metadata.
///
/// Only `url` is typed. Every other field, `product_name` included, stays in
/// `extra` exactly as read, so a record serializes back to what was loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// Identity of the record within a filter pass.
    pub url: UrlString,
    /// Remaining fields, in their original order and JSON types.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UrlRecord {
    /// Build a record with only `url` and `product_name`.
    pub fn new(url: impl Into<UrlString>, product_name: impl Into<Value>) -> Self {
        Self::bare(url).with_extra(PRODUCT_NAME, product_name)
    }

    /// Build a record holding nothing but `url`.
    pub fn bare(url: impl Into<UrlString>) -> Self {
        Self {
            url: url.into(),
            extra: Map::new(),
        }
    }

    /// Attach a source-specific field.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Text form of `product_name`, whatever its JSON type.
    pub fn product_name(&self) -> Option<Cow<'_, str>> {
        self.field_text(PRODUCT_NAME)
    }

    /// Convert one element of a URL file, reporting a missing `url` as a malformed record.
    pub fn from_json(value: Value, index: usize, path: &Path) -> Result<Self, PipelineError> {
        let has_url = value.as_object().is_some_and(|obj| obj.contains_key(URL));
        if !has_url {
            return Err(PipelineError::MissingKey {
                key: URL.to_string(),
                index,
                path: path.to_path_buf(),
            });
        }
        serde_json::from_value(value).map_err(|source| PipelineError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl FieldLookup for UrlRecord {
    fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            URL => Some(Cow::Borrowed(self.url.as_str())),
            other => self.extra.get(other).map(value_text),
        }
    }
}

/// Text form of a JSON value: strings unquoted, everything else as compact JSON.
pub fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Collection state of a to-collect URL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectedStatus {
    /// Not yet fetched by the collector.
    #[default]
    No,
    /// Fetched by the collector.
    Yes,
}

impl CollectedStatus {
    /// Wire form (`"no"` / `"yes"`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            CollectedStatus::No => "no",
            CollectedStatus::Yes => "yes",
        }
    }
}

impl fmt::Display for CollectedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CollectedStatus {
    type Err = PipelineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "no" => Ok(CollectedStatus::No),
            "yes" => Ok(CollectedStatus::Yes),
            other => Err(PipelineError::Configuration(format!(
                "unknown collected status '{other}' (expected 'no' or 'yes')"
            ))),
        }
    }
}

/// Minimal unit of work handed to the page collector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectRecord {
    /// URL handed to the collector.
    pub url: UrlString,
    /// Whether the collector already fetched it.
    pub collected: CollectedStatus,
}

impl CollectRecord {
    /// A pending record for `url`.
    pub fn pending(url: impl Into<UrlString>) -> Self {
        Self {
            url: url.into(),
            collected: CollectedStatus::No,
        }
    }
}

impl From<&UrlRecord> for CollectRecord {
    fn from(record: &UrlRecord) -> Self {
        Self::pending(record.url.clone())
    }
}

impl FieldLookup for CollectRecord {
    fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            URL => Some(Cow::Borrowed(self.url.as_str())),
            COLLECTED => Some(Cow::Borrowed(self.collected.as_str())),
            _ => None,
        }
    }
}

/// Opaque collected product or review payload.
pub type ResultRecord = Value;

/// Contiguous, order-preserving slice of the to-collect list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    /// Zero-based emission index.
    pub index: usize,
    /// Offset of the first record in the full list.
    pub start: usize,
    /// Records in input order.
    pub records: Vec<CollectRecord>,
}

impl Batch {
    /// Number of records in the batch.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True for a batch with no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
