//! First-seen-wins duplicate elimination over a record field.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::data::FieldLookup;
use crate::errors::PipelineError;

/// Keep the first record for each distinct value of `key`, in encounter order.
///
/// Every record must carry `key`; the first one that does not aborts the pass
/// with [`PipelineError::MissingKey`] and no partial output is returned.
pub fn dedup_by_key<R: FieldLookup>(records: Vec<R>, key: &str) -> Result<Vec<R>, PipelineError> {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut kept = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let Some(value) = record.field_text(key) else {
            return Err(PipelineError::MissingKey {
                key: key.to_string(),
                index,
                path: PathBuf::from("<memory>"),
            });
        };
        if seen.insert(value.into_owned()) {
            kept.push(record);
        }
    }
    Ok(kept)
}
