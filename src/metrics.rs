use std::path::Path;

use tracing::info;

use crate::data::{CollectRecord, CollectedStatus};
use crate::errors::PipelineError;
use crate::transport::fs::read_json;

/// Collection progress over one urls-to-collect batch.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectProgress {
    /// Records in the batch.
    pub total: usize,
    /// Records marked `"yes"`.
    pub collected: usize,
    /// Records still marked `"no"`.
    pub pending: usize,
    /// `collected / total`, or 0 for an empty batch.
    pub collected_share: f64,
}

/// Count collected and pending records.
pub fn collect_progress(records: &[CollectRecord]) -> CollectProgress {
    let total = records.len();
    let collected = records
        .iter()
        .filter(|record| record.collected == CollectedStatus::Yes)
        .count();
    let collected_share = if total == 0 {
        0.0
    } else {
        collected as f64 / total as f64
    };
    CollectProgress {
        total,
        collected,
        pending: total - collected,
        collected_share,
    }
}

/// Records whose `collected` status equals `status`, in order.
pub fn select_by_status(records: &[CollectRecord], status: CollectedStatus) -> Vec<CollectRecord> {
    records
        .iter()
        .filter(|record| record.collected == status)
        .cloned()
        .collect()
}

/// Load a urls-to-collect batch file and report how far collection got.
pub fn evaluate_collect_progression(path: &Path) -> Result<CollectProgress, PipelineError> {
    let records: Vec<CollectRecord> = read_json(path)?;
    let progress = collect_progress(&records);
    info!(
        path = %path.display(),
        total = progress.total,
        collected = progress.collected,
        pending = progress.pending,
        share = progress.collected_share,
        "collect progression evaluated"
    );
    Ok(progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn batch() -> Vec<CollectRecord> {
        vec![
            CollectRecord {
                url: "a".into(),
                collected: CollectedStatus::Yes,
            },
            CollectRecord::pending("b"),
            CollectRecord::pending("c"),
            CollectRecord {
                url: "d".into(),
                collected: CollectedStatus::Yes,
            },
        ]
    }

    #[test]
    fn progress_reports_counts_and_share() {
        let progress = collect_progress(&batch());
        assert_eq!(progress.total, 4);
        assert_eq!(progress.collected, 2);
        assert_eq!(progress.pending, 2);
        assert!((progress.collected_share - 0.5).abs() < 1e-9);
    }

    #[test]
    fn empty_batch_has_zero_share() {
        let progress = collect_progress(&[]);
        assert_eq!(progress.total, 0);
        assert_eq!(progress.collected_share, 0.0);
    }

    #[test]
    fn select_by_status_preserves_order() {
        let pending = select_by_status(&batch(), CollectedStatus::No);
        let urls: Vec<&str> = pending.iter().map(|record| record.url.as_str()).collect();
        assert_eq!(urls, vec!["b", "c"]);
    }

    #[test]
    fn evaluates_a_batch_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("batch.json");
        fs::write(
            &path,
            br#"[{"url": "a", "collected": "yes"}, {"url": "b", "collected": "no"}]"#,
        )
        .unwrap();
        let progress = evaluate_collect_progression(&path).unwrap();
        assert_eq!(progress.collected, 1);
        assert_eq!(progress.pending, 1);
    }

    #[test]
    fn unknown_status_fails_to_load() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("batch.json");
        fs::write(&path, br#"[{"url": "a", "collected": "maybe"}]"#).unwrap();
        assert!(matches!(
            evaluate_collect_progression(&path),
            Err(PipelineError::Json { .. })
        ));
    }
}
