//! The loaded dataset and the handle that publishes replacements.
//!
//! A [`Dataset`] is an immutable snapshot. Loading a new file builds a
//! fresh snapshot and publishes it through a [`DatasetHandle`]; readers
//! holding the previous snapshot keep a valid view of the old rows.

use crate::models::Record;
use chrono::{DateTime, Utc};
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Ordered, immutable sequence of records produced by one load event.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Arc<[Record]>,
    source: String,
    loaded_at: DateTime<Utc>,
}

impl Dataset {
    /// Create a dataset from already parsed records.
    pub fn new(records: Vec<Record>, source: impl Into<String>) -> Self {
        Self {
            records: records.into(),
            source: source.into(),
            loaded_at: Utc::now(),
        }
    }

    /// An empty dataset, used before the first load completes.
    pub fn empty() -> Self {
        Self::new(Vec::new(), "")
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Where the rows came from (file path or upload name).
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Whether two handles point at the same snapshot.
    pub fn same_snapshot(&self, other: &Dataset) -> bool {
        Arc::ptr_eq(&self.records, &other.records)
    }
}

impl Deref for Dataset {
    type Target = [Record];

    fn deref(&self) -> &[Record] {
        &self.records
    }
}

/// Single write-once-per-load slot holding the current dataset.
#[derive(Debug)]
pub struct DatasetHandle {
    tx: watch::Sender<Dataset>,
}

impl Default for DatasetHandle {
    fn default() -> Self {
        Self::new(Dataset::empty())
    }
}

impl DatasetHandle {
    pub fn new(initial: Dataset) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Snapshot of the dataset as of now.
    pub fn current(&self) -> Dataset {
        self.tx.borrow().clone()
    }

    /// Replace the dataset wholesale and return the superseded snapshot.
    pub fn replace(&self, dataset: Dataset) -> Dataset {
        info!(
            "Publishing dataset from '{}' ({} records)",
            dataset.source(),
            dataset.len()
        );
        self.tx.send_replace(dataset)
    }

    /// Receiver that is notified on every replacement.
    pub fn subscribe(&self) -> watch::Receiver<Dataset> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: &str) -> Record {
        Record {
            line_name: line.to_string(),
            ..Record::default()
        }
    }

    #[test]
    fn test_dataset_derefs_to_records() {
        let dataset = Dataset::new(vec![record("A"), record("B")], "test.csv");
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset[1].line_name, "B");
        assert_eq!(dataset.source(), "test.csv");
    }

    #[test]
    fn test_replace_supersedes_without_merge() {
        let handle = DatasetHandle::new(Dataset::new(vec![record("A")], "first.csv"));
        let old = handle.current();

        let previous = handle.replace(Dataset::new(vec![record("B"), record("C")], "second.csv"));

        assert!(previous.same_snapshot(&old));
        assert_eq!(old.len(), 1);
        assert_eq!(old[0].line_name, "A");

        let current = handle.current();
        assert_eq!(current.len(), 2);
        assert_eq!(current.source(), "second.csv");
        assert!(!current.same_snapshot(&old));
    }

    #[tokio::test]
    async fn test_subscriber_sees_replacement() {
        let handle = DatasetHandle::default();
        let mut rx = handle.subscribe();
        assert!(rx.borrow().is_empty());

        handle.replace(Dataset::new(vec![record("A")], "upload.csv"));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
    }
}
