//! Per-item failure ledger of a batch run.

use serde::Serialize;
use std::collections::BTreeMap;

/// Mapping from work item key to the reason it failed.
///
/// Only terminal failures are recorded, so a key present here never belongs
/// to an item that ultimately succeeded. The first reason recorded for a key
/// wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FailureLedger {
    entries: BTreeMap<String, String>,
}

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure. Returns `false` if the key was already present.
    pub fn record(&mut self, key: impl Into<String>, reason: impl Into<String>) -> bool {
        match self.entries.entry(key.into()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(reason.into());
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn reason(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(key, reason)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_lookup() {
        let mut ledger = FailureLedger::new();
        assert!(ledger.is_empty());

        assert!(ledger.record("IMG_2.jpg", "upload failed after 5 attempts"));
        assert!(ledger.record("IMG_1.jpg", "rejected"));

        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains("IMG_2.jpg"));
        assert!(!ledger.contains("IMG_3.jpg"));
        assert_eq!(ledger.reason("IMG_1.jpg"), Some("rejected"));
        assert_eq!(ledger.keys().collect::<Vec<_>>(), vec!["IMG_1.jpg", "IMG_2.jpg"]);
    }

    #[test]
    fn test_first_reason_wins() {
        let mut ledger = FailureLedger::new();
        assert!(ledger.record("photo-1", "first"));
        assert!(!ledger.record("photo-1", "second"));
        assert_eq!(ledger.reason("photo-1"), Some("first"));
        assert_eq!(ledger.len(), 1);
    }
}
