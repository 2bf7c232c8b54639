//! Append-only list of submitted transactions

use chrono::{DateTime, Local};

/// A write call accepted by the signer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub hash: String,
    pub confirmed: bool,
    pub submitted_at: DateTime<Local>,
    pub block_number: Option<u64>,
    /// Set when the confirmation wait failed; the entry then stays unconfirmed
    pub failure: Option<String>,
}

/// Transactions submitted from one form, in submission order.
/// Entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct PendingList {
    entries: Vec<PendingTransaction>,
}

impl PendingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly submitted transaction as unconfirmed
    pub fn push_submitted(&mut self, hash: impl Into<String>) {
        self.entries.push(PendingTransaction {
            hash: hash.into(),
            confirmed: false,
            submitted_at: Local::now(),
            block_number: None,
            failure: None,
        });
    }

    /// Flip the entry matching `hash` to confirmed. Returns false when no
    /// entry matches.
    pub fn confirm(&mut self, hash: &str, block_number: Option<u64>) -> bool {
        match self.find_mut(hash) {
            Some(entry) => {
                entry.confirmed = true;
                entry.block_number = block_number;
                true
            }
            None => false,
        }
    }

    /// Note why confirmation failed. The entry stays unconfirmed.
    pub fn mark_failed(&mut self, hash: &str, reason: impl Into<String>) -> bool {
        match self.find_mut(hash) {
            Some(entry) => {
                entry.failure = Some(reason.into());
                true
            }
            None => false,
        }
    }

    pub fn has_unconfirmed(&self) -> bool {
        self.entries.iter().any(|entry| !entry.confirmed)
    }

    pub fn unconfirmed_count(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.confirmed).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingTransaction> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find_mut(&mut self, hash: &str) -> Option<&mut PendingTransaction> {
        self.entries
            .iter_mut()
            .find(|entry| entry.hash.eq_ignore_ascii_case(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_only_touches_matching_hash() {
        let mut list = PendingList::new();
        list.push_submitted("0xaa");
        list.push_submitted("0xbb");
        assert_eq!(list.unconfirmed_count(), 2);

        assert!(list.confirm("0xBB", Some(7)));
        let entries: Vec<_> = list.iter().collect();
        assert!(!entries[0].confirmed);
        assert!(entries[1].confirmed);
        assert_eq!(entries[1].block_number, Some(7));
        assert!(list.has_unconfirmed());
    }

    #[test]
    fn test_unknown_hash_is_ignored() {
        let mut list = PendingList::new();
        list.push_submitted("0xaa");
        assert!(!list.confirm("0xcc", None));
        assert!(!list.mark_failed("0xcc", "boom"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_failed_entry_stays_unconfirmed() {
        let mut list = PendingList::new();
        list.push_submitted("0xaa");
        assert!(list.mark_failed("0xaa", "transaction reverted"));
        let entry = list.iter().next().unwrap();
        assert!(!entry.confirmed);
        assert_eq!(entry.failure.as_deref(), Some("transaction reverted"));
        assert!(list.has_unconfirmed());
    }
}
