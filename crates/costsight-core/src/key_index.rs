//! Slot assignment for free-form group keys
//!
//! Group keys come back from the billing API as human-readable strings
//! ("AWS VPN (10 connected devices)", account names, tag values) that are
//! neither enumerable up front nor stable between queries. The index is
//! therefore built from the data itself: one left-to-right scan over the
//! periods and their groups, handing out zero-based slots in first-seen
//! order.

use crate::types::RawPeriodRecord;
use indexmap::IndexSet;

/// Ordered mapping from group key to slot
///
/// # Examples
/// ```
/// use costsight_core::key_index::KeyIndex;
/// use costsight_core::types::{DailyDate, RawGroup, RawPeriodRecord};
///
/// let day = DailyDate::parse("2021-01-01").unwrap();
/// let periods = vec![
///     RawPeriodRecord::new(day)
///         .with_group(RawGroup::new("S3", "UnblendedCost", "1"))
///         .with_group(RawGroup::new("EC2", "UnblendedCost", "2")),
///     RawPeriodRecord::new(day).with_group(RawGroup::new("S3", "UnblendedCost", "3")),
/// ];
///
/// let index = KeyIndex::build(&periods);
/// assert_eq!(index.len(), 2);
/// assert_eq!(index.slot("S3"), Some(0));
/// assert_eq!(index.slot("EC2"), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    keys: IndexSet<String>,
}

impl KeyIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan all periods, then all groups within each period
    ///
    /// Groups without any key are skipped.
    pub fn build(periods: &[RawPeriodRecord]) -> Self {
        let mut index = Self::new();
        for period in periods {
            for group in &period.groups {
                if let Some(key) = group.key() {
                    index.insert(key);
                }
            }
        }
        index
    }

    /// Return the slot for `key`, assigning the next free one if unseen
    pub fn insert(&mut self, key: &str) -> usize {
        match self.keys.get_index_of(key) {
            Some(slot) => slot,
            None => self.keys.insert_full(key.to_string()).0,
        }
    }

    /// Slot previously assigned to `key`
    pub fn slot(&self, key: &str) -> Option<usize> {
        self.keys.get_index_of(key)
    }

    /// Key held by `slot`
    pub fn key(&self, slot: usize) -> Option<&str> {
        self.keys.get_index(slot).map(String::as_str)
    }

    /// Number of distinct keys seen
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in slot order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

// Two indexes are equal only if they assign the same slots
impl PartialEq for KeyIndex {
    fn eq(&self, other: &Self) -> bool {
        self.keys.iter().eq(other.keys.iter())
    }
}

impl Eq for KeyIndex {}
