//! # Index Entries
//!
//! [`FriendIndex`] maps normalized names to the scroll count and screen row
//! at which each name was first seen. It preserves discovery order, which is
//! also top-to-bottom list order, and that order is significant: resolution
//! picks the first match in it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One discovered list entry and how to get back to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Normalized name; also the entry's key in the index.
    pub name: String,
    /// Scroll-down pulses from the top of the list that revealed this entry.
    #[serde(rename = "scrolls")]
    pub scroll_count: u32,
    /// Absolute screen row of the entry, valid at `scroll_count` pulses.
    #[serde(rename = "y")]
    pub row_y: i32,
    /// File name of the latest map capture taken for this entry.
    #[serde(rename = "last_screenshot", default)]
    pub last_capture_ref: Option<String>,
    /// Unix time in seconds of that capture.
    #[serde(rename = "last_screenshot_at", default)]
    pub last_capture_at: Option<f64>,
}

impl IndexEntry {
    pub fn new(name: impl Into<String>, scroll_count: u32, row_y: i32) -> Self {
        Self {
            name: name.into(),
            scroll_count,
            row_y,
            last_capture_ref: None,
            last_capture_at: None,
        }
    }
}

/// Capture provenance carried across a rebuild, keyed by exact name.
pub type CaptureMetadata = HashMap<String, (Option<String>, Option<f64>)>;

/// Insertion-ordered map from normalized name to [`IndexEntry`].
///
/// ```rust
/// use friendscan::index::{FriendIndex, IndexEntry};
///
/// let mut index = FriendIndex::new();
/// assert!(index.insert(IndexEntry::new("jane doe", 0, 140)));
/// assert!(index.insert(IndexEntry::new("bob", 1, 180)));
/// assert!(!index.insert(IndexEntry::new("jane doe", 3, 90)));
///
/// let keys: Vec<&str> = index.keys().collect();
/// assert_eq!(keys, vec!["jane doe", "bob"]);
/// assert_eq!(index.get("jane doe").unwrap().scroll_count, 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FriendIndex {
    entries: Vec<IndexEntry>,
    positions: HashMap<String, usize>,
    last_sync: Option<DateTime<Utc>>,
}

impl FriendIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.positions.get(name).map(|&i| &self.entries[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut IndexEntry> {
        self.positions.get(name).map(|&i| &mut self.entries[i])
    }

    /// Append `entry` unless its name is already present.
    ///
    /// Returns `true` when the entry was added. An existing entry is never
    /// replaced: the first sighting of a name wins.
    pub fn insert(&mut self, entry: IndexEntry) -> bool {
        if self.positions.contains_key(&entry.name) {
            return false;
        }
        self.positions.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    /// Entries in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Keys in discovery order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Drop every entry. `last_sync` is left untouched.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    pub fn set_last_sync(&mut self, at: Option<DateTime<Utc>>) {
        self.last_sync = at;
    }

    /// True iff the index was synced and `now - last_sync <= max_age`.
    pub fn is_fresh(&self, max_age: std::time::Duration, now: DateTime<Utc>) -> bool {
        let Some(synced) = self.last_sync else {
            return false;
        };
        match chrono::Duration::from_std(max_age) {
            Ok(max_age) => now.signed_duration_since(synced) <= max_age,
            // Larger than chrono can represent: nothing is that old.
            Err(_) => true,
        }
    }

    /// Capture provenance of every entry that has any.
    pub fn capture_metadata(&self) -> CaptureMetadata {
        self.entries
            .iter()
            .filter(|e| e.last_capture_ref.is_some() || e.last_capture_at.is_some())
            .map(|e| {
                (
                    e.name.clone(),
                    (e.last_capture_ref.clone(), e.last_capture_at),
                )
            })
            .collect()
    }

    /// Re-apply saved capture provenance to entries with the same name.
    ///
    /// Returns how many entries were restored.
    pub fn restore_capture_metadata(&mut self, saved: &CaptureMetadata) -> usize {
        let mut restored = 0;
        for entry in &mut self.entries {
            if let Some((capture_ref, capture_at)) = saved.get(&entry.name) {
                entry.last_capture_ref = capture_ref.clone();
                entry.last_capture_at = *capture_at;
                restored += 1;
            }
        }
        restored
    }
}
