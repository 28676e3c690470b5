//! # Navigation
//!
//! Resolves user queries to index keys and replays the recorded scroll path
//! to select an entry in the list.
//!
//! Replaying assumes the list has not changed since it was indexed: the
//! entry is expected at exactly `row_y` after exactly `scroll_count` pulses
//! from the top.

use std::time::Duration;

use tracing::{debug, info};

use crate::core::{InputDriver, ListControls, Region};
use crate::error::{ScanError, ScanResult};
use crate::index::FriendIndex;

/// Which entry this process last selected.
///
/// Changes made to the app outside this process are not observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    currently_selected: Option<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.currently_selected.as_deref()
    }

    /// Forget the tracked selection without touching the UI.
    pub fn clear(&mut self) {
        if self.currently_selected.take().is_some() {
            info!("cleared selection tracking");
        }
    }

    fn set(&mut self, key: &str) {
        self.currently_selected = Some(key.to_string());
    }
}

/// Resolve a free-form query to an index key.
///
/// Matching is case-insensitive. An exact key match wins; otherwise the
/// first key in discovery order that contains the query, or is contained in
/// it, is returned.
///
/// ```rust
/// use friendscan::index::{FriendIndex, IndexEntry};
/// use friendscan::navigation::resolve;
///
/// let mut index = FriendIndex::new();
/// index.insert(IndexEntry::new("jane doe", 0, 100));
/// index.insert(IndexEntry::new("jane", 1, 120));
///
/// assert_eq!(resolve(&index, "Jane").as_deref(), Some("jane"));
/// assert_eq!(resolve(&index, "doe").as_deref(), Some("jane doe"));
/// assert_eq!(resolve(&index, "Jane (Home)").as_deref(), Some("jane"));
/// assert_eq!(resolve(&index, "carl"), None);
/// ```
pub fn resolve(index: &FriendIndex, query: &str) -> Option<String> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }
    if index.contains(&query) {
        return Some(query);
    }
    index
        .keys()
        .find(|key| partial_match(key, &query))
        .map(str::to_string)
}

/// Every key a non-exact query would match, in discovery order.
///
/// Used to detect ambiguous queries; [`resolve`] picks the first of these.
pub fn candidates(index: &FriendIndex, query: &str) -> Vec<String> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    index
        .keys()
        .filter(|key| partial_match(key, &query))
        .map(str::to_string)
        .collect()
}

fn partial_match(key: &str, query: &str) -> bool {
    let key = key.to_lowercase();
    key.contains(query) || query.contains(key.as_str())
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Input was issued and the entry is now selected.
    Selected,
    /// The entry was already selected; no input was issued.
    AlreadySelected,
}

/// Replays recorded scroll paths and clicks entries.
#[derive(Debug, Clone, Copy)]
pub struct Navigator {
    controls: ListControls,
    map_settle: Duration,
}

impl Navigator {
    pub fn new(list_region: Region, scroll_settle: Duration, map_settle: Duration) -> Self {
        Self {
            controls: ListControls::new(list_region, scroll_settle),
            map_settle,
        }
    }

    /// Select the entry stored under `key`.
    ///
    /// Without `force`, selecting the entry that is already selected is a
    /// no-op. Otherwise the list is re-anchored, scrolled down the recorded
    /// number of pulses, and the entry's row is clicked at the list's
    /// horizontal midpoint.
    pub async fn navigate(
        &self,
        index: &FriendIndex,
        selection: &mut SelectionState,
        input: &mut dyn InputDriver,
        key: &str,
        force: bool,
    ) -> ScanResult<NavigationOutcome> {
        let entry = index
            .get(key)
            .ok_or_else(|| ScanError::target_missing(key).with_operation("navigate"))?;

        if !force && selection.current() == Some(key) {
            debug!(key, "already selected, skipping click");
            return Ok(NavigationOutcome::AlreadySelected);
        }

        self.controls.reanchor(input).await?;
        for _ in 0..entry.scroll_count {
            self.controls.pulse_down(input).await?;
        }

        let click_x = self.controls.region().center_x();
        input.click(click_x, entry.row_y).await?;
        info!(key, scrolls = entry.scroll_count, y = entry.row_y, "clicked entry");
        tokio::time::sleep(self.map_settle).await;

        selection.set(key);
        Ok(NavigationOutcome::Selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexEntry;

    fn index_of(keys: &[&str]) -> FriendIndex {
        let mut index = FriendIndex::new();
        for (i, key) in keys.iter().enumerate() {
            index.insert(IndexEntry::new(*key, 0, 100 + i as i32 * 40));
        }
        index
    }

    #[test]
    fn test_exact_match_beats_earlier_substring() {
        let index = index_of(&["jane doe", "jane"]);
        assert_eq!(resolve(&index, "jane").as_deref(), Some("jane"));
    }

    #[test]
    fn test_first_partial_match_in_discovery_order() {
        let index = index_of(&["mary ann", "ann lee", "annie"]);
        assert_eq!(resolve(&index, "ann").as_deref(), Some("mary ann"));
        assert_eq!(candidates(&index, "ann"), vec!["mary ann", "ann lee", "annie"]);
    }

    #[test]
    fn test_query_containing_key_matches() {
        let index = index_of(&["bob"]);
        assert_eq!(resolve(&index, "Bob Smith").as_deref(), Some("bob"));
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        let index = index_of(&["bob"]);
        assert_eq!(resolve(&index, "   "), None);
        assert!(candidates(&index, "").is_empty());
    }

    #[test]
    fn test_clear_selection() {
        let mut selection = SelectionState::new();
        selection.set("bob");
        assert_eq!(selection.current(), Some("bob"));
        selection.clear();
        assert_eq!(selection.current(), None);
    }
}
