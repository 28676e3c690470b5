//! # Index Cache
//!
//! Persists a [`FriendIndex`] as a JSON record:
//!
//! ```json
//! {
//!   "friends_index": {
//!     "jane doe": {"name": "jane doe", "scrolls": 0, "y": 240,
//!                  "last_screenshot": null, "last_screenshot_at": null}
//!   },
//!   "last_sync": "2024-05-01T12:00:00+00:00"
//! }
//! ```
//!
//! `friends_index` is written and read in discovery order. Loading fails
//! soft: an absent, unreadable or malformed file means "no cache".

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::error::{ScanError, ScanResult};
use crate::index::{FriendIndex, IndexEntry};

/// Serializes entries as a JSON object keyed by name.
struct OrderedEntries<'a>(&'a FriendIndex);

impl Serialize for OrderedEntries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in self.0.iter() {
            map.serialize_entry(&entry.name, entry)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct CacheRecordOut<'a> {
    friends_index: OrderedEntries<'a>,
    last_sync: Option<String>,
}

/// Entries as read back, keyed and in file order.
struct EntryList(Vec<(String, IndexEntry)>);

impl<'de> Deserialize<'de> for EntryList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntryListVisitor;

        impl<'de> Visitor<'de> for EntryListVisitor {
            type Value = EntryList;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of name to index entry")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<EntryList, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, entry)) = access.next_entry::<String, IndexEntry>()? {
                    entries.push((key, entry));
                }
                Ok(EntryList(entries))
            }
        }

        deserializer.deserialize_map(EntryListVisitor)
    }
}

#[derive(Deserialize)]
struct CacheRecordIn {
    friends_index: EntryList,
    #[serde(default)]
    last_sync: Option<String>,
}

/// Parse a stored sync time.
///
/// RFC 3339 is what [`IndexCache::save`] writes. Naive ISO-8601 timestamps
/// without an offset are also accepted and read as local time.
pub fn parse_sync_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    naive
        .and_local_timezone(Local)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
}

/// File-backed snapshot store for one index.
#[derive(Debug, Clone)]
pub struct IndexCache {
    path: PathBuf,
}

impl IndexCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the snapshot with `index`.
    ///
    /// The record is written to a sibling temp file and renamed into place,
    /// so a crash mid-write leaves the previous snapshot intact.
    pub fn save(&self, index: &FriendIndex) -> ScanResult<()> {
        let record = CacheRecordOut {
            friends_index: OrderedEntries(index),
            last_sync: index.last_sync().map(|at| at.to_rfc3339()),
        };
        let json = serde_json::to_string_pretty(&record)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let display = self.path.display().to_string();
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|err| ScanError::io_at("create cache temp file", &display, err))?;
        std::io::Write::write_all(&mut tmp, json.as_bytes())
            .map_err(|err| ScanError::io_at("write cache", &display, err))?;
        tmp.persist(&self.path)
            .map_err(|err| ScanError::io_at("replace cache", &display, err.error))?;

        let cache_path = &display;
        debug!(path = %cache_path, entries = index.len(), "saved index cache");
        Ok(())
    }

    /// Read the snapshot, reporting why it is unusable.
    pub fn try_load(&self) -> ScanResult<FriendIndex> {
        let display = self.path.display().to_string();
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|err| ScanError::cache_corrupt(&display, err.to_string()))?;
        let record: CacheRecordIn = serde_json::from_str(&raw)
            .map_err(|err| ScanError::cache_corrupt(&display, err.to_string()))?;

        let mut index = FriendIndex::new();
        for (key, mut entry) in record.friends_index.0 {
            if entry.name != key {
                warn!(key = %key, name = %entry.name, "cache entry name differs from its key, using key");
                entry.name = key;
            }
            index.insert(entry);
        }

        let last_sync = record.last_sync.as_deref().and_then(|raw| {
            let parsed = parse_sync_time(raw);
            if parsed.is_none() {
                warn!(last_sync = raw, "unparsable last_sync in cache, treating as never synced");
            }
            parsed
        });
        index.set_last_sync(last_sync);
        Ok(index)
    }

    /// Read the snapshot, or `None` if there is no usable one.
    pub fn load(&self) -> Option<FriendIndex> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no index cache found");
            return None;
        }
        match self.try_load() {
            Ok(index) => {
                info!(entries = index.len(), "loaded index from cache");
                Some(index)
            }
            Err(err) => {
                warn!(error = %err, "ignoring unusable index cache");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_index() -> FriendIndex {
        let mut index = FriendIndex::new();
        index.insert(IndexEntry::new("zoe", 0, 210));
        let mut amy = IndexEntry::new("amy", 0, 250);
        amy.last_capture_ref = Some("amy_20240501_120000.png".to_string());
        amy.last_capture_at = Some(1_714_564_800.5);
        index.insert(amy);
        index.insert(IndexEntry::new("mike", 1, 230));
        index.set_last_sync(Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));
        index
    }

    #[test]
    fn test_save_then_load_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path().join("friends_index.json"));
        let index = sample_index();

        cache.save(&index).unwrap();
        let loaded = cache.load().unwrap();

        assert_eq!(loaded, index);
        let keys: Vec<&str> = loaded.keys().collect();
        assert_eq!(keys, vec!["zoe", "amy", "mike"]);
    }

    #[test]
    fn test_record_shape() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path().join("friends_index.json"));
        cache.save(&sample_index()).unwrap();

        let raw = std::fs::read_to_string(cache.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let amy = &value["friends_index"]["amy"];
        assert_eq!(amy["scrolls"], 0);
        assert_eq!(amy["y"], 250);
        assert_eq!(amy["last_screenshot"], "amy_20240501_120000.png");
        assert!(value["friends_index"]["zoe"]["last_screenshot"].is_null());
        assert!(value["last_sync"].as_str().unwrap().starts_with("2024-05-01T12:00:00"));
    }

    #[test]
    fn test_missing_file_is_no_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path().join("absent.json"));
        assert!(cache.load().is_none());
    }

    #[test]
    fn test_malformed_files_are_no_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("friends_index.json");
        let cache = IndexCache::new(&path);

        for body in ["", "null", "{}", "[1,2]", "{\"last_sync\": null}", "{\"friends_index\": 3}"] {
            std::fs::write(&path, body).unwrap();
            assert!(cache.load().is_none(), "accepted {body:?}");
            assert_eq!(cache.try_load().unwrap_err().category(), "cache_corrupt");
        }
    }

    #[test]
    fn test_missing_last_sync_loads_unsynced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("friends_index.json");
        std::fs::write(
            &path,
            r#"{"friends_index": {"bob": {"name": "bob", "scrolls": 2, "y": 300}}}"#,
        )
        .unwrap();

        let index = IndexCache::new(&path).load().unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.last_sync().is_none());
        assert!(index.get("bob").unwrap().last_capture_ref.is_none());
    }

    #[test]
    fn test_parse_sync_time_accepts_naive_iso() {
        assert!(parse_sync_time("2024-05-01T12:00:00.123456").is_some());
        assert!(parse_sync_time("2024-05-01T12:00:00").is_some());
        assert_eq!(
            parse_sync_time("2024-05-01T12:00:00Z"),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        );
        assert!(parse_sync_time("yesterday").is_none());
    }

    #[test]
    fn test_unparsable_last_sync_reads_as_never_synced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("friends_index.json");
        std::fs::write(&path, r#"{"friends_index": {}, "last_sync": "soon"}"#).unwrap();

        let index = IndexCache::new(&path).load().unwrap();
        assert!(index.is_empty());
        assert!(index.last_sync().is_none());
    }
}
