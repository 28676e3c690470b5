//! # Finder Session
//!
//! The one object that owns the live index, the selection state and the
//! desktop collaborators, and exposes the operations a caller actually
//! wants: make sure the index is usable, select an entry by a partial name,
//! and capture the map for whatever is selected.
//!
//! ## Architecture
//!
//! 1. **FinderSession**: owns [`FriendIndex`], [`SelectionState`], [`Desktop`]
//!    and the [`IndexCache`] it persists to
//! 2. **FinderSessionBuilder**: fluent construction from a [`ScanConfig`]
//!    and a set of collaborators
//! 3. **IndexBuilder / Navigator**: stateless drivers created per call from
//!    the configured regions
//!
//! Every operation takes `&mut self`. A session drives the real mouse, so
//! callers sharing one must serialize access (the HTTP facade keeps it
//! behind a mutex).

use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use tracing::{info, warn};

use crate::config::ScanConfig;
use crate::core::Desktop;
use crate::error::{ScanError, ScanResult};
use crate::index::{BuildReport, FriendIndex, IndexBuilder, IndexCache, IndexEntry};
use crate::navigation::{self, NavigationOutcome, Navigator, SelectionState};

/// Name substituted for `{name}` when capturing with nothing selected.
pub const NO_SELECTION: &str = "NO_SELECTION";
/// Format of the `{timestamp}` substitution, in local time.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Why [`FinderSession::load_or_build`] rebuilt the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildReason {
    /// No usable cache file.
    NoCache,
    /// The cache has no sync time.
    NeverSynced,
    /// The cache is older than `index_stale_time`.
    Stale,
}

/// What [`FinderSession::load_or_build`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The cached index was fresh and is now live.
    Fresh { entries: usize },
    /// The index was rebuilt by scanning the list.
    Rebuilt {
        reason: RebuildReason,
        report: BuildReport,
    },
}

/// A successful selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Index key the query resolved to.
    pub key: String,
    pub outcome: NavigationOutcome,
}

/// A map capture written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRecord {
    /// File name inside the screenshot directory.
    pub filename: String,
    pub path: PathBuf,
    /// Entry the capture was recorded on, if one was selected.
    pub entry: Option<String>,
    /// Unix time in seconds.
    pub captured_at: f64,
}

/// Snapshot of the index for listings.
#[derive(Debug, Clone, PartialEq)]
pub struct FriendListing {
    pub last_sync: Option<DateTime<Utc>>,
    /// Entries in discovery order.
    pub friends: Vec<IndexEntry>,
    pub selected: Option<String>,
}

/// Expand a capture file name template.
///
/// `{name}` and `{timestamp}` are substituted and `.png` is appended unless
/// the result already ends with it (case-insensitively).
///
/// ```rust
/// use chrono::{Local, TimeZone};
/// use friendscan::session::render_filename;
///
/// let at = Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 5).unwrap();
/// assert_eq!(
///     render_filename("{name}_{timestamp}.png", "jane doe", &at),
///     "jane doe_20240501_093005.png"
/// );
/// assert_eq!(render_filename("shot-{name}", "bob", &at), "shot-bob.png");
/// ```
pub fn render_filename(format: &str, name: &str, at: &DateTime<Local>) -> String {
    let timestamp = at.format(TIMESTAMP_FORMAT).to_string();
    let mut filename = format
        .replace("{name}", name)
        .replace("{timestamp}", &timestamp);
    if !filename.to_ascii_lowercase().ends_with(".png") {
        filename.push_str(".png");
    }
    filename
}

/// Owns the live index and everything needed to act on it.
pub struct FinderSession {
    config: ScanConfig,
    desktop: Desktop,
    index: FriendIndex,
    selection: SelectionState,
    cache: IndexCache,
}

impl FinderSession {
    /// Create a session with an empty index; nothing is loaded yet.
    pub fn new(config: ScanConfig, desktop: Desktop) -> Self {
        let cache = IndexCache::new(config.cache_path());
        Self {
            config,
            desktop,
            index: FriendIndex::new(),
            selection: SelectionState::new(),
            cache,
        }
    }

    pub fn builder() -> FinderSessionBuilder {
        FinderSessionBuilder::new()
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn index(&self) -> &FriendIndex {
        &self.index
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }

    /// Key of the entry this session last selected.
    pub fn selected(&self) -> Option<&str> {
        self.selection.current()
    }

    /// Replace the live index with the cached one, if there is a usable cache.
    pub fn load_cached(&mut self) -> bool {
        match self.cache.load() {
            Some(index) => {
                self.index = index;
                true
            }
            None => false,
        }
    }

    /// Load the cached index, rebuilding it if it is missing, unsynced or stale.
    pub async fn load_or_build(&mut self) -> ScanResult<LoadOutcome> {
        let reason = if !self.load_cached() {
            info!("could not load index, building a new one");
            Some(RebuildReason::NoCache)
        } else if self.index.last_sync().is_none() {
            info!("cached index was never synced, rebuilding");
            Some(RebuildReason::NeverSynced)
        } else if !self.index.is_fresh(self.config.stale_after(), Utc::now()) {
            info!("cached index is stale, rebuilding");
            Some(RebuildReason::Stale)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                let report = self.rebuild().await?;
                Ok(LoadOutcome::Rebuilt { reason, report })
            }
            None => {
                info!(entries = self.index.len(), "index is fresh, no rebuild needed");
                Ok(LoadOutcome::Fresh {
                    entries: self.index.len(),
                })
            }
        }
    }

    /// Rescan the whole list and persist the result.
    pub async fn rebuild(&mut self) -> ScanResult<BuildReport> {
        let builder = IndexBuilder::new(
            self.config.list_region()?,
            self.config.map_region()?,
            self.config.scroll_settle(),
        );
        let report = builder.build(&mut self.index, &mut self.desktop).await?;
        self.cache.save(&self.index)?;
        Ok(report)
    }

    /// Resolve a free-form query against the live index.
    pub fn resolve(&self, query: &str) -> Option<String> {
        navigation::resolve(&self.index, query)
    }

    /// Resolve `query` and navigate to the entry it names.
    pub async fn select(&mut self, query: &str, force: bool) -> ScanResult<Selection> {
        let key = self
            .resolve(query)
            .ok_or_else(|| ScanError::target_missing(query).with_operation("select"))?;

        if key != query.trim().to_lowercase() {
            let candidates = navigation::candidates(&self.index, query);
            if candidates.len() > 1 {
                warn!(query, chosen = %key, ?candidates, "ambiguous query, using first match");
            }
        }

        let navigator = Navigator::new(
            self.config.list_region()?,
            self.config.scroll_settle(),
            self.config.map_settle(),
        );
        let outcome = navigator
            .navigate(
                &self.index,
                &mut self.selection,
                self.desktop.input.as_mut(),
                &key,
                force,
            )
            .await?;
        Ok(Selection { key, outcome })
    }

    /// Screenshot the map region and record it on the selected entry.
    ///
    /// `custom_format` overrides the configured file name template. With no
    /// selection the file is still written, named with [`NO_SELECTION`].
    pub async fn capture_map(&mut self, custom_format: Option<&str>) -> ScanResult<CaptureRecord> {
        let region = self.config.map_region()?;
        let name = self.selection.current().unwrap_or(NO_SELECTION).to_string();
        let now = Local::now();
        let format = custom_format.unwrap_or(&self.config.filename_format);
        let filename = render_filename(format, &name, &now);

        let dir = self.config.screenshot_path();
        std::fs::create_dir_all(&dir)
            .map_err(|e| ScanError::io_at("create screenshot dir", dir.display().to_string(), e))?;
        let path = dir.join(&filename);

        let shot = self.desktop.capture.capture_region(region).await?;
        shot.save_with_format(&path, image::ImageFormat::Png)
            .map_err(|e| ScanError::from(e).with_operation("save map capture"))?;
        info!(file = %filename, "saved map capture");

        let captured_at = now.timestamp_micros() as f64 / 1_000_000.0;
        let entry = match self.index.get_mut(&name) {
            Some(entry) => {
                entry.last_capture_ref = Some(filename.clone());
                entry.last_capture_at = Some(captured_at);
                Some(name)
            }
            None => None,
        };
        if entry.is_some() {
            self.cache.save(&self.index)?;
        }

        Ok(CaptureRecord {
            filename,
            path,
            entry,
            captured_at,
        })
    }

    /// Forget the tracked selection without issuing input.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn friends(&self) -> FriendListing {
        FriendListing {
            last_sync: self.index.last_sync(),
            friends: self.index.iter().cloned().collect(),
            selected: self.selection.current().map(str::to_string),
        }
    }
}

/// Builder for [`FinderSession`].
#[derive(Default)]
pub struct FinderSessionBuilder {
    config: Option<ScanConfig>,
    desktop: Option<Desktop>,
}

impl FinderSessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_desktop(mut self, desktop: Desktop) -> Self {
        self.desktop = Some(desktop);
        self
    }

    /// Build the session; the configuration defaults if none was given.
    pub fn build(self) -> ScanResult<FinderSession> {
        let desktop = self
            .desktop
            .ok_or_else(|| ScanError::config("desktop", "no collaborators supplied"))?;
        Ok(FinderSession::new(self.config.unwrap_or_default(), desktop))
    }
}
