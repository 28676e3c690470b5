//! # Index Builder
//!
//! Scans the whole friends list by alternating OCR passes with single
//! scroll-down pulses, recording for every new name the number of pulses it
//! took to bring it on screen and the screen row it appeared at.
//!
//! ## Protocol
//!
//! 1. Remember capture provenance of the current entries.
//! 2. Re-anchor the list to its top, then click a neutral point on the map
//!    so no hover or selection highlight sits over the list text.
//! 3. Clear the index.
//! 4. For up to [`MAX_ROUNDS`] rounds: capture the list, binarize, OCR,
//!    rebuild lines, normalize, and record names not seen yet. A round with
//!    no new names is stale; [`STALE_ROUND_LIMIT`] consecutive stale rounds
//!    mean the end of the list. Otherwise scroll down one pulse.
//! 5. Re-apply remembered provenance to entries with identical names.
//! 6. Stamp `last_sync`.
//!
//! A capture, OCR or input failure aborts the build with the index cleared
//! or partially filled. Builds always start by re-anchoring, so a failed
//! build can simply be run again.

use std::time::Duration;

use chrono::Utc;
use scan_text::lines::reconstruct_lines;
use scan_text::normalize::normalize_name;
use tracing::{debug, info};

use crate::core::{Desktop, ListControls, Region};
use crate::error::{ScanError, ScanResult};
use crate::index::{FriendIndex, IndexEntry};
use crate::processing::binarize_text;

/// Upper bound on capture rounds per build.
pub const MAX_ROUNDS: usize = 50;
/// Consecutive rounds without a new name that end a build.
pub const STALE_ROUND_LIMIT: usize = 2;
/// Defocus click position relative to the map's top-left corner.
const DEFOCUS_OFFSET: i32 = 50;

/// Summary of a completed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Capture rounds performed.
    pub rounds: usize,
    /// Entries in the rebuilt index.
    pub entries: usize,
    /// Entries whose capture provenance survived the rebuild.
    pub restored: usize,
    /// Whether the build stopped on stale rounds rather than the round cap.
    pub reached_end: bool,
}

/// Drives a full list scan.
#[derive(Debug, Clone, Copy)]
pub struct IndexBuilder {
    controls: ListControls,
    defocus_at: (i32, i32),
}

impl IndexBuilder {
    pub fn new(list_region: Region, map_region: Region, scroll_settle: Duration) -> Self {
        Self {
            controls: ListControls::new(list_region, scroll_settle),
            defocus_at: map_region.offset(DEFOCUS_OFFSET, DEFOCUS_OFFSET),
        }
    }

    /// Replace the contents of `index` with a fresh scan of the list.
    pub async fn build(&self, index: &mut FriendIndex, desktop: &mut Desktop) -> ScanResult<BuildReport> {
        info!("building friends index (OCR scan)");

        let saved = index.capture_metadata();
        debug!(saved = saved.len(), "remembered capture metadata");

        self.controls.reanchor(desktop.input.as_mut()).await?;
        let (x, y) = self.defocus_at;
        desktop.input.click(x, y).await?;

        index.clear();
        let region = self.controls.region();
        let mut scroll_count: u32 = 0;
        let mut stale_rounds = 0;
        let mut rounds = 0;
        let mut reached_end = false;

        for round in 0..MAX_ROUNDS {
            rounds = round + 1;
            let added = self
                .scan_round(index, desktop, region, scroll_count)
                .await
                .map_err(|err| {
                    err.with_operation("build_index")
                        .with_metadata("round", rounds.to_string())
                })?;

            if added == 0 {
                stale_rounds += 1;
                debug!(stale_rounds, "no new names this round");
                if stale_rounds >= STALE_ROUND_LIMIT {
                    info!(rounds, "no new names after {} rounds, end of list", STALE_ROUND_LIMIT);
                    reached_end = true;
                    break;
                }
            } else {
                stale_rounds = 0;
            }

            if rounds < MAX_ROUNDS {
                self.controls.pulse_down(desktop.input.as_mut()).await?;
                scroll_count += 1;
            }
        }

        let restored = index.restore_capture_metadata(&saved);
        index.set_last_sync(Some(Utc::now()));
        info!(entries = index.len(), restored, rounds, "index built");

        Ok(BuildReport {
            rounds,
            entries: index.len(),
            restored,
            reached_end,
        })
    }

    /// One capture/OCR pass; returns the number of names added.
    async fn scan_round(
        &self,
        index: &mut FriendIndex,
        desktop: &mut Desktop,
        region: Region,
        scroll_count: u32,
    ) -> ScanResult<usize> {
        let shot = desktop.capture.capture_region(region).await?;
        if shot.width() == 0 || shot.height() == 0 {
            return Err(ScanError::capture("captured list image is empty"));
        }
        let mask = binarize_text(&shot);
        let tokens = desktop.ocr.recognize(&mask).await?;

        let mut added = 0;
        for line in reconstruct_lines(tokens) {
            let name = normalize_name(&line.text);
            if name.is_empty() || index.contains(&name) {
                continue;
            }
            let row_y = region.top + line.top;
            debug!(name = %name, scrolls = scroll_count, y = row_y, "indexed");
            index.insert(IndexEntry::new(name, scroll_count, row_y));
            added += 1;
        }
        Ok(added)
    }
}
