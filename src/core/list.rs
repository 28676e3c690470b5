//! # List Scroll Control
//!
//! Shared scroll primitives for the friends list. Both index builds and
//! navigation start with [`ListControls::reanchor`]: recorded scroll counts
//! are only meaningful relative to the top of the list, and nothing else
//! guarantees where the list currently is.

use std::time::Duration;

use tracing::debug;

use crate::core::{InputDriver, Region};
use crate::error::ScanResult;

/// Scroll units per downward pulse while scanning or replaying.
pub const SCROLL_PULSE: i32 = 30;
/// Scroll units per upward pulse when returning to the top.
pub const RESET_PULSE: i32 = 600;
/// Upward pulses issued to guarantee the list is at its top.
pub const RESET_PULSES: usize = 3;
/// Pointer offset from the list's top-left corner while scrolling.
const PARK_OFFSET: i32 = 10;

/// Scroll driver bound to one list region.
#[derive(Debug, Clone, Copy)]
pub struct ListControls {
    region: Region,
    settle: Duration,
}

impl ListControls {
    pub fn new(region: Region, settle: Duration) -> Self {
        Self { region, settle }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Put the pointer over the list so scroll events land on it.
    pub async fn park_pointer(&self, input: &mut dyn InputDriver) -> ScanResult<()> {
        let (x, y) = self.region.offset(PARK_OFFSET, PARK_OFFSET);
        input.move_pointer(x, y).await
    }

    /// Scroll the list back to its first row.
    pub async fn reanchor(&self, input: &mut dyn InputDriver) -> ScanResult<()> {
        debug!("re-anchoring list to top");
        self.park_pointer(input).await?;
        for _ in 0..RESET_PULSES {
            input.scroll(RESET_PULSE).await?;
            tokio::time::sleep(self.settle).await;
        }
        Ok(())
    }

    /// Scroll the list down by one pulse and wait for it to settle.
    pub async fn pulse_down(&self, input: &mut dyn InputDriver) -> ScanResult<()> {
        self.park_pointer(input).await?;
        input.scroll(-SCROLL_PULSE).await?;
        tokio::time::sleep(self.settle).await;
        Ok(())
    }
}
