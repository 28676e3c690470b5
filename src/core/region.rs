//! # Screen Regions
//!
//! A [`Region`] is an axis-aligned rectangle in absolute screen pixels.
//! Regions are stored in the configuration file as `[left, top, width, height]`
//! arrays, the same shape the setup tooling writes.

use serde::{Deserialize, Serialize};

/// Rectangle in absolute screen-pixel coordinates.
///
/// ```rust
/// use friendscan::core::Region;
///
/// let list = Region::new(100, 200, 300, 400);
/// assert_eq!(list.center_x(), 250);
/// assert_eq!(list.offset(10, 10), (110, 210));
///
/// let json = serde_json::to_string(&list).unwrap();
/// assert_eq!(json, "[100,200,300,400]");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i32, i32, u32, u32)", into = "(i32, i32, u32, u32)")]
pub struct Region {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// True when the region covers at least one pixel.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Horizontal midpoint in screen pixels.
    pub fn center_x(&self) -> i32 {
        self.left + (self.width / 2) as i32
    }

    /// Absolute screen point at `(dx, dy)` from the top-left corner.
    pub fn offset(&self, dx: i32, dy: i32) -> (i32, i32) {
        (self.left + dx, self.top + dy)
    }
}

impl From<(i32, i32, u32, u32)> for Region {
    fn from((left, top, width, height): (i32, i32, u32, u32)) -> Self {
        Self::new(left, top, width, height)
    }
}

impl From<Region> for (i32, i32, u32, u32) {
    fn from(region: Region) -> Self {
        (region.left, region.top, region.width, region.height)
    }
}
