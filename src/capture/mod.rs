// # Capture Module
//
// Platform screen-capture backends behind the `ScreenCapture` trait.
//
// | Platform | Method | Notes |
// |----------|--------|-------|
// | Linux X11 | ffmpeg `x11grab` | one frame per call |
// | Windows / macOS | `scrap` | primary display, cropped |
// | Linux Wayland | unsupported | returns a capture error |

pub mod scrap;
pub mod x11;

use async_trait::async_trait;
use image::RgbaImage;
use tokio::task::spawn_blocking;

use crate::core::{Region, ScreenCapture};
use crate::error::{ScanError, ScanResult};

/// Captures through whichever backend the current platform supports.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCapture;

impl SystemCapture {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScreenCapture for SystemCapture {
    async fn capture_region(&mut self, region: Region) -> ScanResult<RgbaImage> {
        spawn_blocking(move || dispatch_to_platform(region))
            .await
            .map_err(|e| ScanError::capture(format!("capture task failed: {}", e)))?
    }
}

#[cfg(target_os = "linux")]
fn dispatch_to_platform(region: Region) -> ScanResult<RgbaImage> {
    self::x11::capture_region_x11(region)
}

#[cfg(all(feature = "screen-capture", any(target_os = "windows", target_os = "macos")))]
fn dispatch_to_platform(region: Region) -> ScanResult<RgbaImage> {
    self::scrap::capture_region_scrap(region)
}

#[cfg(not(any(
    target_os = "linux",
    all(feature = "screen-capture", any(target_os = "windows", target_os = "macos"))
)))]
fn dispatch_to_platform(region: Region) -> ScanResult<RgbaImage> {
    Err(ScanError::capture(format!(
        "no capture backend for this platform (region {:?})",
        region
    )))
}
