// # Scrap Region Capture
//
// Windows and macOS region capture using the `scrap` library. scrap only
// grabs whole displays, so each call takes one frame of the primary display
// and crops it to the requested region.
//
// A `Capturer` is not `Send`, so one is created per call inside the
// blocking task rather than kept on the backend.

#[cfg(all(feature = "screen-capture", any(target_os = "windows", target_os = "macos")))]
use std::{thread, time::Duration};

use image::RgbaImage;
#[cfg(all(feature = "screen-capture", any(target_os = "windows", target_os = "macos")))]
use scrap::{Capturer, Display};

use crate::core::Region;
use crate::error::{ScanError, ScanResult};

/// Attempts to get a frame before giving up on a display that never produces one.
#[cfg(all(feature = "screen-capture", any(target_os = "windows", target_os = "macos")))]
const FRAME_ATTEMPTS: usize = 200;

/// Grab `region` from the primary display.
#[cfg(all(feature = "screen-capture", any(target_os = "windows", target_os = "macos")))]
pub fn capture_region_scrap(region: Region) -> ScanResult<RgbaImage> {
    let display = Display::primary()
        .map_err(|e| ScanError::capture(format!("scrap: no primary display: {}", e)))?;
    let (width, height) = (display.width(), display.height());
    let mut capturer = Capturer::new(display)
        .map_err(|e| ScanError::capture(format!("scrap: cannot create capturer: {}", e)))?;

    for _ in 0..FRAME_ATTEMPTS {
        match capturer.frame() {
            Ok(frame) => {
                let stride = if height == 0 { 0 } else { frame.len() / height };
                return crop_bgra(&frame, width as u32, height as u32, stride, region);
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                // no frame ready yet, small nap
                thread::sleep(Duration::from_millis(5));
            }
            Err(e) => return Err(ScanError::capture(format!("scrap frame error: {}", e))),
        }
    }
    Err(ScanError::capture("scrap: display produced no frame"))
}

/// Copy `region` out of a BGRA frame into an RGBA image.
///
/// `stride` is the byte length of one frame row, which may exceed
/// `frame_width * 4` when the platform pads rows.
pub fn crop_bgra(
    frame: &[u8],
    frame_width: u32,
    frame_height: u32,
    stride: usize,
    region: Region,
) -> ScanResult<RgbaImage> {
    if region.is_empty() {
        return Err(ScanError::capture("capture region has zero size"));
    }
    let fits = region.left >= 0
        && region.top >= 0
        && region.left as u64 + region.width as u64 <= frame_width as u64
        && region.top as u64 + region.height as u64 <= frame_height as u64;
    if !fits {
        return Err(ScanError::capture(format!(
            "region {:?} lies outside the {}x{} display",
            region, frame_width, frame_height
        )));
    }
    if stride < frame_width as usize * 4 || frame.len() < stride * frame_height as usize {
        return Err(ScanError::capture(format!(
            "unexpected frame size {} for {}x{} with stride {}",
            frame.len(),
            frame_width,
            frame_height,
            stride
        )));
    }

    let (left, top) = (region.left as usize, region.top as usize);
    Ok(RgbaImage::from_fn(region.width, region.height, |x, y| {
        let offset = (top + y as usize) * stride + (left + x as usize) * 4;
        let px = &frame[offset..offset + 4];
        image::Rgba([px[2], px[1], px[0], 255])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32, stride: usize) -> Vec<u8> {
        let mut data = vec![0u8; stride * height as usize];
        for y in 0..height as usize {
            for x in 0..width as usize {
                let o = y * stride + x * 4;
                data[o] = x as u8; // B
                data[o + 1] = y as u8; // G
                data[o + 2] = 200; // R
                data[o + 3] = 0;
            }
        }
        data
    }

    #[test]
    fn test_crop_swaps_channels_and_honors_stride() {
        let data = frame(8, 6, 8 * 4 + 16);
        let img = crop_bgra(&data, 8, 6, 8 * 4 + 16, Region::new(2, 3, 4, 2)).unwrap();
        assert_eq!(img.dimensions(), (4, 2));
        assert_eq!(img.get_pixel(0, 0).0, [200, 3, 2, 255]);
        assert_eq!(img.get_pixel(3, 1).0, [200, 4, 5, 255]);
    }

    #[test]
    fn test_crop_rejects_out_of_bounds() {
        let data = frame(8, 6, 32);
        assert!(crop_bgra(&data, 8, 6, 32, Region::new(6, 0, 4, 2)).is_err());
        assert!(crop_bgra(&data, 8, 6, 32, Region::new(-1, 0, 4, 2)).is_err());
        assert!(crop_bgra(&data, 8, 6, 32, Region::new(0, 0, 0, 2)).is_err());
    }

    #[test]
    fn test_crop_rejects_short_frame() {
        let data = vec![0u8; 10];
        let err = crop_bgra(&data, 8, 6, 32, Region::new(0, 0, 2, 2)).unwrap_err();
        assert_eq!(err.category(), "capture");
    }
}
