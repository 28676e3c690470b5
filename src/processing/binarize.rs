//! # Text Preprocessing
//!
//! Turns a captured list image into a binary mask that OCR reads far more
//! reliably than the raw screenshot. The target list renders dark glyphs on
//! a light background, so the mask is an inverse threshold: dark pixels
//! become foreground (255), everything else background (0).
//!
//! ## Pipeline
//!
//! 1. Grayscale with BT.601 luma weights (`0.299 R + 0.587 G + 0.114 B`)
//! 2. Inverse binary threshold at [`TEXT_THRESHOLD`]: `gray <= 65` → 255
//! 3. One dilation pass with a 2×2 structuring element, which closes the
//!    hairline gaps anti-aliasing leaves inside glyphs
//!
//! The function is pure: same image in, same mask out.

use image::{GrayImage, Luma, RgbaImage};

/// Gray level at or below which a pixel is treated as text.
pub const TEXT_THRESHOLD: u8 = 65;
const FOREGROUND: u8 = 255;
const BACKGROUND: u8 = 0;

/// Build the OCR input mask for a captured list image.
///
/// ```rust
/// use friendscan::processing::binarize_text;
/// use image::{Rgba, RgbaImage};
///
/// let mut img = RgbaImage::from_pixel(4, 4, Rgba([240, 240, 240, 255]));
/// img.put_pixel(1, 1, Rgba([20, 20, 20, 255]));
///
/// let mask = binarize_text(&img);
/// assert_eq!(mask.get_pixel(1, 1)[0], 255);
/// assert_eq!(mask.get_pixel(0, 0)[0], 0);
/// ```
pub fn binarize_text(image: &RgbaImage) -> GrayImage {
    dilate_2x2(&threshold_inverse(image, TEXT_THRESHOLD))
}

/// BT.601 luma, rounded to nearest.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114 + 500) / 1000) as u8
}

fn threshold_inverse(image: &RgbaImage, threshold: u8) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let [r, g, b, _] = image.get_pixel(x, y).0;
        if luma(r, g, b) > threshold {
            Luma([BACKGROUND])
        } else {
            Luma([FOREGROUND])
        }
    })
}

/// Max filter over the 2×2 window anchored at its bottom-right cell.
///
/// Each output pixel takes the maximum of itself and its left, upper and
/// upper-left neighbours. Neighbours outside the image are ignored.
fn dilate_2x2(mask: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let mut value = mask.get_pixel(x, y)[0];
        if x > 0 {
            value = value.max(mask.get_pixel(x - 1, y)[0]);
        }
        if y > 0 {
            value = value.max(mask.get_pixel(x, y - 1)[0]);
        }
        if x > 0 && y > 0 {
            value = value.max(mask.get_pixel(x - 1, y - 1)[0]);
        }
        Luma([value])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const PAPER: Rgba<u8> = Rgba([235, 235, 235, 255]);
    const INK: Rgba<u8> = Rgba([30, 30, 30, 255]);

    fn foreground(mask: &GrayImage) -> Vec<(u32, u32)> {
        mask.enumerate_pixels()
            .filter(|(_, _, p)| p[0] == FOREGROUND)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(luma(65, 65, 65), 65);
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([65, 65, 65, 255]));
        img.put_pixel(1, 0, Rgba([66, 66, 66, 255]));
        let mask = threshold_inverse(&img, TEXT_THRESHOLD);
        assert_eq!(mask.get_pixel(0, 0)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(1, 0)[0], BACKGROUND);
    }

    #[test]
    fn test_luma_weights_favor_green() {
        // Pure blue is dark, pure green is bright.
        assert!(luma(0, 0, 255) <= TEXT_THRESHOLD);
        assert!(luma(0, 255, 0) > TEXT_THRESHOLD);
    }

    #[test]
    fn test_dilation_grows_right_and_down() {
        let mut img = RgbaImage::from_pixel(4, 4, PAPER);
        img.put_pixel(1, 1, INK);

        let mask = binarize_text(&img);
        assert_eq!(foreground(&mask), vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
    }

    #[test]
    fn test_dilation_at_edges_stays_in_bounds() {
        let mut img = RgbaImage::from_pixel(3, 3, PAPER);
        img.put_pixel(2, 2, INK);
        let mask = binarize_text(&img);
        assert_eq!(foreground(&mask), vec![(2, 2)]);
    }

    #[test]
    fn test_blank_image_has_no_foreground() {
        let img = RgbaImage::from_pixel(8, 8, PAPER);
        assert!(foreground(&binarize_text(&img)).is_empty());
    }
}
