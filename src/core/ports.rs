//! # Collaborator Interfaces
//!
//! The engine never talks to the operating system directly. Pixels, pointer
//! input and text recognition come through the three traits below, which
//! lets the scroll/scan/click protocols run unchanged against scripted fakes
//! in tests and against real desktop backends in production.

use async_trait::async_trait;
use image::{GrayImage, RgbaImage};
use scan_text::OcrToken;

use crate::core::Region;
use crate::error::ScanResult;

/// Captures a rectangle of the screen.
#[async_trait]
pub trait ScreenCapture: Send {
    /// Grab the pixels currently shown inside `region`.
    async fn capture_region(&mut self, region: Region) -> ScanResult<RgbaImage>;
}

/// Delivers synthetic pointer input.
#[async_trait]
pub trait InputDriver: Send {
    /// Move the pointer to an absolute screen position.
    async fn move_pointer(&mut self, x: i32, y: i32) -> ScanResult<()>;

    /// Left-click at an absolute screen position.
    async fn click(&mut self, x: i32, y: i32) -> ScanResult<()>;

    /// Scroll at the current pointer position.
    ///
    /// Positive amounts scroll up, negative amounts scroll down.
    async fn scroll(&mut self, amount: i32) -> ScanResult<()>;
}

/// Recognizes words in a binarized image.
#[async_trait]
pub trait OcrEngine: Send {
    /// Return every recognized word, in any order, with image-relative positions.
    async fn recognize(&mut self, mask: &GrayImage) -> ScanResult<Vec<OcrToken>>;
}

/// The full set of collaborators one session drives.
pub struct Desktop {
    pub capture: Box<dyn ScreenCapture>,
    pub input: Box<dyn InputDriver>,
    pub ocr: Box<dyn OcrEngine>,
}

impl Desktop {
    pub fn new(
        capture: impl ScreenCapture + 'static,
        input: impl InputDriver + 'static,
        ocr: impl OcrEngine + 'static,
    ) -> Self {
        Self {
            capture: Box::new(capture),
            input: Box::new(input),
            ocr: Box::new(ocr),
        }
    }
}
