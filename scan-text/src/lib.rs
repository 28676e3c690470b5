// SPDX-License-Identifier: MIT
//! # scan-text: Text Handling for OCR'd List Snapshots
//!
//! Pure, allocation-light helpers that turn raw OCR word tokens into
//! matchable list entries. Nothing in this crate touches the screen, the
//! filesystem or the clock, so every function here is deterministic.
//!
//! ## Key Components
//!
//! - [`lines`]: groups word tokens into visual text lines by vertical proximity
//! - [`normalize`]: canonicalizes a raw line into a lookup key
//!
//! ## Usage Example
//!
//! ```rust
//! use scan_text::{OcrToken, lines::reconstruct_lines, normalize::normalize_name};
//!
//! let tokens = vec![
//!     OcrToken::new("Jane", 4, 10),
//!     OcrToken::new("(Home)", 60, 11),
//!     OcrToken::new("Bob", 4, 48),
//! ];
//!
//! let names: Vec<String> = reconstruct_lines(tokens)
//!     .map(|line| normalize_name(&line.text))
//!     .collect();
//! assert_eq!(names, vec!["jane", "bob"]);
//! ```

pub mod lines;
pub mod normalize;

/// A single word recognized by an OCR engine.
///
/// Coordinates are relative to the image handed to the engine, in pixels.
/// Engines return tokens in no guaranteed reading order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OcrToken {
    pub text: String,
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl OcrToken {
    /// Token with a position but no known extent.
    pub fn new(text: impl Into<String>, left: i32, top: i32) -> Self {
        Self {
            text: text.into(),
            left,
            top,
            width: 0,
            height: 0,
        }
    }
}
