//! # Processing Module
//!
//! Image preprocessing applied to list captures before OCR.

pub mod binarize;

pub use binarize::{TEXT_THRESHOLD, binarize_text};
