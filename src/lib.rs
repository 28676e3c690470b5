//! # friendscan
//!
//! Finds and selects entries in a map app's scrollable friends list by
//! reading it with OCR, then screenshots the map for the selected entry.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `core`: screen regions, the collaborator traits and list scrolling
//! - `processing`: binarization of list captures before OCR
//! - `index`: the name index, the scanner that builds it and its cache
//! - `navigation`: query resolution and scroll-path replay
//! - `session`: the owner of index, selection and collaborators
//! - `capture`, `input`, `ocr`: real desktop backends
//! - `config`: configuration loading and validation
//! - `server`: HTTP facade with background tasks (feature `http`)
//!
//! Line grouping and name normalization live in the `scan-text` crate.
//!
//! ## Example
//!
//! ```rust,no_run
//! use friendscan::{config::ScanConfig, session::FinderSession, system_desktop};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScanConfig::load("config.json")?;
//! let desktop = system_desktop(&config);
//! let mut session = FinderSession::new(config, desktop);
//!
//! session.load_or_build().await?;
//! session.select("jane", false).await?;
//! let capture = session.capture_map(None).await?;
//! println!("saved {}", capture.filename);
//! # Ok(())
//! # }
//! ```

// Internal module imports
pub mod capture;
pub mod config;
pub mod core;
pub mod error;
pub mod index;
pub mod input;
pub mod navigation;
pub mod ocr;
pub mod processing;
#[cfg(feature = "http")]
pub mod server;
pub mod session;

/// Re-export error types for convenience
pub use error::{ErrorSeverity, ScanError, ScanResult};

/// Re-export the OCR token type shared with `scan-text`
pub use scan_text::OcrToken;

use crate::capture::SystemCapture;
use crate::config::ScanConfig;
use crate::core::Desktop;
use crate::input::SystemInput;
use crate::ocr::TesseractCli;

/// Collaborators backed by this machine's screen, pointer and tesseract.
pub fn system_desktop(config: &ScanConfig) -> Desktop {
    Desktop::new(
        SystemCapture::new(),
        SystemInput::new(),
        TesseractCli::new(config.ocr_language.clone()),
    )
}
