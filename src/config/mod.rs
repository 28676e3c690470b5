//! # Configuration Module
//!
//! This module provides the runtime configuration for scanning, navigation and capture.

pub mod config;

pub use config::ScanConfig;
