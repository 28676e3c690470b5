//! # Configuration Module
//!
//! Runtime settings for list scanning, navigation and map capture, read from
//! a JSON file (by default `config.json` in the working directory).
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Default | Description |
//! |-----------|------|---------|-------------|
//! | `friends_list_region` | `[l, t, w, h]` | unset | Name column of the friends list |
//! | `map_region` | `[l, t, w, h]` | unset | Map area captured after selection |
//! | `index_stale_time` | seconds | 14400 | Cached index age before a rebuild |
//! | `ocr_language` | string | `eng` | Tesseract language code |
//! | `map_load_delay` | seconds | 4.0 | Wait after clicking an entry |
//! | `scroll_wait` | seconds | 0.1 | Wait after each scroll pulse |
//! | `screenshot_dir` | path | `screenshots` | Where map captures are written |
//! | `filename_format` | string | `{name}_{timestamp}.png` | Capture file name template |
//! | `cache_file` | path | `friends_index.json` | Persisted index snapshot |
//!
//! ## Examples
//!
//! ```rust
//! use friendscan::config::ScanConfig;
//! use friendscan::core::Region;
//!
//! let mut config = ScanConfig::default();
//! assert!(config.validate().is_err()); // regions are not set yet
//!
//! config.friends_list_region = Some(Region::new(40, 120, 260, 700));
//! config.map_region = Some(Region::new(320, 80, 1200, 800));
//! assert!(config.validate().is_ok());
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::Region;
use crate::error::{ScanError, ScanResult};

/// Settings shared by every scan, navigation and capture operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Region holding the list's name column.
    ///
    /// Only the text should be inside it: avatars and badges confuse OCR.
    pub friends_list_region: Option<Region>,

    /// Region captured as the map screenshot.
    pub map_region: Option<Region>,

    /// Maximum age in seconds of a cached index before it is rebuilt.
    pub index_stale_time: u64,

    /// Tesseract language code.
    pub ocr_language: String,

    /// Seconds to wait after selecting an entry for the map to redraw.
    pub map_load_delay: f64,

    /// Seconds to wait after each scroll pulse.
    pub scroll_wait: f64,

    /// Directory receiving map screenshots.
    pub screenshot_dir: String,

    /// Screenshot file name template; `{name}` and `{timestamp}` are substituted.
    pub filename_format: String,

    /// Location of the persisted index snapshot.
    pub cache_file: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            friends_list_region: None,
            map_region: None,
            index_stale_time: 4 * 60 * 60,
            ocr_language: "eng".to_string(),
            map_load_delay: 4.0,
            scroll_wait: 0.1,
            screenshot_dir: "screenshots".to_string(),
            filename_format: "{name}_{timestamp}.png".to_string(),
            cache_file: "friends_index.json".to_string(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults (with a warning) so that read-only
    /// commands still work before setup. A file that exists but cannot be
    /// parsed is a configuration error.
    pub fn load(path: impl AsRef<Path>) -> ScanResult<Self> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "no config file found, using defaults");
                return Ok(Self::default());
            }
            Err(err) => return Err(ScanError::io_at("read config", path.display().to_string(), err)),
        };
        serde_json::from_str(&raw).map_err(|err| {
            ScanError::config(path.display().to_string(), err.to_string())
                .with_recovery_suggestion("Fix or delete the config file and re-run setup")
        })
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> ScanResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|err| ScanError::io_at("write config", path.display().to_string(), err))
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), String> {
        match self.friends_list_region {
            None => return Err("friends_list_region must be set".to_string()),
            Some(region) if region.is_empty() => {
                return Err("friends_list_region must have a non-zero size".to_string());
            }
            _ => {}
        }
        match self.map_region {
            None => return Err("map_region must be set".to_string()),
            Some(region) if region.is_empty() => {
                return Err("map_region must have a non-zero size".to_string());
            }
            _ => {}
        }
        if !self.map_load_delay.is_finite() || self.map_load_delay < 0.0 {
            return Err("map_load_delay must be a non-negative number of seconds".to_string());
        }
        if !self.scroll_wait.is_finite() || self.scroll_wait < 0.0 {
            return Err("scroll_wait must be a non-negative number of seconds".to_string());
        }
        if !self.filename_format.contains("{name}") && !self.filename_format.contains("{timestamp}")
        {
            return Err("filename_format must contain {name} or {timestamp}".to_string());
        }
        Ok(())
    }

    /// The list region, or a configuration error naming the missing field.
    pub fn list_region(&self) -> ScanResult<Region> {
        self.friends_list_region
            .ok_or_else(|| ScanError::config("friends_list_region", "not configured"))
    }

    /// The map region, or a configuration error naming the missing field.
    pub fn map_region(&self) -> ScanResult<Region> {
        self.map_region
            .ok_or_else(|| ScanError::config("map_region", "not configured"))
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_secs_f64(self.scroll_wait.max(0.0))
    }

    pub fn map_settle(&self) -> Duration {
        Duration::from_secs_f64(self.map_load_delay.max(0.0))
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.index_stale_time)
    }

    pub fn screenshot_path(&self) -> PathBuf {
        PathBuf::from(&self.screenshot_dir)
    }

    pub fn cache_path(&self) -> PathBuf {
        PathBuf::from(&self.cache_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> ScanConfig {
        ScanConfig {
            friends_list_region: Some(Region::new(0, 0, 200, 600)),
            map_region: Some(Region::new(220, 0, 800, 600)),
            ..ScanConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.index_stale_time, 14400);
        assert_eq!(config.ocr_language, "eng");
        assert_eq!(config.filename_format, "{name}_{timestamp}.png");
        assert_eq!(config.map_settle(), Duration::from_secs(4));
        assert!(config.friends_list_region.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = configured();
        assert!(config.validate().is_ok());

        config.map_region = Some(Region::new(0, 0, 0, 100));
        assert!(config.validate().is_err());
        config.map_region = Some(Region::new(220, 0, 800, 600));

        config.scroll_wait = -1.0;
        assert!(config.validate().is_err());
        config.scroll_wait = 0.0;

        config.filename_format = "capture.png".to_string();
        assert!(config.validate().is_err());
        config.filename_format = "{timestamp}".to_string();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig::load(dir.path().join("config.json")).unwrap();
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"friends_list_region": [10, 20, 300, 500], "map_load_delay": 2.5}"#,
        )
        .unwrap();

        let config = ScanConfig::load(&path).unwrap();
        assert_eq!(config.friends_list_region, Some(Region::new(10, 20, 300, 500)));
        assert_eq!(config.map_load_delay, 2.5);
        assert_eq!(config.screenshot_dir, "screenshots");
    }

    #[test]
    fn test_load_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = ScanConfig::load(&path).unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = configured();
        config.save(&path).unwrap();
        assert_eq!(ScanConfig::load(&path).unwrap(), config);
    }
}
