//! # Error Handling
//!
//! Every core operation returns a [`ScanResult`]. Failures are described by
//! [`ScanError`], a flat enum whose variants follow the failure taxonomy of
//! the indexing and navigation engine, each carrying an [`ErrorContext`]
//! with when/where metadata.
//!
//! ## Classification
//!
//! - `Capture`, `Ocr`, `Input`, `Timeout`: the on-screen scroll position can
//!   no longer be trusted; the next build or navigation re-anchors to the top
//!   of the list before replaying any recorded offsets.
//! - `CacheCorrupt`: recovered locally by treating the cache as absent.
//! - `NavigationTargetMissing`: reported to the caller, nothing was mutated.
//! - `Config`: startup-fatal.
//!
//! The core never retries; retry policy belongs to whoever calls it.
//!
//! ## Usage
//!
//! ```rust
//! use friendscan::error::{ScanError, classify};
//!
//! let error = ScanError::ocr("tesseract exited with status 1")
//!     .with_operation("build_index")
//!     .with_recovery_suggestion("Check that tesseract is installed and on PATH");
//!
//! assert_eq!(error.category(), "ocr");
//! assert!(classify::requires_reanchor(&error));
//! ```

use std::{error::Error as StdError, fmt, time::SystemTime};

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Recovered locally
    Warning,
    /// The in-progress operation failed
    Error,
    /// The process cannot continue
    Fatal,
}

/// Metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// When the error occurred
    pub timestamp: SystemTime,
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// Additional context about the error
    pub context: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
    /// Additional metadata as key-value pairs
    pub metadata: std::collections::HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            context: None,
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
            metadata: std::collections::HashMap::new(),
        }
    }
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }
}

/// Errors produced by the indexing and navigation engine
#[derive(Debug)]
pub enum ScanError {
    /// Region invalid or the capture primitive failed
    Capture {
        reason: String,
        context: ErrorContext,
    },
    /// The OCR primitive failed
    Ocr {
        reason: String,
        context: ErrorContext,
    },
    /// Synthetic pointer or scroll input could not be delivered
    Input {
        action: String,
        reason: String,
        context: ErrorContext,
    },
    /// The persisted index could not be read or parsed
    CacheCorrupt {
        path: String,
        reason: String,
        context: ErrorContext,
    },
    /// Resolve or navigate named a key the index does not contain
    NavigationTargetMissing {
        query: String,
        context: ErrorContext,
    },
    /// An orchestration-level deadline elapsed
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },
    /// Configuration is missing or invalid
    Config {
        field: String,
        reason: String,
        context: ErrorContext,
    },
    /// I/O errors
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
        context: ErrorContext,
    },
    /// External library errors
    External {
        library: String,
        source: Box<dyn StdError + Send + Sync>,
        context: ErrorContext,
    },
}

impl ScanError {
    /// Create a capture error
    pub fn capture(reason: impl Into<String>) -> Self {
        Self::Capture {
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an OCR error
    pub fn ocr(reason: impl Into<String>) -> Self {
        Self::Ocr {
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an input error
    pub fn input(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Input {
            action: action.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a cache-corrupt error
    pub fn cache_corrupt(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CacheCorrupt {
            path: path.into(),
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Warning),
        }
    }

    /// Create a missing-target error
    pub fn target_missing(query: impl Into<String>) -> Self {
        Self::NavigationTargetMissing {
            query: query.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration_ms,
            context: ErrorContext::new(),
        }
    }

    /// Create a configuration error
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Fatal),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error that names the file involved
    pub fn io_at(
        operation: impl Into<String>,
        path: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: Some(path.into()),
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create an external library error
    pub fn external(
        library: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            library: library.into(),
            source: Box::new(source),
            context: ErrorContext::new(),
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add operation context
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Add recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Set severity
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.context_mut().severity = severity;
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_mut().metadata.insert(key.into(), value.into());
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Capture { context, .. } => context,
            Self::Ocr { context, .. } => context,
            Self::Input { context, .. } => context,
            Self::CacheCorrupt { context, .. } => context,
            Self::NavigationTargetMissing { context, .. } => context,
            Self::Timeout { context, .. } => context,
            Self::Config { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::External { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Capture { context, .. } => context,
            Self::Ocr { context, .. } => context,
            Self::Input { context, .. } => context,
            Self::CacheCorrupt { context, .. } => context,
            Self::NavigationTargetMissing { context, .. } => context,
            Self::Timeout { context, .. } => context,
            Self::Config { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::External { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Capture { .. } => "capture",
            Self::Ocr { .. } => "ocr",
            Self::Input { .. } => "input",
            Self::CacheCorrupt { .. } => "cache_corrupt",
            Self::NavigationTargetMissing { .. } => "navigation_target_missing",
            Self::Timeout { .. } => "timeout",
            Self::Config { .. } => "config",
            Self::Io { .. } => "io",
            Self::External { .. } => "external",
        }
    }

    /// Get the error severity
    pub fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }

    /// Get the recovery suggestion, if one was attached
    pub fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Capture { reason, .. } => write!(f, "Screen capture failed: {}", reason),
            ScanError::Ocr { reason, .. } => write!(f, "OCR failed: {}", reason),
            ScanError::Input { action, reason, .. } => {
                write!(f, "Synthetic input '{}' failed: {}", action, reason)
            }
            ScanError::CacheCorrupt { path, reason, .. } => {
                write!(f, "Index cache '{}' is unusable: {}", path, reason)
            }
            ScanError::NavigationTargetMissing { query, .. } => {
                write!(f, "No indexed entry matches '{}'", query)
            }
            ScanError::Timeout {
                operation,
                duration_ms,
                ..
            } => write!(f, "Timeout during {} after {}ms", operation, duration_ms),
            ScanError::Config { field, reason, .. } => {
                write!(f, "Configuration error in '{}': {}", field, reason)
            }
            ScanError::Io {
                operation,
                path,
                source,
                ..
            } => {
                if let Some(path) = path {
                    write!(f, "I/O error during {} on '{}': {}", operation, path, source)
                } else {
                    write!(f, "I/O error during {}: {}", operation, source)
                }
            }
            ScanError::External {
                library, source, ..
            } => write!(f, "External library error in {}: {}", library, source),
        }
    }
}

impl StdError for ScanError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::External { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type ScanResult<T> = Result<T, ScanError>;

/// Error classification utilities
pub mod classify {
    use super::*;

    /// The failure may have left the list scrolled to an unknown position.
    pub fn requires_reanchor(error: &ScanError) -> bool {
        matches!(
            error,
            ScanError::Capture { .. }
                | ScanError::Ocr { .. }
                | ScanError::Input { .. }
                | ScanError::Timeout { .. }
        )
    }
}

impl From<std::io::Error> for ScanError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(error: serde_json::Error) -> Self {
        Self::external("serde_json", error)
    }
}

impl From<image::ImageError> for ScanError {
    fn from(error: image::ImageError) -> Self {
        Self::external("image", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = ScanError::config("map_region", "must be set");
        assert_eq!(error.category(), "config");
        assert_eq!(error.severity(), ErrorSeverity::Fatal);
        assert_eq!(
            error.to_string(),
            "Configuration error in 'map_region': must be set"
        );
    }

    #[test]
    fn test_error_with_context() {
        let error = ScanError::capture("region has zero width")
            .with_context("capturing friends list")
            .with_operation("build_index")
            .with_metadata("round", "3")
            .with_recovery_suggestion("re-run setup to pick the list region");

        assert_eq!(error.category(), "capture");
        assert_eq!(error.context().operation.as_deref(), Some("build_index"));
        assert_eq!(error.context().metadata.get("round").map(String::as_str), Some("3"));
        assert_eq!(
            error.recovery_suggestion(),
            Some("re-run setup to pick the list region")
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(classify::requires_reanchor(&ScanError::ocr("boom")));
        assert!(classify::requires_reanchor(&ScanError::input("scroll", "no xdotool")));
        assert!(classify::requires_reanchor(&ScanError::timeout("sync", 30_000)));
        assert!(!classify::requires_reanchor(&ScanError::target_missing("bob")));

        let corrupt = ScanError::cache_corrupt("friends_index.json", "missing friends_index");
        assert!(!classify::requires_reanchor(&corrupt));
        assert_eq!(corrupt.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_io_source_is_preserved() {
        let error = ScanError::io_at(
            "read cache",
            "friends_index.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(error.source().is_some());
        assert!(error.to_string().contains("friends_index.json"));
    }
}
