//! # Friends Index
//!
//! The name → position index, how it is built by scanning the list, and how
//! it is persisted between runs.

pub mod builder;
pub mod cache;
pub mod entry;

pub use builder::{BuildReport, IndexBuilder, MAX_ROUNDS, STALE_ROUND_LIMIT};
pub use cache::IndexCache;
pub use entry::{CaptureMetadata, FriendIndex, IndexEntry};
