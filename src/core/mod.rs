//! # Core Types
//!
//! Screen geometry, the collaborator traits the engine is written against,
//! and the scroll primitives shared by index builds and navigation.

pub mod list;
pub mod ports;
pub mod region;

pub use list::ListControls;
pub use ports::{Desktop, InputDriver, OcrEngine, ScreenCapture};
pub use region::Region;
