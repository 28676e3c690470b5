// # OCR Module
//
// Text recognition backends behind the `OcrEngine` trait. The only real
// backend runs tesseract through `rusty_tesseract` and keeps its word rows.

pub mod tesseract;

pub use tesseract::{word_tokens, TesseractCli};
