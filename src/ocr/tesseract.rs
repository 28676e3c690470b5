// # Tesseract Backend
//
// Hands the binarized mask to `rusty_tesseract::image_to_data`, which runs
// the `tesseract` executable and returns its TSV rows already parsed.
// Word-level rows with text become `OcrToken`s.
//
// ```text
// level page_num block_num par_num line_num word_num left top width height conf text
// 5     1        1         1       1        1        12   30  58    14     91.2 Jane
// ```

use async_trait::async_trait;
use image::GrayImage;
use rusty_tesseract::{Args, Data, Image};
use scan_text::OcrToken;
use tokio::task::spawn_blocking;
use tracing::debug;

use crate::core::OcrEngine;
use crate::error::{ScanError, ScanResult};

/// Row level tesseract reports for single words.
const WORD_LEVEL: i32 = 5;

/// Recognizer backed by the `tesseract` executable.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    args: Args,
}

impl TesseractCli {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            args: Args {
                lang: language.into(),
                ..Args::default()
            },
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    async fn recognize(&mut self, mask: &GrayImage) -> ScanResult<Vec<OcrToken>> {
        let mask = mask.clone();
        let args = self.args.clone();
        spawn_blocking(move || run_tesseract(&mask, &args))
            .await
            .map_err(|e| ScanError::ocr(format!("ocr task failed: {}", e)))?
    }
}

fn run_tesseract(mask: &GrayImage, args: &Args) -> ScanResult<Vec<OcrToken>> {
    let tmp = tempfile::Builder::new()
        .prefix("friendscan-ocr-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| ScanError::io("create ocr temp file", e))?;
    mask.save_with_format(tmp.path(), image::ImageFormat::Png)
        .map_err(|e| ScanError::ocr(format!("cannot write ocr input: {}", e)))?;

    let input = Image::from_path(tmp.path())
        .map_err(|e| ScanError::ocr(format!("cannot load ocr input: {}", e)))?;
    let output = rusty_tesseract::image_to_data(&input, args).map_err(|e| {
        ScanError::ocr(format!("tesseract failed: {}", e))
            .with_recovery_suggestion("Install tesseract and the configured language data")
    })?;

    let tokens = word_tokens(&output.data);
    debug!(rows = output.data.len(), words = tokens.len(), "tesseract finished");
    Ok(tokens)
}

/// Word rows with non-blank text, as tokens. Other levels are layout rows.
pub fn word_tokens(rows: &[Data]) -> Vec<OcrToken> {
    rows.iter()
        .filter(|row| row.level == WORD_LEVEL)
        .filter_map(|row| {
            let text = row.text.trim();
            if text.is_empty() {
                return None;
            }
            Some(OcrToken {
                text: text.to_string(),
                left: row.left,
                top: row.top,
                width: row.width.max(0) as u32,
                height: row.height.max(0) as u32,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(level: i32, left: i32, top: i32, width: i32, height: i32, text: &str) -> Data {
        Data {
            level,
            page_num: 1,
            block_num: 1,
            par_num: 1,
            line_num: 1,
            word_num: 1,
            left,
            top,
            width,
            height,
            conf: 90.0,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_keeps_word_rows_only() {
        let rows = vec![
            row(1, 0, 0, 260, 700, ""),
            row(4, 12, 30, 120, 16, ""),
            row(5, 12, 30, 40, 14, "Jane"),
            row(5, 58, 32, 36, 14, "Doe"),
            row(5, 98, 32, 5, 14, " "),
            row(5, 12, 70, 30, 14, "Bob"),
        ];
        let tokens = word_tokens(&rows);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Jane", "Doe", "Bob"]);
        assert_eq!((tokens[1].left, tokens[1].top), (58, 32));
        assert_eq!((tokens[1].width, tokens[1].height), (36, 14));
    }

    #[test]
    fn test_no_rows() {
        assert!(word_tokens(&[]).is_empty());
    }

    #[test]
    fn test_negative_size_clamps_to_zero() {
        let tokens = word_tokens(&[row(5, -3, 8, -1, 12, " Amy ")]);
        assert_eq!(tokens[0].text, "Amy");
        assert_eq!(tokens[0].left, -3);
        assert_eq!(tokens[0].width, 0);
    }

    #[test]
    fn test_language_is_passed_through() {
        let engine = TesseractCli::new("deu");
        assert_eq!(engine.args.lang, "deu");
    }
}
