// SPDX-License-Identifier: MIT
//! # Line Reconstruction
//!
//! OCR engines report individual words. A list entry such as "John Doe"
//! arrives as two tokens whose `top` coordinates differ by a pixel or two.
//! [`LineReconstructor`] folds a token stream into logical lines using a
//! small explicit state machine: a buffer of words for the line being
//! built, plus the vertical position of the last word accepted.
//!
//! A word joins the current line when its `top` is strictly less than
//! [`LINE_TOLERANCE`] pixels away from the previous word's `top`.
//! Otherwise the buffered line is emitted and a new one begins.
//!
//! The reconstructor is a one-shot iterator over a single OCR result; it
//! cannot be restarted.

use crate::OcrToken;

/// Maximum vertical distance (exclusive) between consecutive words of one line.
pub const LINE_TOLERANCE: i32 = 12;

/// One reconstructed text line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawLine {
    /// Words of the line joined by single spaces.
    pub text: String,
    /// `top` of the first word on the line, relative to the OCR'd image.
    pub top: i32,
}

/// Lazily groups OCR tokens into [`RawLine`]s.
pub struct LineReconstructor<I> {
    tokens: I,
    words: Vec<String>,
    line_top: i32,
    last_top: Option<i32>,
    finished: bool,
}

impl<I> LineReconstructor<I>
where
    I: Iterator<Item = OcrToken>,
{
    pub fn new(tokens: I) -> Self {
        Self {
            tokens,
            words: Vec::new(),
            line_top: 0,
            last_top: None,
            finished: false,
        }
    }

    /// Emit the buffered line, if any, leaving the buffer empty.
    fn flush(&mut self) -> Option<RawLine> {
        if self.words.is_empty() {
            return None;
        }
        let text = self.words.join(" ");
        self.words.clear();
        Some(RawLine {
            text,
            top: self.line_top,
        })
    }
}

impl<I> Iterator for LineReconstructor<I>
where
    I: Iterator<Item = OcrToken>,
{
    type Item = RawLine;

    fn next(&mut self) -> Option<RawLine> {
        if self.finished {
            return None;
        }

        while let Some(token) = self.tokens.next() {
            let word = token.text.trim();
            if word.is_empty() {
                continue;
            }

            let same_line = self
                .last_top
                .is_some_and(|last| (token.top - last).abs() < LINE_TOLERANCE);
            self.last_top = Some(token.top);

            if same_line {
                self.words.push(word.to_string());
                continue;
            }

            let completed = self.flush();
            self.line_top = token.top;
            self.words.push(word.to_string());
            if completed.is_some() {
                return completed;
            }
        }

        self.finished = true;
        self.flush()
    }
}

/// Convenience constructor accepting anything iterable.
pub fn reconstruct_lines<T>(tokens: T) -> LineReconstructor<T::IntoIter>
where
    T: IntoIterator<Item = OcrToken>,
{
    LineReconstructor::new(tokens.into_iter())
}
