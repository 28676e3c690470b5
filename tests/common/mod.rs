//! Common test utilities for the friendscan integration tests
//!
//! Scripted stand-ins for the three desktop collaborators. Each fake keeps
//! its observations behind an `Arc` so tests can inspect them after the
//! fake has been boxed into a `Desktop`.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{GrayImage, Rgba, RgbaImage};

use friendscan::config::ScanConfig;
use friendscan::core::{Desktop, InputDriver, OcrEngine, Region, ScreenCapture};
use friendscan::{OcrToken, ScanError, ScanResult};

pub const LIST: Region = Region {
    left: 100,
    top: 200,
    width: 40,
    height: 30,
};
pub const MAP: Region = Region {
    left: 300,
    top: 50,
    width: 24,
    height: 16,
};

/// One synthetic input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(i32, i32),
    Click(i32, i32),
    Scroll(i32),
}

/// Input driver that only records what it was asked to do.
#[derive(Clone, Default)]
pub struct RecordingInput {
    pub log: Arc<Mutex<Vec<Action>>>,
}

impl RecordingInput {
    pub fn actions(&self) -> Vec<Action> {
        self.log.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> Vec<Action> {
        self.actions()
            .into_iter()
            .filter(|a| matches!(a, Action::Click(..)))
            .collect()
    }

    pub fn scrolls(&self, amount: i32) -> usize {
        self.actions()
            .iter()
            .filter(|a| **a == Action::Scroll(amount))
            .count()
    }

    fn push(&self, action: Action) {
        self.log.lock().unwrap().push(action);
    }
}

#[async_trait]
impl InputDriver for RecordingInput {
    async fn move_pointer(&mut self, x: i32, y: i32) -> ScanResult<()> {
        self.push(Action::Move(x, y));
        Ok(())
    }

    async fn click(&mut self, x: i32, y: i32) -> ScanResult<()> {
        self.push(Action::Click(x, y));
        Ok(())
    }

    async fn scroll(&mut self, amount: i32) -> ScanResult<()> {
        self.push(Action::Scroll(amount));
        Ok(())
    }
}

/// Capture returning a white image the size of the requested region.
#[derive(Clone, Default)]
pub struct BlankCapture {
    pub calls: Arc<AtomicUsize>,
    pub regions: Arc<Mutex<Vec<Region>>>,
}

impl BlankCapture {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScreenCapture for BlankCapture {
    async fn capture_region(&mut self, region: Region) -> ScanResult<RgbaImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.regions.lock().unwrap().push(region);
        Ok(RgbaImage::from_pixel(
            region.width,
            region.height,
            Rgba([255, 255, 255, 255]),
        ))
    }
}

/// One scripted OCR result.
pub type Round = Result<Vec<OcrToken>, String>;

/// OCR returning scripted rounds in order, then nothing.
#[derive(Clone, Default)]
pub struct ScriptedOcr {
    rounds: Arc<Mutex<VecDeque<Round>>>,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedOcr {
    pub fn new(rounds: Vec<Round>) -> Self {
        Self {
            rounds: Arc::new(Mutex::new(rounds.into())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue more rounds, e.g. for a second build.
    pub fn push_rounds(&self, rounds: Vec<Round>) {
        self.rounds.lock().unwrap().extend(rounds);
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for ScriptedOcr {
    async fn recognize(&mut self, _mask: &GrayImage) -> ScanResult<Vec<OcrToken>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.rounds.lock().unwrap().pop_front() {
            Some(Ok(tokens)) => Ok(tokens),
            Some(Err(reason)) => Err(ScanError::ocr(reason)),
            None => Ok(Vec::new()),
        }
    }
}

/// Handles onto the fakes inside a [`Desktop`].
pub struct Probe {
    pub capture: BlankCapture,
    pub input: RecordingInput,
    pub ocr: ScriptedOcr,
}

pub fn fake_desktop(rounds: Vec<Round>) -> (Desktop, Probe) {
    let probe = Probe {
        capture: BlankCapture::default(),
        input: RecordingInput::default(),
        ocr: ScriptedOcr::new(rounds),
    };
    let desktop = Desktop::new(
        probe.capture.clone(),
        probe.input.clone(),
        probe.ocr.clone(),
    );
    (desktop, probe)
}

/// A round with one entry per `(text, top)` line, single token each.
pub fn lines(entries: &[(&str, i32)]) -> Round {
    Ok(entries
        .iter()
        .map(|(text, top)| OcrToken::new(*text, 4, *top))
        .collect())
}

/// Configuration pointing every path into `dir`, with no settle waits.
pub fn test_config(dir: &Path) -> ScanConfig {
    ScanConfig {
        friends_list_region: Some(LIST),
        map_region: Some(MAP),
        map_load_delay: 0.0,
        scroll_wait: 0.0,
        screenshot_dir: dir.join("screenshots").to_string_lossy().into_owned(),
        cache_file: dir.join("friends_index.json").to_string_lossy().into_owned(),
        ..ScanConfig::default()
    }
}

/// The four-round scan: two names, one more, then two stale rounds.
pub fn four_round_scan() -> Vec<Round> {
    vec![
        Ok(vec![
            OcrToken::new("Jane", 4, 10),
            OcrToken::new("Doe", 40, 11),
            OcrToken::new("Bob", 4, 50),
        ]),
        lines(&[("Bob", 10), ("Carl (Work)", 50)]),
        lines(&[("Carl", 10)]),
        lines(&[("Carl", 10)]),
    ]
}
