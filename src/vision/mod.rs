//! Visual classification of game window regions.
//!
//! The game exposes no API, so every state probe is either an OCR read of a
//! screen region or a histogram comparison against a stored reference crop.

pub mod histogram;
pub mod mapname;
pub mod ocr;
pub mod preprocess;
pub mod similarity;

use anyhow::Result;

use crate::coords::Rect;
use crate::platform::GameWindow;

pub use histogram::{Histogram, ReferenceHistograms};
pub use ocr::TesseractClassifier;

/// Elementary transforms applied to a capture before OCR.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageOp {
    Invert,
    /// Inverts every channel value at or above the threshold.
    Solarize { threshold: u8 },
}

/// Screen-region classifier.
///
/// Rectangles are relative to the window's top-left corner. OCR results are
/// trimmed and lowercased.
pub trait VisualClassifier {
    fn ocr(&mut self, window: &GameWindow, rect: Rect, ops: &[ImageOp]) -> Result<String>;

    fn histogram(&mut self, window: &GameWindow, rect: Rect) -> Result<Histogram>;

    /// Enables persisting every OCR capture to the debug directory.
    fn set_debug_screenshots(&mut self, enabled: bool);
}
