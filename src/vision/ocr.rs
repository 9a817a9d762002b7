//! Tesseract-backed classifier.
//!
//! Captures are grabbed from the screen, transformed, written to a temporary
//! PNG and passed to the Tesseract command-line binary in single-line mode.

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use image::{ImageBuffer, Luma, RgbaImage};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;

use super::histogram::Histogram;
use super::preprocess::{apply_ops, to_luma};
use super::{ImageOp, VisualClassifier};
use crate::coords::Rect;
use crate::platform::{GameWindow, ScreenGrabber};

pub struct TesseractClassifier {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
    grabber: Box<dyn ScreenGrabber>,
    debug_screenshots: bool,
}

impl TesseractClassifier {
    pub fn new(executable: &Path, grabber: Box<dyn ScreenGrabber>, debug_screenshots: bool) -> Self {
        let tessdata = find_tessdata_dir(executable);
        match &tessdata {
            Some(dir) => debug!("Using tessdata at {}", dir.display()),
            None => debug!("No tessdata directory found, using Tesseract's default"),
        }

        Self {
            executable: executable.to_path_buf(),
            tessdata,
            grabber,
            debug_screenshots,
        }
    }

    fn capture(&self, window: &GameWindow, rect: Rect) -> Result<RgbaImage> {
        if rect.width <= 0 || rect.height <= 0 {
            return Err(anyhow!("Empty capture region {:?}", rect));
        }
        self.grabber.grab(
            window.rect.left + rect.x,
            window.rect.top + rect.y,
            rect.width as u32,
            rect.height as u32,
        )
    }

    fn recognize(&self, img: &ImageBuffer<Luma<u8>, Vec<u8>>) -> Result<String> {
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())?;

        let mut command = Command::new(&self.executable);
        command.arg(temp_input.path()).arg("stdout");
        if let Some(tessdata) = &self.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }
        // Single line of text
        let output = command
            .args(["-l", "eng", "--oem", "3", "--psm", "7"])
            .output()
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn save_debug_screenshot(&self, img: &RgbaImage) {
        let path = crate::paths::get_debug_dir().join(format!(
            "ocr_screenshot-{}.png",
            Local::now().format("%Y-%m-%d-%H-%M-%S-%f")
        ));
        if let Err(e) = img.save(&path) {
            warn!("Failed to save debug screenshot {}: {}", path.display(), e);
        }
    }
}

impl VisualClassifier for TesseractClassifier {
    fn ocr(&mut self, window: &GameWindow, rect: Rect, ops: &[ImageOp]) -> Result<String> {
        let img = apply_ops(self.capture(window, rect)?, ops);
        let raw = self.recognize(&to_luma(&img))?;
        let text = clean_output(&raw);

        if self.debug_screenshots {
            self.save_debug_screenshot(&img);
            debug!("OCR result: {}", text);
        }

        Ok(text)
    }

    fn histogram(&mut self, window: &GameWindow, rect: Rect) -> Result<Histogram> {
        Ok(Histogram::from_image(&self.capture(window, rect)?))
    }

    fn set_debug_screenshots(&mut self, enabled: bool) {
        if enabled {
            if let Err(e) = std::fs::create_dir_all(crate::paths::get_debug_dir()) {
                warn!("Failed to create debug directory: {}", e);
            }
        }
        self.debug_screenshots = enabled;
    }
}

/// Strips the trailing newline and form feed Tesseract emits, lowercased.
fn clean_output(raw: &str) -> String {
    raw.trim_matches(|c| c == ' ' || c == '\n' || c == '\r' || c == '\x0c')
        .to_lowercase()
}

/// Looks for `tessdata` next to the executable, then in the local data directory.
fn find_tessdata_dir(executable: &Path) -> Option<PathBuf> {
    let beside = executable.parent().map(|dir| dir.join("tessdata"));
    let local = dirs::data_local_dir().map(|dir| dir.join("auto-spectator").join("tessdata"));

    [beside, local]
        .into_iter()
        .flatten()
        .find(|dir| dir.join("eng.traineddata").exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::WindowRect;
    use image::Rgba;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct RecordingGrabber {
        calls: Rc<RefCell<Vec<(i32, i32, u32, u32)>>>,
    }

    impl ScreenGrabber for RecordingGrabber {
        fn grab(&self, x: i32, y: i32, width: u32, height: u32) -> Result<RgbaImage> {
            self.calls.borrow_mut().push((x, y, width, height));
            Ok(ImageBuffer::from_pixel(width, height, Rgba([0, 0, 77, 255])))
        }
    }

    fn window() -> GameWindow {
        GameWindow {
            handle: 1,
            title: "BF2".to_string(),
            class_name: "BF2".to_string(),
            rect: WindowRect {
                left: 5,
                top: 5,
                right: 1301,
                bottom: 764,
            },
            pid: 42,
        }
    }

    #[test]
    fn test_clean_output() {
        assert_eq!(clean_output(" Quit\n\x0c"), "quit");
        assert_eq!(clean_output("GAME MESSAGE\r\n"), "game message");
    }

    #[test]
    fn test_histogram_captures_window_relative_region() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let grabber = RecordingGrabber {
            calls: Rc::clone(&calls),
        };
        let mut classifier =
            TesseractClassifier::new(Path::new("tesseract"), Box::new(grabber), false);

        let hist = classifier
            .histogram(&window(), Rect::new(68, 69, 41, 13))
            .unwrap();

        assert_eq!(calls.borrow()[0], (73, 74, 41, 13));
        assert_eq!(hist.0[77], (41 * 13) as f32);
    }

    #[test]
    fn test_empty_region_is_an_error() {
        let grabber = RecordingGrabber {
            calls: Rc::new(RefCell::new(Vec::new())),
        };
        let mut classifier =
            TesseractClassifier::new(Path::new("tesseract"), Box::new(grabber), false);
        assert!(classifier.histogram(&window(), Rect::new(0, 0, 0, 10)).is_err());
    }
}
