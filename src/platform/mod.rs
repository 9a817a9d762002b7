//! Operating-system collaborators: input synthesis, window and process
//! management, screen capture and time.
//!
//! The game only runs on Windows, so the real implementations live in
//! [`windows`]. Everything else in the crate talks to these traits.

#[cfg(windows)]
pub mod windows;

use anyhow::Result;
use chrono::{DateTime, Local};
use image::RgbaImage;
use std::path::Path;
use std::time::Duration;

/// Keys the spectator presses, sent as hardware scan codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Backspace,
    Tab,
    Enter,
    /// Toggles the developer console
    Console,
    /// Toggles freecam while dead
    Space,
    /// Cycles to the next spectated player
    NextPlayer,
}

impl Key {
    pub fn scan_code(self) -> u16 {
        match self {
            Key::Escape => 0x01,
            Key::Backspace => 0x0e,
            Key::Tab => 0x0f,
            Key::Enter => 0x1c,
            Key::Console => 0x1d,
            Key::Space => 0x39,
            Key::NextPlayer => 0x2e,
        }
    }
}

pub trait InputSynthesizer {
    fn key_down(&mut self, key: Key) -> Result<()>;

    fn key_up(&mut self, key: Key) -> Result<()>;

    /// Types text character by character.
    fn type_text(&mut self, text: &str) -> Result<()>;

    /// Moves the cursor to absolute screen coordinates.
    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;

    /// Moves the cursor relative to its current position, as raw mouse input.
    fn move_by(&mut self, dx: i32, dy: i32) -> Result<()>;

    fn mouse_down(&mut self) -> Result<()>;

    fn mouse_up(&mut self) -> Result<()>;
}

/// Outer window rectangle in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct WindowRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Snapshot of a top-level window. Re-resolve after anything that may have
/// restarted the game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameWindow {
    pub handle: isize,
    pub title: String,
    pub class_name: String,
    pub rect: WindowRect,
    pub pid: u32,
}

/// Decoration added around the client area (borders plus title bar).
const WINDOW_DECORATION: (i32, i32) = (21, 44);

impl GameWindow {
    /// Client size of a window launched at the fixed (5, 5) position.
    pub fn client_size(&self) -> (i32, i32) {
        (
            self.rect.right - WINDOW_DECORATION.0,
            self.rect.bottom - WINDOW_DECORATION.1,
        )
    }

    pub fn width(&self) -> i32 {
        self.rect.right - self.rect.left
    }

    pub fn height(&self) -> i32 {
        self.rect.bottom - self.rect.top
    }
}

pub trait GameHost {
    /// Finds the last top-level window whose title (and class, if given)
    /// contains the search strings.
    fn find_window(&mut self, title: &str, class_name: Option<&str>) -> Option<GameWindow>;

    fn bring_to_foreground(&mut self, window: &GameWindow) -> Result<()>;

    /// Whether the window still exists and its process is processing messages.
    fn is_responding(&mut self, window: &GameWindow) -> bool;

    /// Force-terminates the window's process. Returns whether it was killed.
    fn kill(&mut self, window: &GameWindow) -> bool;

    /// Full command line of a running process.
    fn command_line(&mut self, pid: u32) -> Option<String>;

    /// Starts a process that outlives this one.
    fn spawn_detached(&mut self, program: &Path, args: &[String], cwd: &Path) -> Result<()>;

    /// Runs a helper to completion, killing it once `timeout` has passed.
    fn run_with_timeout(&mut self, program: &Path, args: &[&str], timeout: Duration) -> Result<()>;
}

/// Grabs a screen region in absolute screen coordinates.
pub trait ScreenGrabber {
    fn grab(&self, x: i32, y: i32, width: u32, height: u32) -> Result<RgbaImage>;
}

pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by the OS.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
