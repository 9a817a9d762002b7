//! Keyboard and mouse input via `SendInput`.
//!
//! The game reads input through DirectInput, so window messages are ignored.
//! Keys are sent as hardware scan codes and mouse moves as raw input events,
//! which requires the game window to be in the foreground.

use anyhow::{anyhow, Result};
use std::time::Duration;

use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_KEYUP, KEYEVENTF_SCANCODE, KEYEVENTF_UNICODE, MOUSEEVENTF_ABSOLUTE,
    MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MOVE, MOUSEINPUT, MOUSE_EVENT_FLAGS,
};
use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

use crate::platform::{InputSynthesizer, Key};

/// Delay between typed characters.
const TYPE_INTERVAL: Duration = Duration::from_millis(50);

pub struct SendInputSynthesizer;

impl SendInputSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

fn send(inputs: &[INPUT]) -> Result<()> {
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        return Err(anyhow!(
            "SendInput sent {} of {} inputs",
            sent,
            inputs.len()
        ));
    }
    Ok(())
}

fn keyboard_input(scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wScan: scan,
                dwFlags: flags,
                ..Default::default()
            },
        },
    }
}

fn mouse_input(dx: i32, dy: i32, flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx,
                dy,
                dwFlags: flags,
                ..Default::default()
            },
        },
    }
}

impl InputSynthesizer for SendInputSynthesizer {
    fn key_down(&mut self, key: Key) -> Result<()> {
        send(&[keyboard_input(key.scan_code(), KEYEVENTF_SCANCODE)])
    }

    fn key_up(&mut self, key: Key) -> Result<()> {
        send(&[keyboard_input(
            key.scan_code(),
            KEYEVENTF_SCANCODE | KEYEVENTF_KEYUP,
        )])
    }

    fn type_text(&mut self, text: &str) -> Result<()> {
        for unit in text.encode_utf16() {
            send(&[
                keyboard_input(unit, KEYEVENTF_UNICODE),
                keyboard_input(unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP),
            ])?;
            std::thread::sleep(TYPE_INTERVAL);
        }
        Ok(())
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        let screen_width = unsafe { GetSystemMetrics(SM_CXSCREEN) };
        let screen_height = unsafe { GetSystemMetrics(SM_CYSCREEN) };
        if screen_width <= 0 || screen_height <= 0 {
            return Err(anyhow!("Failed to read screen size"));
        }

        // Normalize to 0-65535 range (required by MOUSEEVENTF_ABSOLUTE)
        let norm_x = ((x as i64 * 65535) / screen_width as i64) as i32;
        let norm_y = ((y as i64 * 65535) / screen_height as i64) as i32;

        send(&[mouse_input(
            norm_x,
            norm_y,
            MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE,
        )])
    }

    fn move_by(&mut self, dx: i32, dy: i32) -> Result<()> {
        send(&[mouse_input(dx, dy, MOUSEEVENTF_MOVE)])
    }

    fn mouse_down(&mut self) -> Result<()> {
        send(&[mouse_input(0, 0, MOUSEEVENTF_LEFTDOWN)])
    }

    fn mouse_up(&mut self) -> Result<()> {
        send(&[mouse_input(0, 0, MOUSEEVENTF_LEFTUP)])
    }
}
