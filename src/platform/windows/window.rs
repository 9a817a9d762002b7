//! Top-level window discovery and focus.

use anyhow::{anyhow, Result};
use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;

use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT, TRUE};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClassNameW, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
    GetWindowThreadProcessId, IsHungAppWindow, IsWindow, SetForegroundWindow, ShowWindow, SW_SHOW,
};

use crate::platform::{GameWindow, WindowRect};

pub(crate) fn to_hwnd(handle: isize) -> HWND {
    HWND(handle as *mut std::ffi::c_void)
}

fn wide_to_string(buf: &[u16]) -> String {
    OsString::from_wide(buf).to_string_lossy().to_string()
}

unsafe fn describe_window(hwnd: HWND) -> GameWindow {
    unsafe {
        let title_len = GetWindowTextLengthW(hwnd);
        let title = if title_len > 0 {
            let mut title_buf: Vec<u16> = vec![0; (title_len + 1) as usize];
            let copied = GetWindowTextW(hwnd, &mut title_buf);
            wide_to_string(&title_buf[..copied.max(0) as usize])
        } else {
            String::new()
        };

        let mut class_buf: Vec<u16> = vec![0; 256];
        let class_len = GetClassNameW(hwnd, &mut class_buf);
        let class_name = wide_to_string(&class_buf[..class_len.max(0) as usize]);

        let mut rect = RECT::default();
        let _ = GetWindowRect(hwnd, &mut rect);

        let mut pid: u32 = 0;
        GetWindowThreadProcessId(hwnd, Some(&mut pid));

        GameWindow {
            handle: hwnd.0 as isize,
            title,
            class_name,
            rect: WindowRect {
                left: rect.left,
                top: rect.top,
                right: rect.right,
                bottom: rect.bottom,
            },
            pid,
        }
    }
}

/// Enumerates top-level windows and returns the last one matching both filters.
pub fn find_window_by_title(search_title: &str, search_class: Option<&str>) -> Option<GameWindow> {
    struct EnumData<'a> {
        title: &'a str,
        class_name: Option<&'a str>,
        found: Option<GameWindow>,
    }

    unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
        unsafe {
            let data = &mut *(lparam.0 as *mut EnumData);
            let window = describe_window(hwnd);

            if window.title.contains(data.title)
                && data
                    .class_name
                    .is_none_or(|class_name| window.class_name.contains(class_name))
            {
                data.found = Some(window);
            }

            TRUE
        }
    }

    let mut data = EnumData {
        title: search_title,
        class_name: search_class,
        found: None,
    };
    unsafe {
        let _ = EnumWindows(Some(enum_callback), LPARAM(&mut data as *mut _ as isize));
    }

    data.found
}

pub fn bring_to_foreground(window: &GameWindow) -> Result<()> {
    let hwnd = to_hwnd(window.handle);
    unsafe {
        if !IsWindow(hwnd).as_bool() {
            return Err(anyhow!("Window handle {:#x} is no longer valid", window.handle));
        }
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = SetForegroundWindow(hwnd);
    }
    Ok(())
}

/// A window counts as responding if it still exists and is not hung.
pub fn is_responding(window: &GameWindow) -> bool {
    let hwnd = to_hwnd(window.handle);
    unsafe { IsWindow(hwnd).as_bool() && !IsHungAppWindow(hwnd).as_bool() }
}
