//! Screen region capture via GDI `BitBlt`.
//!
//! The game runs windowed and in the foreground, so copying from the screen
//! DC reads exactly what is displayed.

use anyhow::{anyhow, Result};
use image::{ImageBuffer, Rgba, RgbaImage};

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC, GetDIBits,
    ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, SRCCOPY,
};

use crate::platform::ScreenGrabber;

pub struct GdiScreenGrabber;

impl GdiScreenGrabber {
    pub fn new() -> Self {
        Self
    }
}

impl ScreenGrabber for GdiScreenGrabber {
    fn grab(&self, x: i32, y: i32, width: u32, height: u32) -> Result<RgbaImage> {
        let (w, h) = (width as i32, height as i32);
        let mut bgra: Vec<u8> = vec![0; (width * height * 4) as usize];

        unsafe {
            let screen_dc = GetDC(HWND::default());
            if screen_dc.is_invalid() {
                return Err(anyhow!("GetDC failed"));
            }
            let mem_dc = CreateCompatibleDC(screen_dc);
            let bitmap = CreateCompatibleBitmap(screen_dc, w, h);
            let previous = SelectObject(mem_dc, bitmap);

            let blit = BitBlt(mem_dc, 0, 0, w, h, screen_dc, x, y, SRCCOPY);

            let mut info = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: w,
                    // Negative height = top-down rows
                    biHeight: -h,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };
            let lines = GetDIBits(
                mem_dc,
                bitmap,
                0,
                height,
                Some(bgra.as_mut_ptr() as *mut std::ffi::c_void),
                &mut info,
                DIB_RGB_COLORS,
            );

            SelectObject(mem_dc, previous);
            let _ = DeleteObject(bitmap);
            let _ = DeleteDC(mem_dc);
            ReleaseDC(HWND::default(), screen_dc);

            blit.map_err(|e| anyhow!("BitBlt failed: {}", e))?;
            if lines != h {
                return Err(anyhow!("GetDIBits copied {} of {} lines", lines, h));
            }
        }

        // BGRA -> RGBA
        let img: RgbaImage = ImageBuffer::from_fn(width, height, |px, py| {
            let offset = ((py * width + px) * 4) as usize;
            Rgba([bgra[offset + 2], bgra[offset + 1], bgra[offset], 255])
        });
        Ok(img)
    }
}
