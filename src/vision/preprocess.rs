use image::{ImageBuffer, Luma, Rgba, RgbaImage};

use super::ImageOp;

/// Applies the transforms in order.
pub fn apply_ops(mut img: RgbaImage, ops: &[ImageOp]) -> RgbaImage {
    for op in ops {
        match op {
            ImageOp::Invert => invert(&mut img),
            ImageOp::Solarize { threshold } => solarize(&mut img, *threshold),
        }
    }
    img
}

/// Inverts the color channels, leaving alpha untouched.
///
/// The game renders light text on dark backgrounds; Tesseract reads dark text
/// on light backgrounds far more reliably.
pub fn invert(img: &mut RgbaImage) {
    for pixel in img.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        *pixel = Rgba([255 - r, 255 - g, 255 - b, a]);
    }
}

/// Inverts channel values at or above `threshold`.
pub fn solarize(img: &mut RgbaImage, threshold: u8) {
    let flip = |v: u8| if v >= threshold { 255 - v } else { v };
    for pixel in img.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        *pixel = Rgba([flip(r), flip(g), flip(b), a]);
    }
}

/// Converts to grayscale for OCR.
pub fn to_luma(img: &RgbaImage) -> ImageBuffer<Luma<u8>, Vec<u8>> {
    image::DynamicImage::ImageRgba8(img.clone()).to_luma8()
}

/// Crops a sub-region in pixel coordinates, clamped to the image bounds.
pub fn crop(img: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let x0 = x.min(w);
    let y0 = y.min(h);
    let cw = width.min(w - x0);
    let ch = height.min(h - y0);

    image::imageops::crop_imm(img, x0, y0, cw, ch).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invert_keeps_alpha() {
        let mut img: RgbaImage = ImageBuffer::from_pixel(1, 1, Rgba([10, 200, 255, 128]));
        invert(&mut img);
        assert_eq!(*img.get_pixel(0, 0), Rgba([245, 55, 0, 128]));
    }

    #[test]
    fn test_solarize_only_flips_bright_channels() {
        let mut img: RgbaImage = ImageBuffer::from_pixel(1, 1, Rgba([100, 128, 250, 255]));
        solarize(&mut img, 128);
        assert_eq!(*img.get_pixel(0, 0), Rgba([100, 127, 5, 255]));
    }

    #[test]
    fn test_apply_ops_in_order() {
        let img: RgbaImage = ImageBuffer::from_pixel(1, 1, Rgba([20, 20, 20, 255]));
        // Invert to 235, then solarize flips it back to 20
        let out = apply_ops(img, &[ImageOp::Invert, ImageOp::Solarize { threshold: 128 }]);
        assert_eq!(*out.get_pixel(0, 0), Rgba([20, 20, 20, 255]));
    }

    #[test]
    fn test_crop_clamps() {
        let img: RgbaImage = ImageBuffer::from_fn(100, 100, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let cropped = crop(&img, 90, 80, 50, 50);
        assert_eq!(cropped.dimensions(), (10, 20));
        assert_eq!(cropped.get_pixel(0, 0)[0], 90);
        assert_eq!(cropped.get_pixel(0, 0)[1], 80);
    }
}
