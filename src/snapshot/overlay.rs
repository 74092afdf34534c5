//! Time-left overlay for camera snapshots
//!
//! Draws the `MM:SS` label onto a dark band across the top of the image with
//! a built-in 3x5 bitmap font, then re-encodes as JPEG.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

use super::OverlayError;

const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;
const BAND: Rgb<u8> = Rgb([16, 16, 16]);
const INK: Rgb<u8> = Rgb([255, 255, 255]);

/// Rows of a glyph, three bits each (MSB = left column)
fn glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        _ => [0; 5],
    }
}

/// Pixel size of one glyph cell for an image of the given width
fn scale_for(width: u32) -> u32 {
    (width / 40).max(2)
}

/// Height of the label band for an image of the given width
pub fn band_height(width: u32) -> u32 {
    let scale = scale_for(width);
    GLYPH_HEIGHT * scale + 2 * scale
}

/// Draw `label` in the top-left corner of `img`
pub fn draw_label(img: &mut RgbImage, label: &str) {
    let (width, height) = img.dimensions();
    let scale = scale_for(width);
    let band = band_height(width).min(height);

    for y in 0..band {
        for x in 0..width {
            img.put_pixel(x, y, BAND);
        }
    }

    let margin = scale;
    for (i, c) in label.chars().enumerate() {
        let origin_x = margin + i as u32 * (GLYPH_WIDTH + 1) * scale;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let x0 = origin_x + col * scale;
                let y0 = margin + row as u32 * scale;
                for y in y0..y0 + scale {
                    for x in x0..x0 + scale {
                        if x < width && y < height {
                            img.put_pixel(x, y, INK);
                        }
                    }
                }
            }
        }
    }
}

/// Decode `image_bytes`, stamp `label` on it and return JPEG bytes
pub fn annotate(image_bytes: &[u8], label: &str) -> Result<Vec<u8>, OverlayError> {
    let mut img = image::load_from_memory(image_bytes)?.to_rgb8();
    draw_label(&mut img, label);

    let mut out = Vec::new();
    DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([128, 128, 128]))
    }

    #[test]
    fn test_draw_label_pixels() {
        let mut img = gray(320, 240);
        draw_label(&mut img, "00:50");

        let scale = scale_for(320);
        // Top-left cell of the first '0' is inked
        assert_eq!(*img.get_pixel(scale + 1, scale + 1), INK);
        // Centre of the first '0' is hollow
        assert_eq!(*img.get_pixel(scale + scale + 1, scale + 2 * scale + 1), BAND);
        // Right end of the band is background
        assert_eq!(*img.get_pixel(319, 1), BAND);
        // Below the band the picture is untouched
        assert_eq!(*img.get_pixel(10, band_height(320) + 5), Rgb([128, 128, 128]));
    }

    #[test]
    fn test_tiny_image_does_not_panic() {
        let mut img = gray(8, 4);
        draw_label(&mut img, "99:99");
        assert_eq!(img.dimensions(), (8, 4));
    }

    #[test]
    fn test_annotate_outputs_jpeg() {
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(gray(160, 120))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let jpeg = annotate(&png, "04:59").unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (160, 120));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            annotate(b"definitely not an image", "00:00"),
            Err(OverlayError::Image(_))
        ));
    }
}
