use std::path::Path;

use anyhow::Context;

use crate::assets::bitmap::Bitmap;
use crate::foundation::core::PixelSize;
use crate::foundation::error::UnfurlResult;

/// Decode an encoded image (PNG, JPEG, ...) into a premultiplied [`Bitmap`].
pub fn decode_bitmap(bytes: &[u8]) -> UnfurlResult<Bitmap> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    bitmap_from_rgba_image(&dyn_img.to_rgba8())
}

/// Read and decode an image file.
pub fn load_bitmap(path: &Path) -> UnfurlResult<Bitmap> {
    let bytes = std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_bitmap(&bytes)
}

/// Convert a straight-alpha `image` buffer.
pub fn bitmap_from_rgba_image(img: &image::RgbaImage) -> UnfurlResult<Bitmap> {
    let (width, height) = img.dimensions();
    Bitmap::from_straight_rgba8(img.as_raw(), PixelSize::new(width, height))
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn decode_png_dimensions_and_premul() {
        let src_rgba = vec![100u8, 50u8, 200u8, 128u8];
        let img = image::RgbaImage::from_raw(1, 1, src_rgba).unwrap();

        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();

        let bm = decode_bitmap(&buf).unwrap();
        assert_eq!(bm.width(), 1);
        assert_eq!(bm.height(), 1);
        assert_eq!(
            bm.premul_bytes(),
            &[
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128u8
            ]
        );
    }

    #[test]
    fn decode_garbage_is_an_error() {
        assert!(decode_bitmap(b"not an image").is_err());
    }

    #[test]
    fn unpremultiply_inverts_opaque_and_clear() {
        let mut px = vec![10, 20, 30, 255, 0, 0, 0, 0];
        unpremultiply_rgba8_in_place(&mut px);
        assert_eq!(px, vec![10, 20, 30, 255, 0, 0, 0, 0]);

        let mut half = vec![50, 0, 64, 128];
        unpremultiply_rgba8_in_place(&mut half);
        assert_eq!(half[3], 128);
        assert!((i32::from(half[0]) - 100).abs() <= 1);
        assert!((i32::from(half[2]) - 128).abs() <= 1);
    }
}
