use rayon::prelude::*;

use crate::assets::bitmap::Bitmap;
use crate::foundation::core::{PixelSize, Point};
use crate::geometry::Projective;
use crate::render::composite::over;

/// Destination pixel bounds touched by a warp, as half-open `[x0, x1) x [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PixelBounds {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

/// Conservative canvas bounds of the warped source. Falls back to the whole canvas when a corner
/// projects behind the camera plane.
fn warped_bounds(transform: &Projective, src: PixelSize, dst: PixelSize) -> Option<PixelBounds> {
    let (sw, sh) = (f64::from(src.width), f64::from(src.height));
    let (dw, dh) = (f64::from(dst.width), f64::from(dst.height));
    let corners = [
        Point::new(0.0, 0.0),
        Point::new(sw, 0.0),
        Point::new(sw, sh),
        Point::new(0.0, sh),
    ];

    let mut min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for c in corners {
        let Some(p) = transform.map_point(c) else {
            min = Point::ZERO;
            max = Point::new(dw, dh);
            break;
        };
        min = Point::new(min.x.min(p.x), min.y.min(p.y));
        max = Point::new(max.x.max(p.x), max.y.max(p.y));
    }

    let x0 = min.x.floor().clamp(0.0, dw) as usize;
    let y0 = min.y.floor().clamp(0.0, dh) as usize;
    let x1 = max.x.ceil().clamp(0.0, dw) as usize;
    let y1 = max.y.ceil().clamp(0.0, dh) as usize;
    (x0 < x1 && y0 < y1).then_some(PixelBounds { x0, y0, x1, y1 })
}

/// Blend `src` over `dst` through `transform` (source pixel space to canvas pixel space).
///
/// Each destination pixel center is mapped back through the inverse and sampled bilinearly.
/// Returns `false` without touching `dst` when the transform is singular or the result falls
/// entirely outside the canvas.
pub(crate) fn warp_over(
    dst: &mut [u8],
    dst_size: PixelSize,
    src: &Bitmap,
    transform: &Projective,
    opacity: f32,
) -> bool {
    if src.is_empty() || dst_size.area() == 0 || dst.len() != dst_size.rgba8_len() {
        return false;
    }
    let Some(inverse) = transform.invert() else {
        return false;
    };
    let Some(bounds) = warped_bounds(transform, src.size(), dst_size) else {
        return false;
    };

    let stride = dst_size.width as usize * 4;
    dst.par_chunks_exact_mut(stride)
        .enumerate()
        .skip(bounds.y0)
        .take(bounds.y1 - bounds.y0)
        .for_each(|(y, row)| {
            let cy = y as f64 + 0.5;
            for x in bounds.x0..bounds.x1 {
                let Some(p) = inverse.map_point(Point::new(x as f64 + 0.5, cy)) else {
                    continue;
                };
                let Some(s) = src.sample_bilinear(p.x, p.y) else {
                    continue;
                };
                let px = &mut row[x * 4..x * 4 + 4];
                let out = over([px[0], px[1], px[2], px[3]], s, opacity);
                px.copy_from_slice(&out);
            }
        });
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(size: PixelSize) -> Vec<u8> {
        vec![0u8; size.rgba8_len()]
    }

    fn px(buf: &[u8], size: PixelSize, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * size.width + x) * 4) as usize;
        [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
    }

    #[test]
    fn identity_warp_copies_pixels() {
        let size = PixelSize::new(4, 3);
        let src = Bitmap::solid(size, [10, 20, 30, 255]).unwrap();
        let mut dst = canvas(size);
        assert!(warp_over(&mut dst, size, &src, &Projective::IDENTITY, 1.0));
        assert!(dst.chunks_exact(4).all(|p| p == [10, 20, 30, 255]));
    }

    #[test]
    fn translation_leaves_uncovered_pixels_untouched() {
        let size = PixelSize::new(6, 2);
        let src = Bitmap::solid(PixelSize::new(2, 2), [0, 255, 0, 255]).unwrap();
        let mut dst = canvas(size);
        assert!(warp_over(
            &mut dst,
            size,
            &src,
            &Projective::translate(3.0, 0.0),
            1.0
        ));
        assert_eq!(px(&dst, size, 0, 0), [0, 0, 0, 0]);
        assert_eq!(px(&dst, size, 3, 1), [0, 255, 0, 255]);
        assert_eq!(px(&dst, size, 4, 0), [0, 255, 0, 255]);
        assert_eq!(px(&dst, size, 5, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn singular_transform_is_skipped() {
        let size = PixelSize::new(2, 2);
        let src = Bitmap::solid(size, [255, 255, 255, 255]).unwrap();
        let mut dst = canvas(size);
        assert!(!warp_over(&mut dst, size, &src, &Projective::scale(0.0, 1.0), 1.0));
        assert!(dst.iter().all(|&b| b == 0));
    }

    #[test]
    fn offscreen_result_is_skipped() {
        let size = PixelSize::new(2, 2);
        let src = Bitmap::solid(size, [255, 255, 255, 255]).unwrap();
        let mut dst = canvas(size);
        assert!(!warp_over(
            &mut dst,
            size,
            &src,
            &Projective::translate(50.0, 0.0),
            1.0
        ));
    }
}
