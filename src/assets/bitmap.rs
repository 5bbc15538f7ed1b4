use std::sync::Arc;

use crate::assets::decode::premultiply_rgba8_in_place;
use crate::foundation::core::PixelSize;
use crate::foundation::error::{UnfurlError, UnfurlResult};

/// Immutable premultiplied RGBA8 bitmap, cheap to clone.
///
/// Backed by a `vello_cpu` pixmap so it can be used directly as an image paint.
#[derive(Clone)]
pub struct Bitmap {
    size: PixelSize,
    pixmap: Arc<vello_cpu::Pixmap>,
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.size.width)
            .field("height", &self.size.height)
            .finish()
    }
}

impl Bitmap {
    /// Wrap tightly packed, row-major premultiplied RGBA8 bytes.
    pub fn from_premul_rgba8(data: &[u8], size: PixelSize) -> UnfurlResult<Self> {
        let (w, h) = size.to_u16()?;
        if data.len() != size.rgba8_len() {
            return Err(UnfurlError::validation(format!(
                "bitmap byte length {} does not match {}x{}",
                data.len(),
                size.width,
                size.height
            )));
        }

        let mut may_have_opacities = false;
        let mut pixels = Vec::with_capacity(size.area());
        for px in data.chunks_exact(4) {
            let a = px[3];
            may_have_opacities |= a != 255;
            pixels.push(vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a,
            });
        }

        Ok(Self {
            size,
            pixmap: Arc::new(vello_cpu::Pixmap::from_parts_with_opacity(
                pixels,
                w,
                h,
                may_have_opacities,
            )),
        })
    }

    /// Wrap straight-alpha RGBA8 bytes, premultiplying them first.
    pub fn from_straight_rgba8(data: &[u8], size: PixelSize) -> UnfurlResult<Self> {
        let mut premul = data.to_vec();
        premultiply_rgba8_in_place(&mut premul);
        Self::from_premul_rgba8(&premul, size)
    }

    /// Single-color bitmap from a straight-alpha color.
    pub fn solid(size: PixelSize, rgba: [u8; 4]) -> UnfurlResult<Self> {
        let data = rgba.repeat(size.area());
        Self::from_straight_rgba8(&data, size)
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn is_empty(&self) -> bool {
        self.size.area() == 0
    }

    /// Premultiplied RGBA8 bytes, row-major.
    pub fn premul_bytes(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let idx = ((y as usize) * (self.size.width as usize) + (x as usize)) * 4;
        let d = self.premul_bytes();
        Some([d[idx], d[idx + 1], d[idx + 2], d[idx + 3]])
    }

    /// Copy out the `width x height` region whose top-left corner is `(x, y)`.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> UnfurlResult<Self> {
        let fits_x = x.checked_add(width).is_some_and(|r| r <= self.size.width);
        let fits_y = y.checked_add(height).is_some_and(|b| b <= self.size.height);
        if !fits_x || !fits_y {
            return Err(UnfurlError::validation(format!(
                "crop {width}x{height}+{x}+{y} exceeds bitmap {}x{}",
                self.size.width, self.size.height
            )));
        }

        let src = self.premul_bytes();
        let stride = self.size.width as usize * 4;
        let row_len = width as usize * 4;
        let mut out = Vec::with_capacity(row_len * height as usize);
        for row in y..y + height {
            let start = row as usize * stride + x as usize * 4;
            out.extend_from_slice(&src[start..start + row_len]);
        }
        Self::from_premul_rgba8(&out, PixelSize::new(width, height))
    }

    /// Split at `floor(width / 2)`; the right half takes the remainder.
    pub fn split_vertical(&self) -> UnfurlResult<(Self, Self)> {
        self.split_at_column(self.size.width / 2)
    }

    /// Split at `floor(width * fraction)`, with `fraction` clamped to `[0, 1]`.
    pub fn split_at_fraction(&self, fraction: f64) -> UnfurlResult<(Self, Self)> {
        let f = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.5
        };
        let column = (f64::from(self.size.width) * f).floor() as u32;
        self.split_at_column(column.min(self.size.width))
    }

    fn split_at_column(&self, column: u32) -> UnfurlResult<(Self, Self)> {
        let h = self.size.height;
        let left = self.crop(0, 0, column, h)?;
        let right = self.crop(column, 0, self.size.width - column, h)?;
        Ok((left, right))
    }

    /// Bilinear sample at continuous pixel coordinates (pixel centers at `i + 0.5`).
    ///
    /// Returns `None` outside the bitmap; neighbors past the border clamp to the edge texel.
    pub(crate) fn sample_bilinear(&self, x: f64, y: f64) -> Option<[u8; 4]> {
        let (w, h) = (f64::from(self.size.width), f64::from(self.size.height));
        if !(x >= 0.0 && y >= 0.0 && x < w && y < h) {
            return None;
        }

        let fx = (x - 0.5).max(0.0);
        let fy = (y - 0.5).max(0.0);
        let x0 = (fx.floor() as u32).min(self.size.width - 1);
        let y0 = (fy.floor() as u32).min(self.size.height - 1);
        let x1 = (x0 + 1).min(self.size.width - 1);
        let y1 = (y0 + 1).min(self.size.height - 1);
        let tx = (fx - f64::from(x0)).clamp(0.0, 1.0);
        let ty = (fy - f64::from(y0)).clamp(0.0, 1.0);

        let p00 = self.pixel(x0, y0)?;
        let p10 = self.pixel(x1, y0)?;
        let p01 = self.pixel(x0, y1)?;
        let p11 = self.pixel(x1, y1)?;

        let mut out = [0u8; 4];
        for c in 0..4 {
            let top = f64::from(p00[c]) + (f64::from(p10[c]) - f64::from(p00[c])) * tx;
            let bottom = f64::from(p01[c]) + (f64::from(p11[c]) - f64::from(p01[c])) * tx;
            out[c] = (top + (bottom - top) * ty).round().clamp(0.0, 255.0) as u8;
        }
        Some(out)
    }

    pub(crate) fn paint(&self) -> vello_cpu::Image {
        vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(self.pixmap.clone()),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        }
    }
}
