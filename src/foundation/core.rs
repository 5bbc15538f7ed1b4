use crate::foundation::error::{UnfurlError, UnfurlResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Size, Vec2};

/// Integer pixel dimensions of a bitmap or drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelSize {
    /// Create a size; zero dimensions are allowed (split halves of 1px-wide bitmaps).
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels covered.
    pub fn area(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Byte length of a tightly packed RGBA8 buffer of this size.
    pub fn rgba8_len(self) -> usize {
        self.area().saturating_mul(4)
    }

    /// Floating-point size, for geometry.
    pub fn to_size(self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// Return the size as `u16` dimensions, as required by `vello_cpu` pixmaps.
    pub(crate) fn to_u16(self) -> UnfurlResult<(u16, u16)> {
        let w: u16 = self
            .width
            .try_into()
            .map_err(|_| UnfurlError::render("pixmap width exceeds u16"))?;
        let h: u16 = self
            .height
            .try_into()
            .map_err(|_| UnfurlError::render("pixmap height exceeds u16"))?;
        Ok((w, h))
    }
}

/// Round a container dimension given in (possibly fractional) pixels to a surface size.
pub(crate) fn container_pixels(width: f64, height: f64) -> PixelSize {
    PixelSize::new(
        width.max(0.0).round() as u32,
        height.max(0.0).round() as u32,
    )
}
