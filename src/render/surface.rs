use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::assets::bitmap::Bitmap;
use crate::assets::decode::unpremultiply_rgba8_in_place;
use crate::foundation::core::PixelSize;
use crate::foundation::error::{UnfurlError, UnfurlResult};

/// A drawable frame: a premultiplied RGBA8 canvas handed out by a [`SurfaceProvider`].
pub struct FrameSurface {
    size: PixelSize,
    pixmap: vello_cpu::Pixmap,
}

impl std::fmt::Debug for FrameSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSurface")
            .field("width", &self.size.width)
            .field("height", &self.size.height)
            .finish()
    }
}

impl FrameSurface {
    /// Allocate a transparent canvas.
    pub fn new(size: PixelSize) -> UnfurlResult<Self> {
        let (w, h) = size.to_u16()?;
        Ok(Self {
            size,
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        self.pixmap.data_as_u8_slice_mut().fill(0);
    }

    /// Premultiplied RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_as_u8_slice_mut()
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let i = ((y as usize) * (self.size.width as usize) + (x as usize)) * 4;
        let d = self.data();
        Some([d[i], d[i + 1], d[i + 2], d[i + 3]])
    }

    /// Snapshot as an immutable bitmap.
    pub fn to_bitmap(&self) -> UnfurlResult<Bitmap> {
        Bitmap::from_premul_rgba8(self.data(), self.size)
    }

    /// Straight-alpha copy for encoding.
    pub fn to_rgba_image(&self) -> UnfurlResult<image::RgbaImage> {
        let mut bytes = self.data().to_vec();
        unpremultiply_rgba8_in_place(&mut bytes);
        image::RgbaImage::from_raw(self.size.width, self.size.height, bytes)
            .ok_or_else(|| UnfurlError::render("frame buffer does not match its dimensions"))
    }

    pub fn save_png(&self, path: &Path) -> UnfurlResult<()> {
        self.to_rgba_image()?
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| UnfurlError::render(format!("write '{}': {e}", path.display())))
    }
}

/// Lockable drawing target, in the manner of a platform surface holder.
///
/// `acquire` never blocks; `None` means the surface is not ready and the caller retries on its
/// next iteration. Every acquired frame must be handed back through `present`.
pub trait SurfaceProvider: Send + Sync {
    fn acquire(&self) -> Option<FrameSurface>;

    fn present(&self, frame: FrameSurface);
}

#[derive(Default)]
struct OffscreenState {
    spare: Option<FrameSurface>,
    last: Option<Bitmap>,
}

/// In-memory surface that keeps the most recently presented frame.
///
/// Availability can be toggled to exercise the "surface not ready" path.
pub struct OffscreenSurface {
    size: PixelSize,
    available: AtomicBool,
    acquired: AtomicU64,
    presented: AtomicU64,
    state: Mutex<OffscreenState>,
}

impl OffscreenSurface {
    pub fn new(size: PixelSize) -> Self {
        Self {
            size,
            available: AtomicBool::new(true),
            acquired: AtomicU64::new(0),
            presented: AtomicU64::new(0),
            state: Mutex::new(OffscreenState::default()),
        }
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    pub fn acquired_count(&self) -> u64 {
        self.acquired.load(Ordering::Acquire)
    }

    pub fn presented_count(&self) -> u64 {
        self.presented.load(Ordering::Acquire)
    }

    /// Copy of the last presented frame.
    pub fn last_frame(&self) -> Option<Bitmap> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last
            .clone()
    }
}

impl SurfaceProvider for OffscreenSurface {
    fn acquire(&self) -> Option<FrameSurface> {
        if !self.available.load(Ordering::Acquire) {
            return None;
        }
        let spare = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .spare
            .take();
        let frame = match spare {
            Some(frame) => frame,
            None => match FrameSurface::new(self.size) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::debug!(error = %e, "offscreen surface unavailable");
                    return None;
                }
            },
        };
        self.acquired.fetch_add(1, Ordering::AcqRel);
        Some(frame)
    }

    fn present(&self, frame: FrameSurface) {
        let snapshot = frame.to_bitmap();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match snapshot {
            Ok(bm) => state.last = Some(bm),
            Err(e) => tracing::debug!(error = %e, "could not keep presented frame"),
        }
        state.spare = Some(frame);
        self.presented.fetch_add(1, Ordering::AcqRel);
    }
}

/// Surface that writes every presented frame to `dir/frame_NNNNN.png`.
pub struct PngSequenceSurface {
    size: PixelSize,
    dir: PathBuf,
    next_index: AtomicU64,
    failures: AtomicU64,
}

impl PngSequenceSurface {
    /// Create the output directory if needed.
    pub fn new(size: PixelSize, dir: impl Into<PathBuf>) -> UnfurlResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            UnfurlError::render(format!("create output dir '{}': {e}", dir.display()))
        })?;
        Ok(Self {
            size,
            dir,
            next_index: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frames_written(&self) -> u64 {
        self.next_index
            .load(Ordering::Acquire)
            .saturating_sub(self.failures.load(Ordering::Acquire))
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{index:05}.png"))
    }
}

impl SurfaceProvider for PngSequenceSurface {
    fn acquire(&self) -> Option<FrameSurface> {
        FrameSurface::new(self.size)
            .inspect_err(|e| tracing::debug!(error = %e, "png surface unavailable"))
            .ok()
    }

    fn present(&self, frame: FrameSurface) {
        let index = self.next_index.fetch_add(1, Ordering::AcqRel);
        let path = self.frame_path(index);
        if let Err(e) = frame.save_png(&path) {
            self.failures.fetch_add(1, Ordering::AcqRel);
            tracing::warn!(error = %e, "dropping frame {index}");
        }
    }
}
