use std::collections::HashMap;

use crate::foundation::core::PixelSize;
use crate::foundation::error::UnfurlResult;

/// Pool configuration for intermediate layers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SurfacePoolOpts {
    /// Maximum bytes retained across all buckets.
    pub(crate) max_pool_bytes: usize,
    /// Maximum number of retained layers per size bucket.
    pub(crate) max_surfaces_per_bucket: usize,
}

impl Default for SurfacePoolOpts {
    fn default() -> Self {
        Self {
            max_pool_bytes: 64 * 1024 * 1024,
            max_surfaces_per_bucket: 4,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct SurfacePoolStats {
    pub(crate) retained_surfaces: usize,
    pub(crate) retained_bytes: usize,
    pub(crate) alloc_surfaces: u64,
    pub(crate) dropped_on_release: u64,
}

/// Bounded pool of scratch pixmaps used for off-screen layers (masks, shape-cut composites).
///
/// Layers are borrowed and released per draw op, so a steady-state animation allocates nothing.
/// Borrowed layers are always cleared to transparent.
pub(crate) struct SurfacePool {
    opts: SurfacePoolOpts,
    stats: SurfacePoolStats,
    buckets: HashMap<PixelSize, Vec<vello_cpu::Pixmap>>,
}

impl SurfacePool {
    pub(crate) fn new(opts: SurfacePoolOpts) -> Self {
        Self {
            opts,
            stats: SurfacePoolStats::default(),
            buckets: HashMap::new(),
        }
    }

    pub(crate) fn stats(&self) -> SurfacePoolStats {
        self.stats.clone()
    }

    pub(crate) fn borrow(&mut self, size: PixelSize) -> UnfurlResult<vello_cpu::Pixmap> {
        if let Some(mut p) = self.buckets.get_mut(&size).and_then(Vec::pop) {
            self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_sub(1);
            self.stats.retained_bytes = self.stats.retained_bytes.saturating_sub(size.rgba8_len());
            p.data_as_u8_slice_mut().fill(0);
            return Ok(p);
        }

        let (w, h) = size.to_u16()?;
        self.stats.alloc_surfaces = self.stats.alloc_surfaces.saturating_add(1);
        Ok(vello_cpu::Pixmap::new(w, h))
    }

    pub(crate) fn release(&mut self, size: PixelSize, pixmap: vello_cpu::Pixmap) {
        let bytes = size.rgba8_len();
        if self.opts.max_surfaces_per_bucket == 0
            || self.stats.retained_bytes.saturating_add(bytes) > self.opts.max_pool_bytes
        {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let bucket = self.buckets.entry(size).or_default();
        if bucket.len() >= self.opts.max_surfaces_per_bucket {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        bucket.push(pixmap);
        self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_add(1);
        self.stats.retained_bytes = self.stats.retained_bytes.saturating_add(bytes);
    }

    /// Drop every retained layer.
    pub(crate) fn clear(&mut self) {
        self.buckets.clear();
        self.stats.retained_surfaces = 0;
        self.stats.retained_bytes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_reuses_released_layers() {
        let mut p = SurfacePool::new(SurfacePoolOpts::default());
        let size = PixelSize::new(8, 8);
        let a = p.borrow(size).unwrap();
        p.release(size, a);
        let _b = p.borrow(size).unwrap();
        assert_eq!(p.stats().alloc_surfaces, 1);
    }

    #[test]
    fn pool_honors_bucket_cap() {
        let mut p = SurfacePool::new(SurfacePoolOpts {
            max_pool_bytes: 1 << 30,
            max_surfaces_per_bucket: 1,
        });
        let size = PixelSize::new(8, 8);
        let a = p.borrow(size).unwrap();
        let b = p.borrow(size).unwrap();
        p.release(size, a);
        p.release(size, b);
        assert_eq!(p.stats().retained_surfaces, 1);
        assert_eq!(p.stats().dropped_on_release, 1);
    }

    #[test]
    fn pool_honors_global_byte_cap() {
        let size = PixelSize::new(8, 8);
        let mut p = SurfacePool::new(SurfacePoolOpts {
            max_pool_bytes: size.rgba8_len(),
            max_surfaces_per_bucket: 8,
        });
        let a = p.borrow(size).unwrap();
        let b = p.borrow(size).unwrap();
        p.release(size, a);
        p.release(size, b);
        assert_eq!(p.stats().retained_bytes, size.rgba8_len());
        assert!(p.stats().dropped_on_release >= 1);
    }

    #[test]
    fn borrowed_layers_are_cleared() {
        let mut p = SurfacePool::new(SurfacePoolOpts::default());
        let size = PixelSize::new(2, 2);
        let mut a = p.borrow(size).unwrap();
        a.data_as_u8_slice_mut().fill(200);
        p.release(size, a);
        let b = p.borrow(size).unwrap();
        assert!(b.data_as_u8_slice().iter().all(|&v| v == 0));
        p.clear();
        assert_eq!(p.stats().retained_surfaces, 0);
    }
}
