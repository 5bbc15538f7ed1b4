use std::collections::HashMap;

use crate::assets::bitmap::Bitmap;
use crate::assets::sources::SourceSet;
use crate::foundation::core::{Affine, BezPath, PixelSize, Rect};
use crate::foundation::error::UnfurlResult;
use crate::render::composite::{dst_out_in_place, over_in_place, src_in_in_place};
use crate::render::ops::DrawOp;
use crate::render::surface::FrameSurface;
use crate::render::surface_pool::{SurfacePool, SurfacePoolOpts};
use crate::render::warp::warp_over;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOutcome {
    Drawn,
    /// A referenced source was missing; the surface was left untouched.
    Skipped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct GradientKey {
    from: [u8; 4],
    to: [u8; 4],
    w: u32,
    h: u32,
}

/// Executes [`DrawOp`] lists on the CPU.
pub struct CpuCompositor {
    pool: SurfacePool,
    gradient_cache: HashMap<GradientKey, Bitmap>,
}

impl Default for CpuCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuCompositor {
    pub fn new() -> Self {
        Self {
            pool: SurfacePool::new(SurfacePoolOpts::default()),
            gradient_cache: HashMap::new(),
        }
    }

    pub fn draw(
        &mut self,
        surface: &mut FrameSurface,
        ops: &[DrawOp],
        sources: &SourceSet,
    ) -> UnfurlResult<DrawOutcome> {
        if let Some(missing) = ops
            .iter()
            .flat_map(DrawOp::sources)
            .find(|k| !sources.contains(*k))
        {
            tracing::trace!(?missing, "source missing, frame skipped");
            return Ok(DrawOutcome::Skipped);
        }

        let size = surface.size();
        self.exec(surface.data_mut(), size, ops, sources)?;
        Ok(DrawOutcome::Drawn)
    }

    pub fn trim(&mut self) {
        let stats = self.pool.stats();
        tracing::debug!(
            layers_allocated = stats.alloc_surfaces,
            retained_bytes = stats.retained_bytes,
            gradients = self.gradient_cache.len(),
            "scratch layers released"
        );
        self.pool.clear();
        self.gradient_cache.clear();
    }

    fn exec(
        &mut self,
        canvas: &mut [u8],
        size: PixelSize,
        ops: &[DrawOp],
        sources: &SourceSet,
    ) -> UnfurlResult<()> {
        for op in ops {
            match op {
                DrawOp::Image {
                    source,
                    dst,
                    opacity,
                } => {
                    let Some(bitmap) = sources.get(*source) else {
                        continue;
                    };
                    if bitmap.is_empty() || dst.area() <= 0.0 || *opacity <= 0.0 {
                        continue;
                    }
                    let mut layer = self.pool.borrow(size)?;
                    render_image(&mut layer, size, bitmap, *dst)?;
                    over_in_place(canvas, layer.data_as_u8_slice(), *opacity)?;
                    self.pool.release(size, layer);
                }
                DrawOp::Warp {
                    source,
                    transform,
                    opacity,
                } => {
                    let Some(bitmap) = sources.get(*source) else {
                        continue;
                    };
                    if !warp_over(canvas, size, bitmap, transform, *opacity) {
                        tracing::trace!(?source, "degenerate or offscreen warp skipped");
                    }
                }
                DrawOp::Shade {
                    size: shade_size,
                    transform,
                    from,
                    to,
                    opacity,
                } => {
                    if *opacity <= 0.0 || shade_size.area() == 0 {
                        continue;
                    }
                    let gradient = self.gradient_bitmap(*from, *to, *shade_size)?;
                    warp_over(canvas, size, &gradient, transform, *opacity);
                }
                DrawOp::ClipOut { mask, content } => {
                    let mut layer = self.pool.borrow(size)?;
                    self.exec(layer.data_as_u8_slice_mut(), size, content, sources)?;
                    let mut cut = self.pool.borrow(size)?;
                    render_path(&mut cut, size, mask)?;
                    dst_out_in_place(layer.data_as_u8_slice_mut(), cut.data_as_u8_slice())?;
                    over_in_place(canvas, layer.data_as_u8_slice(), 1.0)?;
                    self.pool.release(size, cut);
                    self.pool.release(size, layer);
                }
                DrawOp::MaskIn {
                    mask,
                    content,
                    opacity,
                } => {
                    if *opacity <= 0.0 {
                        continue;
                    }
                    let mut layer = self.pool.borrow(size)?;
                    self.exec(layer.data_as_u8_slice_mut(), size, content, sources)?;
                    let mut keep = self.pool.borrow(size)?;
                    self.exec(keep.data_as_u8_slice_mut(), size, mask, sources)?;
                    src_in_in_place(layer.data_as_u8_slice_mut(), keep.data_as_u8_slice())?;
                    over_in_place(canvas, layer.data_as_u8_slice(), *opacity)?;
                    self.pool.release(size, keep);
                    self.pool.release(size, layer);
                }
            }
        }
        Ok(())
    }

    fn gradient_bitmap(&mut self, from: [u8; 4], to: [u8; 4], size: PixelSize) -> UnfurlResult<Bitmap> {
        let key = GradientKey {
            from,
            to,
            w: size.width,
            h: size.height,
        };
        if let Some(bitmap) = self.gradient_cache.get(&key) {
            return Ok(bitmap.clone());
        }
        let w1 = (size.width.max(1) - 1) as f32;
        let row: Vec<u8> = (0..size.width)
            .flat_map(|x| {
                let t = if w1 <= 0.0 { 0.0 } else { x as f32 / w1 };
                let lerp = |a: u8, b: u8| {
                    let (af, bf) = (f32::from(a), f32::from(b));
                    (af + (bf - af) * t).round().clamp(0.0, 255.0) as u8
                };
                [
                    lerp(from[0], to[0]),
                    lerp(from[1], to[1]),
                    lerp(from[2], to[2]),
                    lerp(from[3], to[3]),
                ]
            })
            .collect();
        let bitmap = Bitmap::from_premul_rgba8(&row.repeat(size.height as usize), size)?;
        self.gradient_cache.insert(key, bitmap.clone());
        Ok(bitmap)
    }
}

fn render_image(
    layer: &mut vello_cpu::Pixmap,
    size: PixelSize,
    bitmap: &Bitmap,
    dst: Rect,
) -> UnfurlResult<()> {
    let (w, h) = size.to_u16()?;
    let (bw, bh) = (f64::from(bitmap.width()), f64::from(bitmap.height()));
    let transform = Affine::translate((dst.x0, dst.y0))
        * Affine::scale_non_uniform(dst.width() / bw, dst.height() / bh);

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint(bitmap.paint());
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, bw, bh));
    ctx.flush();
    ctx.render_to_pixmap(layer);
    Ok(())
}

fn render_path(layer: &mut vello_cpu::Pixmap, size: PixelSize, path: &BezPath) -> UnfurlResult<()> {
    let (w, h) = size.to_u16()?;
    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 0, 0, 255));
    ctx.fill_path(&bezpath_to_cpu(path));
    ctx.flush();
    ctx.render_to_pixmap(layer);
    Ok(())
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::sources::SourceKey;
    use crate::geometry::Projective;

    fn sources() -> SourceSet {
        SourceSet::new()
            .with(
                SourceKey::Cover,
                Bitmap::solid(PixelSize::new(4, 4), [255, 0, 0, 255]).unwrap(),
            )
            .with(
                SourceKey::Shape,
                Bitmap::solid(PixelSize::new(4, 4), [0, 0, 0, 255]).unwrap(),
            )
    }

    fn surface(w: u32, h: u32) -> FrameSurface {
        FrameSurface::new(PixelSize::new(w, h)).unwrap()
    }

    fn assert_px_near(s: &FrameSurface, x: u32, y: u32, want: [u8; 4]) {
        let got = s.pixel(x, y).unwrap();
        for c in 0..4 {
            assert!(
                (i32::from(got[c]) - i32::from(want[c])).abs() <= 2,
                "pixel ({x}, {y}) = {got:?}, want {want:?}"
            );
        }
    }

    #[test]
    fn image_fills_its_destination_rect() {
        let mut s = surface(8, 8);
        let ops = [DrawOp::Image {
            source: SourceKey::Cover,
            dst: Rect::new(0.0, 0.0, 8.0, 4.0),
            opacity: 1.0,
        }];
        let out = CpuCompositor::new().draw(&mut s, &ops, &sources()).unwrap();
        assert_eq!(out, DrawOutcome::Drawn);
        assert_px_near(&s, 3, 1, [255, 0, 0, 255]);
        assert_eq!(s.pixel(3, 6), Some([0, 0, 0, 0]));
    }

    #[test]
    fn missing_source_skips_without_touching_the_surface() {
        let mut s = surface(4, 4);
        let ops = [DrawOp::Image {
            source: SourceKey::Brand,
            dst: Rect::new(0.0, 0.0, 4.0, 4.0),
            opacity: 1.0,
        }];
        let out = CpuCompositor::new().draw(&mut s, &ops, &sources()).unwrap();
        assert_eq!(out, DrawOutcome::Skipped);
        assert!(s.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn clip_out_erases_inside_the_mask() {
        let mut s = surface(8, 8);
        let mut mask = BezPath::new();
        mask.move_to((0.0, 4.0));
        mask.line_to((8.0, 4.0));
        mask.line_to((8.0, 8.0));
        mask.line_to((0.0, 8.0));
        mask.close_path();
        let ops = [DrawOp::ClipOut {
            mask,
            content: vec![DrawOp::Image {
                source: SourceKey::Cover,
                dst: Rect::new(0.0, 0.0, 8.0, 8.0),
                opacity: 1.0,
            }],
        }];
        CpuCompositor::new().draw(&mut s, &ops, &sources()).unwrap();
        assert_px_near(&s, 2, 1, [255, 0, 0, 255]);
        assert_eq!(s.pixel(2, 6), Some([0, 0, 0, 0]));
    }

    #[test]
    fn mask_in_keeps_content_inside_mask_only() {
        let mut s = surface(8, 8);
        let ops = [DrawOp::MaskIn {
            mask: vec![DrawOp::Image {
                source: SourceKey::Shape,
                dst: Rect::new(2.0, 2.0, 6.0, 6.0),
                opacity: 1.0,
            }],
            content: vec![DrawOp::Image {
                source: SourceKey::Cover,
                dst: Rect::new(0.0, 0.0, 8.0, 8.0),
                opacity: 1.0,
            }],
            opacity: 1.0,
        }];
        CpuCompositor::new().draw(&mut s, &ops, &sources()).unwrap();
        assert_px_near(&s, 4, 4, [255, 0, 0, 255]);
        assert_eq!(s.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(s.pixel(7, 7), Some([0, 0, 0, 0]));
    }

    #[test]
    fn warp_draws_through_the_projective_mapping() {
        let mut s = surface(8, 8);
        let ops = [DrawOp::Warp {
            source: SourceKey::Cover,
            transform: Projective::translate(4.0, 4.0),
            opacity: 1.0,
        }];
        CpuCompositor::new().draw(&mut s, &ops, &sources()).unwrap();
        assert_eq!(s.pixel(5, 5), Some([255, 0, 0, 255]));
        assert_eq!(s.pixel(1, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn zero_opacity_draws_nothing() {
        let mut s = surface(4, 4);
        let ops = [DrawOp::Image {
            source: SourceKey::Cover,
            dst: Rect::new(0.0, 0.0, 4.0, 4.0),
            opacity: 0.0,
        }];
        let out = CpuCompositor::new().draw(&mut s, &ops, &sources()).unwrap();
        assert_eq!(out, DrawOutcome::Drawn);
        assert!(s.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn shade_runs_from_left_color_to_right_color() {
        let mut s = surface(8, 2);
        let ops = [DrawOp::Shade {
            size: PixelSize::new(8, 2),
            transform: Projective::IDENTITY,
            from: [0, 0, 0, 0],
            to: [0, 0, 0, 255],
            opacity: 1.0,
        }];
        let mut compositor = CpuCompositor::new();
        let out = compositor.draw(&mut s, &ops, &SourceSet::new()).unwrap();
        assert_eq!(out, DrawOutcome::Drawn);
        let alpha = |x| s.pixel(x, 1).unwrap()[3];
        assert!(alpha(0) < 30);
        assert!(alpha(7) > 225);
        assert!((0..7).all(|x| alpha(x) <= alpha(x + 1)));
        assert_eq!(compositor.gradient_cache.len(), 1);
    }

    #[test]
    fn shade_opacity_scales_the_gradient() {
        let mut s = surface(4, 4);
        let ops = [DrawOp::Shade {
            size: PixelSize::new(4, 4),
            transform: Projective::IDENTITY,
            from: [0, 0, 0, 200],
            to: [0, 0, 0, 200],
            opacity: 0.5,
        }];
        CpuCompositor::new().draw(&mut s, &ops, &SourceSet::new()).unwrap();
        assert_px_near(&s, 2, 2, [0, 0, 0, 100]);
    }
}
