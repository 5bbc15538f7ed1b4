use crate::assets::sources::SourceKey;
use crate::foundation::core::{BezPath, PixelSize, Rect};
use crate::geometry::Projective;

/// One compositing step produced by an effect for a single frame.
///
/// Ops are executed in order, each blended source-over onto what was drawn before.
#[derive(Clone, Debug)]
pub enum DrawOp {
    /// Draw a source stretched into `dst`.
    Image {
        source: SourceKey,
        dst: Rect,
        opacity: f32,
    },
    /// Draw a source through a projective mapping from its pixel space to the canvas.
    Warp {
        source: SourceKey,
        transform: Projective,
        opacity: f32,
    },
    /// Horizontal gradient over a `size` rect, `from` at its left edge and `to` at its right,
    /// mapped through `transform`. Colors are premultiplied.
    Shade {
        size: PixelSize,
        transform: Projective,
        from: [u8; 4],
        to: [u8; 4],
        opacity: f32,
    },
    /// Draw `content` everywhere except inside `mask`.
    ClipOut { mask: BezPath, content: Vec<DrawOp> },
    /// Draw `content` only where the layer drawn by `mask` is opaque, then blend with `opacity`.
    MaskIn {
        mask: Vec<DrawOp>,
        content: Vec<DrawOp>,
        opacity: f32,
    },
}

impl DrawOp {
    /// Every source referenced by this op, nested ops included.
    pub fn sources(&self) -> Vec<SourceKey> {
        let mut out = Vec::new();
        self.collect_sources(&mut out);
        out
    }

    fn collect_sources(&self, out: &mut Vec<SourceKey>) {
        match self {
            Self::Image { source, .. } | Self::Warp { source, .. } => out.push(*source),
            Self::Shade { .. } => {}
            Self::ClipOut { content, .. } => {
                for op in content {
                    op.collect_sources(out);
                }
            }
            Self::MaskIn { mask, content, .. } => {
                for op in mask.iter().chain(content) {
                    op.collect_sources(out);
                }
            }
        }
    }
}
