use crate::foundation::core::{Point, Size};
use crate::foundation::math::approx_eq;

const DEGENERATE_EPS: f64 = 1e-9;

/// A 3x3 projective transform acting on column vectors `(x, y, 1)`.
///
/// Row-major: `[a b c; d e f; g h i]` maps `(x, y)` to
/// `((a x + b y + c) / w, (d x + e y + f) / w)` with `w = g x + h y + i`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projective {
    m: [f64; 9],
}

impl Default for Projective {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Projective {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    /// Build from row-major coefficients.
    pub fn new(m: [f64; 9]) -> Self {
        Self { m }
    }

    /// Row-major coefficients.
    pub fn coeffs(&self) -> [f64; 9] {
        self.m
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::new([1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0])
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new([sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0])
    }

    /// `self * other`: apply `other` first, then `self`.
    pub fn then_after(&self, other: &Self) -> Self {
        let a = &self.m;
        let b = &other.m;
        let mut out = [0.0; 9];
        for r in 0..3 {
            for c in 0..3 {
                out[r * 3 + c] = a[r * 3] * b[c] + a[r * 3 + 1] * b[3 + c] + a[r * 3 + 2] * b[6 + c];
            }
        }
        Self::new(out)
    }

    /// Apply `self` first, then `next` (equivalent to post-concatenation).
    pub fn then(&self, next: &Self) -> Self {
        next.then_after(self)
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0] * (m[4] * m[8] - m[5] * m[7]) - m[1] * (m[3] * m[8] - m[5] * m[6])
            + m[2] * (m[3] * m[7] - m[4] * m[6])
    }

    /// Inverse transform, or `None` for a singular matrix.
    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < DEGENERATE_EPS {
            return None;
        }
        let m = &self.m;
        let inv = [
            m[4] * m[8] - m[5] * m[7],
            m[2] * m[7] - m[1] * m[8],
            m[1] * m[5] - m[2] * m[4],
            m[5] * m[6] - m[3] * m[8],
            m[0] * m[8] - m[2] * m[6],
            m[2] * m[3] - m[0] * m[5],
            m[3] * m[7] - m[4] * m[6],
            m[1] * m[6] - m[0] * m[7],
            m[0] * m[4] - m[1] * m[3],
        ];
        Some(Self::new(inv.map(|v| v / det)))
    }

    /// Scale so that `i == 1`; `None` if `i` is zero.
    fn normalized(&self) -> Option<Self> {
        let i = self.m[8];
        if i.abs() < DEGENERATE_EPS {
            return None;
        }
        Some(Self::new(self.m.map(|v| v / i)))
    }

    /// Homogeneous weight of `p` under this transform.
    pub fn weight(&self, p: Point) -> f64 {
        self.m[6] * p.x + self.m[7] * p.y + self.m[8]
    }

    /// Map a point; `None` when it lands on or behind the projection plane.
    pub fn map_point(&self, p: Point) -> Option<Point> {
        let m = &self.m;
        let w = self.weight(p);
        if w <= DEGENERATE_EPS {
            return None;
        }
        Some(Point::new(
            (m[0] * p.x + m[1] * p.y + m[2]) / w,
            (m[3] * p.x + m[4] * p.y + m[5]) / w,
        ))
    }

    /// Compare two transforms after normalizing the homogeneous scale.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        match (self.normalized(), other.normalized()) {
            (Some(a), Some(b)) => a.m.iter().zip(b.m.iter()).all(|(x, y)| approx_eq(*x, *y, eps)),
            _ => false,
        }
    }

    pub fn is_identity(&self, eps: f64) -> bool {
        self.approx_eq(&Self::IDENTITY, eps)
    }
}

/// Projective map from the unit square `(0,0),(1,0),(1,1),(0,1)` onto `quad` (same order).
fn square_to_quad(quad: [Point; 4]) -> Option<Projective> {
    let [p0, p1, p2, p3] = quad;
    let dx1 = p1.x - p2.x;
    let dx2 = p3.x - p2.x;
    let dx3 = p0.x - p1.x + p2.x - p3.x;
    let dy1 = p1.y - p2.y;
    let dy2 = p3.y - p2.y;
    let dy3 = p0.y - p1.y + p2.y - p3.y;

    let m = if dx3.abs() < DEGENERATE_EPS && dy3.abs() < DEGENERATE_EPS {
        [
            p1.x - p0.x,
            p3.x - p0.x,
            p0.x,
            p1.y - p0.y,
            p3.y - p0.y,
            p0.y,
            0.0,
            0.0,
            1.0,
        ]
    } else {
        let den = dx1 * dy2 - dx2 * dy1;
        if den.abs() < DEGENERATE_EPS {
            return None;
        }
        let g = (dx3 * dy2 - dx2 * dy3) / den;
        let h = (dx1 * dy3 - dx3 * dy1) / den;
        [
            p1.x - p0.x + g * p1.x,
            p3.x - p0.x + h * p3.x,
            p0.x,
            p1.y - p0.y + g * p1.y,
            p3.y - p0.y + h * p3.y,
            p0.y,
            g,
            h,
            1.0,
        ]
    };

    let t = Projective::new(m);
    if !t.determinant().is_finite() || t.determinant().abs() < DEGENERATE_EPS {
        return None;
    }
    Some(t)
}

/// Solve the projective transform mapping the four `src` points onto the four `dst` points.
///
/// Points are given in the order top-left, top-right, bottom-right, bottom-left. Returns `None`
/// when either quad is degenerate (three or more collinear points, zero area).
pub fn quad_to_quad(src: [Point; 4], dst: [Point; 4]) -> Option<Projective> {
    let s = square_to_quad(src)?.invert()?;
    let d = square_to_quad(dst)?;
    let out = d.then_after(&s);
    if !out.m.iter().all(|v| v.is_finite()) {
        return None;
    }
    Some(out)
}

/// Map a bitmap of `size` (corners starting at the origin) onto the destination corners.
pub fn perspective_quad(
    size: Size,
    top_left: Point,
    top_right: Point,
    bottom_right: Point,
    bottom_left: Point,
) -> Option<Projective> {
    if size.width <= 0.0 || size.height <= 0.0 {
        return None;
    }
    let src = [
        Point::new(0.0, 0.0),
        Point::new(size.width, 0.0),
        Point::new(size.width, size.height),
        Point::new(0.0, size.height),
    ];
    quad_to_quad(src, [top_left, top_right, bottom_right, bottom_left])
}
