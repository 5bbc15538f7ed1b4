use crate::foundation::core::{Point, Size};
use crate::geometry::projective::Projective;

/// Pixels per camera-location unit (the camera distance is expressed in inches).
const PX_PER_INCH: f64 = 72.0;

/// Upper bound for the fake foreshortening squeeze.
const MAX_SQUEEZE: f64 = 0.2;

/// Focal distance in pixels for a camera placed `depth` inches from the image plane.
pub fn focal_length_px(depth: f64, density: f64) -> f64 {
    depth.abs() * density * PX_PER_INCH
}

/// Vertical scale applied on top of the rotation: `1 - min(0.2, angle / 900)`.
pub fn fold_squeeze(angle_deg: f64) -> f64 {
    1.0 - MAX_SQUEEZE.min(angle_deg / 900.0)
}

/// Pure Y rotation under a pinhole projection, with the rotation axis through the origin.
///
/// A point `(x, y)` on the image plane rotates to depth `z = x sin(a)`; it then projects with
/// weight `1 + z / focal`. Positive angles push `+x` away from the viewer.
fn camera_rotate_y(angle_deg: f64, focal_px: f64) -> Projective {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let persp = if focal_px > 0.0 { sin / focal_px } else { 0.0 };
    Projective::new([cos, 0.0, 0.0, 0.0, 1.0, 0.0, persp, 0.0, 1.0])
}

/// Y rotation hinged at `pivot`, followed by the vertical squeeze about the origin.
pub fn camera_rotation(angle_deg: f64, focal_px: f64, pivot: Point) -> Projective {
    let magnitude = angle_deg.abs();
    Projective::translate(-pivot.x, -pivot.y)
        .then(&camera_rotate_y(angle_deg, focal_px))
        .then(&Projective::translate(pivot.x, pivot.y))
        .then(&Projective::scale(1.0, fold_squeeze(magnitude)))
}

/// Which edge of a half bitmap sits on the fold seam.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hinge {
    /// Left half of a fold: hinged at its right edge, rotated by `-angle`.
    RightEdge,
    /// Right half of a fold: hinged at its left edge, rotated by `+angle`.
    LeftEdge,
}

/// Transform for one half of a fold at `angle_deg`, in the half bitmap's own pixel space.
pub fn fold_half_transform(angle_deg: f64, focal_px: f64, half: Size, hinge: Hinge) -> Projective {
    let cy = half.height / 2.0;
    match hinge {
        Hinge::RightEdge => camera_rotation(-angle_deg, focal_px, Point::new(half.width, cy)),
        Hinge::LeftEdge => camera_rotation(angle_deg, focal_px, Point::new(0.0, cy)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_angle_is_identity() {
        let focal = focal_length_px(20.0, 1.0);
        assert!(camera_rotation(0.0, focal, Point::new(40.0, 25.0)).is_identity(1e-12));
        let half = Size::new(40.0, 50.0);
        assert!(fold_half_transform(0.0, focal, half, Hinge::RightEdge).is_identity(1e-12));
        assert!(fold_half_transform(0.0, focal, half, Hinge::LeftEdge).is_identity(1e-12));
    }

    #[test]
    fn squeeze_is_capped() {
        assert!((fold_squeeze(90.0) - 0.9).abs() < 1e-12);
        assert!((fold_squeeze(180.0) - 0.8).abs() < 1e-12);
        assert!((fold_squeeze(450.0) - 0.8).abs() < 1e-12);
        assert_eq!(fold_squeeze(0.0), 1.0);
    }

    #[test]
    fn hinge_line_only_gets_squeezed() {
        let half = Size::new(40.0, 100.0);
        let focal = focal_length_px(5.0, 1.0);
        let t = fold_half_transform(45.0, focal, half, Hinge::RightEdge);
        let p = t.map_point(Point::new(40.0, 100.0)).unwrap();
        assert!((p.x - 40.0).abs() < 1e-9);
        assert!((p.y - 100.0 * fold_squeeze(45.0)).abs() < 1e-9);
    }

    #[test]
    fn far_edges_move_toward_the_seam() {
        let half = Size::new(40.0, 100.0);
        let focal = focal_length_px(20.0, 1.0);
        let left = fold_half_transform(60.0, focal, half, Hinge::RightEdge);
        let right = fold_half_transform(60.0, focal, half, Hinge::LeftEdge);
        let l = left.map_point(Point::new(0.0, 50.0)).unwrap();
        let r = right.map_point(Point::new(40.0, 50.0)).unwrap();
        assert!(l.x > 0.0 && l.x < 40.0);
        assert!(r.x > 0.0 && r.x < 40.0);
    }

    #[test]
    fn receding_edge_is_foreshortened() {
        let focal = focal_length_px(1.0, 1.0);
        let t = camera_rotation(30.0, focal, Point::ORIGIN);
        assert!(t.weight(Point::new(50.0, 0.0)) > 1.0);
    }
}
