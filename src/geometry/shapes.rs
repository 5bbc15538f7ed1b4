use crate::foundation::core::{BezPath, Point, Rect, Size};

/// Region below a wavy boundary, used to clip out (unveil) the cover.
///
/// Two cubic arcs run from the peak `(center_x, peak_y)` down to the edge points `(0, edge_y)`
/// and `(width, edge_y)`; the region is then closed through the bottom corners at `height`.
pub fn alpha_mask_path(center_x: f64, edge_y: f64, peak_y: f64, width: f64, height: f64) -> BezPath {
    let peak = Point::new(center_x, peak_y);
    let mut path = BezPath::new();
    path.move_to(peak);
    let shoulder = Point::new(center_x, edge_y);
    path.curve_to(peak, shoulder, Point::new(0.0, edge_y));
    path.line_to(Point::new(0.0, height));
    path.line_to(Point::new(width, height));
    path.line_to(Point::new(width, edge_y));
    path.curve_to(shoulder, peak, peak);
    path.close_path();
    path
}

/// Scale `rect` uniformly about its own center.
pub fn scaled_rect_around_center(rect: Rect, scale: f64) -> Rect {
    let size = Size::new(rect.width() * scale, rect.height() * scale);
    Rect::from_center_size(rect.center(), size)
}

/// Rect of `size` centered on `center`.
pub fn centered_rect(center: Point, size: Size) -> Rect {
    Rect::from_center_size(center, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{PathEl, Shape};

    fn assert_rect_near(a: Rect, b: Rect) {
        let close = |x: f64, y: f64| (x - y).abs() < 1e-6;
        assert!(
            close(a.x0, b.x0) && close(a.y0, b.y0) && close(a.x1, b.x1) && close(a.y1, b.y1),
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn flat_peak_is_a_horizontal_cut() {
        let path = alpha_mask_path(50.0, 30.0, 30.0, 100.0, 200.0);
        assert_rect_near(path.bounding_box(), Rect::new(0.0, 30.0, 100.0, 200.0));
        for el in path.elements() {
            let pts: Vec<Point> = match *el {
                PathEl::MoveTo(p) | PathEl::LineTo(p) => vec![p],
                PathEl::CurveTo(a, b, c) => vec![a, b, c],
                PathEl::QuadTo(a, b) => vec![a, b],
                PathEl::ClosePath => vec![],
            };
            for p in pts {
                assert!(p.y == 30.0 || p.y == 200.0, "unexpected vertex {p:?}");
            }
        }
        assert!((path.area().abs() - 100.0 * 170.0).abs() < 1e-6);
    }

    #[test]
    fn mask_is_symmetric_about_center() {
        let path = alpha_mask_path(50.0, 80.0, 10.0, 100.0, 200.0);
        for y in [20.0, 40.0, 60.0] {
            for dx in [5.0, 15.0, 30.0, 45.0] {
                assert_eq!(
                    path.contains(Point::new(50.0 - dx, y)),
                    path.contains(Point::new(50.0 + dx, y)),
                    "asymmetric at dx={dx} y={y}"
                );
            }
        }
        assert!(path.contains(Point::new(50.0, 150.0)));
        assert!(!path.contains(Point::new(2.0, 20.0)));
    }

    #[test]
    fn zero_edge_covers_the_whole_container() {
        let path = alpha_mask_path(500.0, 0.0, 0.0, 1000.0, 2000.0);
        assert_rect_near(path.bounding_box(), Rect::new(0.0, 0.0, 1000.0, 2000.0));
    }

    #[test]
    fn unit_scale_is_identity() {
        let r = Rect::new(10.0, 20.0, 610.0, 420.0);
        assert_eq!(scaled_rect_around_center(r, 1.0), r);
    }

    #[test]
    fn scaling_keeps_the_center() {
        let r = Rect::new(13.0, 7.0, 613.0, 311.0);
        for s in [0.01, 0.25, 0.5, 2.0, 25.0] {
            let out = scaled_rect_around_center(r, s);
            assert!((out.center().x - r.center().x).abs() <= 1.0);
            assert!((out.center().y - r.center().y).abs() <= 1.0);
            assert!((out.width() - r.width() * s).abs() < 1e-9);
        }
    }

    #[test]
    fn centered_rect_spans_size() {
        let r = centered_rect(Point::new(100.0, 50.0), Size::new(40.0, 20.0));
        assert_eq!(r, Rect::new(80.0, 40.0, 120.0, 60.0));
    }
}
