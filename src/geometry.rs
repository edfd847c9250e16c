//! Rectangle helpers for zone math.
//!
//! Frames and viewports are plain `kurbo::Rect`s in one shared coordinate space.
//! Zones only ever grow along the vertical (scroll) axis.

use kurbo::Rect;

/// Build a rectangle from origin and size, the way layout systems report frames.
pub fn frame(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect::from_origin_size((x, y), (width, height))
}

/// Expand `rect` outward by `amount` above and below. Width is untouched.
pub fn expand_vertically(rect: Rect, amount: f64) -> Rect {
    rect.inflate(0.0, amount)
}

/// Strict intersection: the overlap must have positive width and height.
///
/// Touching edges do not count, and a zero-area rectangle never intersects anything.
pub fn intersects(a: Rect, b: Rect) -> bool {
    let overlap = a.intersect(b);
    overlap.width() > 0.0 && overlap.height() > 0.0
}

/// A viewport with no area has nothing to compare slots against.
pub fn is_degenerate(rect: Rect) -> bool {
    !(rect.width() > 0.0 && rect.height() > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_from_origin_size() {
        let r = frame(0.0, 1000.0, 400.0, 300.0);
        assert_eq!(r, Rect::new(0.0, 1000.0, 400.0, 1300.0));
    }

    #[test]
    fn test_expand_vertically_only_grows_y() {
        let viewport = frame(0.0, 0.0, 400.0, 800.0);
        let zone = expand_vertically(viewport, 800.0);
        assert_eq!(zone.x0, 0.0);
        assert_eq!(zone.x1, 400.0);
        assert_eq!(zone.y0, -800.0);
        assert_eq!(zone.y1, 1600.0);
    }

    #[test]
    fn test_intersects_overlapping() {
        let a = frame(0.0, 0.0, 100.0, 100.0);
        let b = frame(50.0, 50.0, 100.0, 100.0);
        assert!(intersects(a, b));
        assert!(intersects(b, a));
    }

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = frame(0.0, 0.0, 100.0, 100.0);
        let b = frame(0.0, 100.0, 100.0, 100.0);
        assert!(!intersects(a, b));
    }

    #[test]
    fn test_zero_area_never_intersects() {
        let zone = frame(0.0, 0.0, 400.0, 800.0);
        let collapsed = frame(0.0, 100.0, 400.0, 0.0);
        assert!(!intersects(collapsed, zone));
    }

    #[test]
    fn test_is_degenerate() {
        assert!(is_degenerate(Rect::ZERO));
        assert!(is_degenerate(frame(0.0, 0.0, 400.0, 0.0)));
        assert!(!is_degenerate(frame(0.0, 0.0, 400.0, 800.0)));
    }
}
