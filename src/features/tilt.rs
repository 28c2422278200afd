use crate::gfx::math::{Rect, Vec2};

/// Pointer-driven 3D tilt, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tilt {
    pub max_tilt: f32,
    pub sensitivity: f32,
    pub reverse: bool,
}

impl Default for Tilt {
    fn default() -> Self {
        Self {
            max_tilt: 5.0,
            sensitivity: 1.0,
            reverse: false,
        }
    }
}

impl Tilt {
    /// `(rotate_x, rotate_y)` for a pointer relative to `bounds`. A pointer
    /// on the right edge tilts by `max_tilt` around Y; the top edge tilts by
    /// `max_tilt` around X.
    pub fn angles(&self, pointer: Vec2, bounds: Rect) -> (f32, f32) {
        if bounds.w <= 0.0 || bounds.h <= 0.0 {
            return (0.0, 0.0);
        }
        let center = bounds.center();
        let px = (pointer.x - center.x) / (bounds.w / 2.0) * self.sensitivity;
        let py = (pointer.y - center.y) / (bounds.h / 2.0) * self.sensitivity;
        let direction = if self.reverse { -1.0 } else { 1.0 };
        (py * -self.max_tilt * direction, px * self.max_tilt * direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: Rect = Rect {
        x: 0.0,
        y: 0.0,
        w: 200.0,
        h: 100.0,
    };

    #[test]
    fn centre_is_flat() {
        assert_eq!(Tilt::default().angles(Vec2::new(100.0, 50.0), BOUNDS), (0.0, 0.0));
    }

    #[test]
    fn edges_reach_max_tilt() {
        let tilt = Tilt::default();
        assert_eq!(tilt.angles(Vec2::new(200.0, 50.0), BOUNDS), (0.0, 5.0));
        assert_eq!(tilt.angles(Vec2::new(100.0, 0.0), BOUNDS), (5.0, 0.0));
    }

    #[test]
    fn reverse_flips_direction() {
        let tilt = Tilt {
            reverse: true,
            ..Tilt::default()
        };
        assert_eq!(tilt.angles(Vec2::new(200.0, 50.0), BOUNDS), (0.0, -5.0));
    }

    #[test]
    fn degenerate_bounds_do_nothing() {
        let flat = Rect::new(0.0, 0.0, 0.0, 10.0);
        assert_eq!(Tilt::default().angles(Vec2::new(5.0, 5.0), flat), (0.0, 0.0));
    }
}
