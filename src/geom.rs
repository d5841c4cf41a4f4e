//! The translation layer between continuous pick coordinates and the
//! discrete hex grid.

use serde::{Deserialize, Serialize};

use crate::map::Hex;

const SQRT_OF_3: f32 = 1.732_050_8;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Forward and backward 2x2 matrices of a hex orientation plus the angle
/// of the first corner (in multiples of 60 degrees).
#[derive(Clone, Copy, Debug)]
pub struct Orientation {
    f: [f32; 4],
    b: [f32; 4],
    start_angle: f32,
}

pub const POINTY: Orientation = Orientation {
    f: [SQRT_OF_3, SQRT_OF_3 / 2.0, 0.0, 3.0 / 2.0],
    b: [SQRT_OF_3 / 3.0, -1.0 / 3.0, 0.0, 2.0 / 3.0],
    start_angle: 0.5,
};

pub const FLAT: Orientation = Orientation {
    f: [3.0 / 2.0, 0.0, SQRT_OF_3 / 2.0, SQRT_OF_3],
    b: [2.0 / 3.0, 0.0, -1.0 / 3.0, SQRT_OF_3 / 3.0],
    start_angle: 0.0,
};

#[derive(Clone, Copy, Debug)]
pub struct Layout {
    orientation: Orientation,
    size: Point,
    origin: Point,
}

impl Layout {
    pub fn new(orientation: Orientation, size: Point, origin: Point) -> Self {
        Self {
            orientation,
            size,
            origin,
        }
    }

    /// <http://www.redblobgames.com/grids/hexagons/#hex-to-pixel>
    pub fn hex_to_point(&self, hex: Hex) -> Point {
        let m = &self.orientation.f;
        let x = (m[0] * hex.q as f32 + m[1] * hex.r as f32) * self.size.x;
        let y = (m[2] * hex.q as f32 + m[3] * hex.r as f32) * self.size.y;
        Point::new(x + self.origin.x, y + self.origin.y)
    }

    /// <http://www.redblobgames.com/grids/hexagons/#pixel-to-hex>
    pub fn point_to_hex(&self, point: Point) -> Hex {
        let m = &self.orientation.b;
        let x = (point.x - self.origin.x) / self.size.x;
        let y = (point.y - self.origin.y) / self.size.y;
        let q = m[0] * x + m[1] * y;
        let r = m[2] * x + m[3] * y;
        Hex::from_fractional(q, r, -q - r)
    }

    pub fn corner(&self, corner: i32) -> Point {
        let angle = 2.0 * std::f32::consts::PI * (self.orientation.start_angle + corner as f32) / 6.0;
        Point::new(self.size.x * angle.cos(), self.size.y * angle.sin())
    }

    /// The six corner points of a cell, in corner order.
    pub fn polygon_corners(&self, hex: Hex) -> [Point; 6] {
        let center = self.hex_to_point(hex);
        let mut corners = [center; 6];
        for (i, point) in corners.iter_mut().enumerate() {
            let corner = self.corner(i as i32);
            *point = Point::new(center.x + corner.x, center.y + corner.y);
        }
        corners
    }
}

#[cfg(test)]
mod tests {
    use super::{Layout, Point, FLAT, POINTY};
    use crate::map::Hex;

    fn layouts() -> Vec<Layout> {
        vec![
            Layout::new(POINTY, Point::new(1.0, 1.0), Point::new(0.0, 0.0)),
            Layout::new(FLAT, Point::new(1.0, 1.0), Point::new(0.0, 0.0)),
            Layout::new(POINTY, Point::new(2.5, 1.5), Point::new(-3.0, 7.0)),
        ]
    }

    #[test]
    fn hex_point_round_trip() {
        for layout in layouts() {
            for q in -4..=4 {
                for r in -4..=4 {
                    let hex = Hex::new(q, r);
                    let point = layout.hex_to_point(hex);
                    assert_eq!(layout.point_to_hex(point), hex);
                }
            }
        }
    }

    #[test]
    fn origin_maps_to_origin() {
        let layout = Layout::new(POINTY, Point::new(1.0, 1.0), Point::new(2.0, -1.0));
        let point = layout.hex_to_point(Hex::new(0, 0));
        assert_eq!(point, Point::new(2.0, -1.0));
    }

    #[test]
    fn corners_surround_the_center() {
        let layout = Layout::new(POINTY, Point::new(1.0, 1.0), Point::new(0.0, 0.0));
        let hex = Hex::new(1, -1);
        let center = layout.hex_to_point(hex);
        for corner in &layout.polygon_corners(hex) {
            let d = center.distance_to(*corner);
            assert!((d - 1.0).abs() < 1e-5, "corner distance {}", d);
        }
    }
}
