use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Integer pixel coordinate (x right, y down).
pub type PixelPoint = Point2<i32>;

/// Axis-aligned bounding box over integer pixel coordinates (inclusive).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl BoundingBox {
    pub fn from_points(points: &[PixelPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bb = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in &points[1..] {
            bb.min_x = bb.min_x.min(p.x);
            bb.min_y = bb.min_y.min(p.y);
            bb.max_x = bb.max_x.max(p.x);
            bb.max_y = bb.max_y.max(p.y);
        }
        Some(bb)
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }

    /// Integer center, floor of the mean of the extremes.
    pub fn center(&self) -> PixelPoint {
        Point2::new(
            (self.min_x + self.max_x).div_euclid(2),
            (self.min_y + self.max_y).div_euclid(2),
        )
    }

    /// Shape-regularity score in `[0, 1]`; 1 for a square box.
    pub fn squareness(&self) -> f64 {
        let w = self.width() as f64;
        let h = self.height() as f64;
        let long = w.max(h);
        if long <= 0.0 {
            return 0.0;
        }
        w.min(h) / long
    }
}

/// Ellipse approximation: center, two semi-axes and orientation of axis `a` (radians).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: Point2<f64>,
    pub semi_axis_a: f64,
    pub semi_axis_b: f64,
    #[serde(default)]
    pub angle: f64,
}

impl Ellipse {
    pub fn new(center: Point2<f64>, semi_axis_a: f64, semi_axis_b: f64) -> Self {
        Self {
            center,
            semi_axis_a,
            semi_axis_b,
            angle: 0.0,
        }
    }

    /// Long over short semi-axis; infinite for a degenerate ellipse.
    pub fn aspect_ratio(&self) -> f64 {
        let long = self.semi_axis_a.max(self.semi_axis_b);
        let short = self.semi_axis_a.min(self.semi_axis_b);
        if short <= 0.0 {
            return f64::INFINITY;
        }
        long / short
    }

    pub fn average_radius(&self) -> f64 {
        0.5 * (self.semi_axis_a + self.semi_axis_b)
    }

    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.semi_axis_a * self.semi_axis_b
    }

    pub fn pixel_center(&self) -> PixelPoint {
        Point2::new(self.center.x.round() as i32, self.center.y.round() as i32)
    }

    /// Point on the boundary at parameter `t` (radians).
    pub fn point_at(&self, t: f64) -> Point2<f64> {
        let (st, ct) = t.sin_cos();
        let (sa, ca) = self.angle.sin_cos();
        let x = self.semi_axis_a * ct;
        let y = self.semi_axis_b * st;
        Point2::new(
            self.center.x + x * ca - y * sa,
            self.center.y + x * sa + y * ca,
        )
    }
}
