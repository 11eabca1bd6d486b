//! Shape extraction capability consumed by the target detectors.
//!
//! The detectors only need three operations: trace closed contours in a
//! binary mask, simplify a contour to a polygon, and approximate a point set
//! with an ellipse. Any vision backend can provide them; see
//! [`BorderFollowingExtractor`](crate::BorderFollowingExtractor) for the
//! built-in one.

use serde::{Deserialize, Serialize};

use crate::geometry::{Ellipse, PixelPoint};
use crate::image::BinaryMask;

/// Pixel adjacency used when grouping foreground pixels into contours.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    Four,
    Eight,
}

/// Ordered boundary of one connected foreground region.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RawContour {
    pub points: Vec<PixelPoint>,
}

impl RawContour {
    pub fn new(points: Vec<PixelPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Polygon simplification settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolygonFit {
    /// Maximum distance from the contour to the polygon, as a fraction of the
    /// contour's bounding-box diagonal. Never below one pixel.
    pub tolerance: f64,
    /// Treat the contour as a closed loop.
    pub closed: bool,
    /// Upper bound on the number of vertices.
    pub max_points: usize,
}

pub trait ShapeExtractor {
    /// Trace the outer boundary of every connected foreground region.
    fn extract_contours(&self, mask: &BinaryMask, connectivity: Connectivity) -> Vec<RawContour>;

    /// Simplify a contour to an ordered vertex sequence.
    fn fit_polygon(&self, contour: &RawContour, fit: &PolygonFit) -> Vec<PixelPoint>;

    /// Approximate a point set with an ellipse; `None` when the points are degenerate.
    fn fit_ellipse(&self, points: &[PixelPoint]) -> Option<Ellipse>;
}

impl<T: ShapeExtractor + ?Sized> ShapeExtractor for &T {
    fn extract_contours(&self, mask: &BinaryMask, connectivity: Connectivity) -> Vec<RawContour> {
        (**self).extract_contours(mask, connectivity)
    }

    fn fit_polygon(&self, contour: &RawContour, fit: &PolygonFit) -> Vec<PixelPoint> {
        (**self).fit_polygon(contour, fit)
    }

    fn fit_ellipse(&self, points: &[PixelPoint]) -> Option<Ellipse> {
        (**self).fit_ellipse(points)
    }
}

impl<T: ShapeExtractor + ?Sized> ShapeExtractor for Box<T> {
    fn extract_contours(&self, mask: &BinaryMask, connectivity: Connectivity) -> Vec<RawContour> {
        (**self).extract_contours(mask, connectivity)
    }

    fn fit_polygon(&self, contour: &RawContour, fit: &PolygonFit) -> Vec<PixelPoint> {
        (**self).fit_polygon(contour, fit)
    }

    fn fit_ellipse(&self, points: &[PixelPoint]) -> Option<Ellipse> {
        (**self).fit_ellipse(points)
    }
}
