use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use stronghold_vision_core::{BoundingBox, PixelPoint, RawContour, ShapeExtractor};

use crate::params::TowerParams;

/// Polygon that passed the tower vertex rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerCandidate {
    pub vertices: Vec<PixelPoint>,
    pub bounds: BoundingBox,
}

impl TowerCandidate {
    /// Build from a smoothed polygon; `None` for an empty vertex list.
    pub fn from_vertices(vertices: Vec<PixelPoint>) -> Option<Self> {
        let bounds = BoundingBox::from_points(&vertices)?;
        Some(Self { vertices, bounds })
    }

    pub fn squareness(&self) -> f64 {
        self.bounds.squareness()
    }

    pub fn center(&self) -> PixelPoint {
        self.bounds.center()
    }
}

fn distance(a: PixelPoint, b: PixelPoint) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

fn mean_point(points: &[PixelPoint]) -> PixelPoint {
    let n = points.len().max(1) as f64;
    let (sx, sy) = points
        .iter()
        .fold((0i64, 0i64), |(sx, sy), p| (sx + p.x as i64, sy + p.y as i64));
    Point2::new(
        (sx as f64 / n).round() as i32,
        (sy as f64 / n).round() as i32,
    )
}

/// Merge runs of consecutive vertices closer than `window` into their mean.
///
/// The vertex sequence is treated as closed: a run that wraps from the last
/// vertex into the first is merged too.
pub fn smooth_vertices(vertices: &[PixelPoint], window: f64) -> Vec<PixelPoint> {
    if vertices.len() < 2 || window <= 0.0 {
        return vertices.to_vec();
    }

    let mut runs: Vec<Vec<PixelPoint>> = vec![vec![vertices[0]]];
    for pair in vertices.windows(2) {
        if distance(pair[0], pair[1]) < window {
            if let Some(run) = runs.last_mut() {
                run.push(pair[1]);
            }
        } else {
            runs.push(vec![pair[1]]);
        }
    }

    let (first, last) = (vertices[0], vertices[vertices.len() - 1]);
    if runs.len() > 1 && distance(last, first) < window {
        if let Some(mut tail) = runs.pop() {
            tail.extend_from_slice(&runs[0]);
            runs[0] = tail;
        }
    }

    runs.iter().map(|run| mean_point(run)).collect()
}

/// Vertex-count rule: strictly between the configured bounds.
#[inline]
pub fn is_tower_shape(vertex_count: usize, params: &TowerParams) -> bool {
    vertex_count > params.min_vertices_exclusive && vertex_count < params.max_vertices_exclusive
}

/// Fit, smooth and filter every contour; keeps extraction order.
pub fn evaluate_tower_contours<X: ShapeExtractor + ?Sized>(
    contours: &[RawContour],
    extractor: &X,
    params: &TowerParams,
) -> Vec<TowerCandidate> {
    contours
        .iter()
        .filter_map(|contour| {
            let fitted = extractor.fit_polygon(contour, &params.polygon_fit);
            let smoothed = smooth_vertices(&fitted, params.smoothing_window);
            log::trace!(
                "tower polygon: {} fitted, {} after smoothing",
                fitted.len(),
                smoothed.len()
            );
            if !is_tower_shape(smoothed.len(), params) {
                return None;
            }
            TowerCandidate::from_vertices(smoothed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pts(raw: &[(i32, i32)]) -> Vec<PixelPoint> {
        raw.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    #[test]
    fn vertex_count_bounds_are_exclusive() {
        let params = TowerParams::default();
        let accepted: Vec<usize> = (0..12).filter(|&n| is_tower_shape(n, &params)).collect();
        assert_eq!(accepted, vec![6, 7, 8]);
    }

    #[test]
    fn smoothing_merges_close_neighbours() {
        let poly = pts(&[(0, 0), (3, 0), (50, 0), (50, 50), (0, 50)]);
        let smoothed = smooth_vertices(&poly, 10.0);
        assert_eq!(smoothed, pts(&[(2, 0), (50, 0), (50, 50), (0, 50)]));
    }

    #[test]
    fn smoothing_wraps_around_the_loop() {
        let poly = pts(&[(0, 0), (50, 0), (50, 50), (0, 50), (0, 4)]);
        let smoothed = smooth_vertices(&poly, 10.0);
        assert_eq!(smoothed, pts(&[(0, 2), (50, 0), (50, 50), (0, 50)]));
    }

    #[test]
    fn smoothing_keeps_well_separated_vertices() {
        let poly = pts(&[(0, 0), (40, 0), (40, 40), (0, 40)]);
        assert_eq!(smooth_vertices(&poly, 10.0), poly);
        assert_eq!(smooth_vertices(&poly, 0.0), poly);
    }

    #[test]
    fn candidate_metrics_follow_bounding_box() {
        let c = TowerCandidate::from_vertices(pts(&[(120, 50), (200, 50), (200, 130), (120, 130)]))
            .unwrap();
        assert_eq!(c.center(), Point2::new(160, 90));
        assert_relative_eq!(c.squareness(), 1.0);
        let wide = TowerCandidate::from_vertices(pts(&[(0, 0), (80, 0), (80, 40), (0, 40)])).unwrap();
        assert_relative_eq!(wide.squareness(), 0.5);
        assert!(TowerCandidate::from_vertices(Vec::new()).is_none());
    }
}
