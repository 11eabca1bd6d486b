//! Built-in [`ShapeExtractor`] on top of `imageproc`: component labelling,
//! Suzuki-Abe border following, Douglas-Peucker simplification, and an
//! algebraic least-squares ellipse fit.

use ::image::{GrayImage as LumaImage, ImageBuffer, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;
use imageproc::region_labelling::{connected_components, Connectivity as Adjacency};
use nalgebra::{Matrix2, Matrix5, Point2, Vector5};

use crate::extract::{Connectivity, PolygonFit, RawContour, ShapeExtractor};
use crate::geometry::{Ellipse, PixelPoint};
use crate::image::BinaryMask;

#[cfg(feature = "tracing")]
use tracing::instrument;

const FOREGROUND: Luma<u8> = Luma([255]);
const BACKGROUND: Luma<u8> = Luma([0]);

/// Contour tracer and shape fitter that works directly on a [`BinaryMask`].
///
/// Contours are returned in raster order of each region's first pixel, so the
/// output order is deterministic for a given mask. Only outer borders are
/// reported; holes never produce a contour.
#[derive(Clone, Copy, Debug, Default)]
pub struct BorderFollowingExtractor {
    /// Regions with fewer pixels than this are skipped.
    pub min_region_pixels: usize,
}

impl BorderFollowingExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_region_pixels(mut self, n: usize) -> Self {
        self.min_region_pixels = n;
        self
    }
}

type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Extent of one labelled component.
struct Region {
    label: u32,
    start: PixelPoint,
    min: (u32, u32),
    max: (u32, u32),
    pixels: usize,
}

fn to_luma(mask: &BinaryMask) -> LumaImage {
    LumaImage::from_fn(mask.width as u32, mask.height as u32, |x, y| {
        if mask.get(x as usize, y as usize) != 0 {
            FOREGROUND
        } else {
            BACKGROUND
        }
    })
}

/// Label components and collect them in raster order of their first pixel.
fn label_regions(mask: &BinaryMask, connectivity: Connectivity) -> (LabelImage, Vec<Region>) {
    let adjacency = match connectivity {
        Connectivity::Four => Adjacency::Four,
        Connectivity::Eight => Adjacency::Eight,
    };
    let labels = connected_components(&to_luma(mask), adjacency, BACKGROUND);

    let mut slots: Vec<Option<usize>> = Vec::new();
    let mut regions: Vec<Region> = Vec::new();
    for (x, y, px) in labels.enumerate_pixels() {
        let label = px[0];
        if label == 0 {
            continue;
        }
        let slot = label as usize;
        if slot >= slots.len() {
            slots.resize(slot + 1, None);
        }
        match slots[slot] {
            Some(i) => {
                let r = &mut regions[i];
                r.min = (r.min.0.min(x), r.min.1.min(y));
                r.max = (r.max.0.max(x), r.max.1.max(y));
                r.pixels += 1;
            }
            None => {
                slots[slot] = Some(regions.len());
                regions.push(Region {
                    label,
                    start: Point2::new(x as i32, y as i32),
                    min: (x, y),
                    max: (x, y),
                    pixels: 1,
                });
            }
        }
    }
    (labels, regions)
}

/// Outer border of one region, traced on a one-pixel padded crop so other
/// regions never touch it.
fn outer_border(labels: &LabelImage, region: &Region) -> Vec<PixelPoint> {
    let (x0, y0) = region.min;
    let w = region.max.0 - x0 + 3;
    let h = region.max.1 - y0 + 3;
    let crop = LumaImage::from_fn(w, h, |x, y| {
        if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
            return BACKGROUND;
        }
        if labels.get_pixel(x0 + x - 1, y0 + y - 1)[0] == region.label {
            FOREGROUND
        } else {
            BACKGROUND
        }
    });

    let (dx, dy) = (x0 as i32 - 1, y0 as i32 - 1);
    find_contours::<i32>(&crop)
        .into_iter()
        .find(|c| c.border_type == BorderType::Outer)
        .map(|c| {
            c.points
                .into_iter()
                .map(|p| Point2::new(p.x + dx, p.y + dy))
                .collect()
        })
        .unwrap_or_else(|| vec![region.start])
}

fn bbox_diagonal(points: &[PixelPoint]) -> f64 {
    let (mut lo, mut hi) = (points[0], points[0]);
    for p in points {
        lo = Point2::new(lo.x.min(p.x), lo.y.min(p.y));
        hi = Point2::new(hi.x.max(p.x), hi.y.max(p.y));
    }
    let (dx, dy) = ((hi.x - lo.x) as f64, (hi.y - lo.y) as f64);
    (dx * dx + dy * dy).sqrt()
}

/// Douglas-Peucker on a closed loop: split at the point farthest from the
/// first one and simplify both halves as open chains.
fn simplify_closed(curve: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let origin = curve[0];
    let far = curve
        .iter()
        .enumerate()
        .max_by_key(|(_, p)| {
            let (dx, dy) = (p.x - origin.x, p.y - origin.y);
            dx * dx + dy * dy
        })
        .map_or(0, |(i, _)| i);
    if far == 0 {
        return vec![origin];
    }

    let mut back = curve[far..].to_vec();
    back.push(origin);
    let mut out = approximate_polygon_dp(&curve[..=far], epsilon, false);
    let tail = approximate_polygon_dp(&back, epsilon, false);
    out.pop(); // `far` opens the second half
    out.extend_from_slice(&tail[..tail.len() - 1]);
    out
}

fn simplify(curve: &[Point<i32>], epsilon: f64, closed: bool) -> Vec<Point<i32>> {
    if closed {
        simplify_closed(curve, epsilon)
    } else {
        approximate_polygon_dp(curve, epsilon, false)
    }
}

fn fit_polygon_points(points: &[PixelPoint], fit: &PolygonFit) -> Vec<PixelPoint> {
    let points = match points {
        [first, .., last] if points.len() > 2 && first == last => &points[..points.len() - 1],
        _ => points,
    };
    if points.len() <= 2 {
        return points.to_vec();
    }
    let max_points = fit.max_points.max(2);
    let curve: Vec<Point<i32>> = points.iter().map(|p| Point::new(p.x, p.y)).collect();

    let mut epsilon = (fit.tolerance * bbox_diagonal(points)).max(1.0);
    let mut poly = simplify(&curve, epsilon, fit.closed);
    for _ in 0..32 {
        if poly.len() <= max_points {
            break;
        }
        epsilon *= 1.5;
        poly = simplify(&curve, epsilon, fit.closed);
    }
    poly.truncate(max_points);
    poly.into_iter().map(|p| Point2::new(p.x, p.y)).collect()
}

/// Least-squares conic `a u² + b uv + c v² + d u + e v = 1` in centered,
/// scaled coordinates, converted to center, axes and orientation.
fn fit_ellipse_conic(points: &[PixelPoint]) -> Option<Ellipse> {
    if points.len() < 5 {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
    let (mx, my) = (sx / n, sy / n);
    let spread = points
        .iter()
        .map(|p| {
            let (dx, dy) = (p.x as f64 - mx, p.y as f64 - my);
            dx * dx + dy * dy
        })
        .sum::<f64>()
        / n;
    let scale = (spread / 2.0).sqrt();
    if !scale.is_finite() || scale <= 1e-9 {
        return None;
    }

    let mut ata = Matrix5::<f64>::zeros();
    let mut atb = Vector5::<f64>::zeros();
    for p in points {
        let u = (p.x as f64 - mx) / scale;
        let v = (p.y as f64 - my) / scale;
        let row = Vector5::new(u * u, u * v, v * v, u, v);
        ata += row * row.transpose();
        atb += row;
    }
    let coeffs = ata.cholesky()?.solve(&atb);
    let (a, b, c, d, e) = (coeffs[0], coeffs[1], coeffs[2], coeffs[3], coeffs[4]);

    let det = 4.0 * a * c - b * b;
    if !det.is_finite() || det <= 1e-12 {
        return None;
    }
    let u0 = (b * e - 2.0 * c * d) / det;
    let v0 = (b * d - 2.0 * a * e) / det;
    let level = 1.0 - 0.5 * (d * u0 + e * v0);

    let eig = Matrix2::new(a, 0.5 * b, 0.5 * b, c).symmetric_eigen();
    let axis = |k: usize| {
        let q = level / eig.eigenvalues[k];
        (q > 0.0).then(|| q.sqrt() * scale)
    };
    let (r0, r1) = (axis(0)?, axis(1)?);
    let (major, semi_a, semi_b) = if r0 >= r1 { (0, r0, r1) } else { (1, r1, r0) };
    let dir = eig.eigenvectors.column(major);

    Some(Ellipse {
        center: Point2::new(mx + u0 * scale, my + v0 * scale),
        semi_axis_a: semi_a,
        semi_axis_b: semi_b,
        angle: dir[1].atan2(dir[0]),
    })
}

/// Ellipse with the same second moments as the point set.
fn fit_ellipse_moments(points: &[PixelPoint]) -> Option<Ellipse> {
    if points.len() < 3 {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
    let (mx, my) = (sx / n, sy / n);

    let (mut cxx, mut cxy, mut cyy) = (0.0, 0.0, 0.0);
    for p in points {
        let dx = p.x as f64 - mx;
        let dy = p.y as f64 - my;
        cxx += dx * dx;
        cxy += dx * dy;
        cyy += dy * dy;
    }
    let cov = Matrix2::new(cxx / n, cxy / n, cxy / n, cyy / n);
    let eig = cov.symmetric_eigen();
    let (major, minor) = if eig.eigenvalues[0] >= eig.eigenvalues[1] {
        (0, 1)
    } else {
        (1, 0)
    };
    let l_major = eig.eigenvalues[major];
    let l_minor = eig.eigenvalues[minor];
    if !l_major.is_finite() || !l_minor.is_finite() || l_minor <= 1e-9 {
        return None;
    }
    let axis = eig.eigenvectors.column(major);

    // Points spread along an ellipse boundary have variance a^2/2 per axis.
    Some(Ellipse {
        center: Point2::new(mx, my),
        semi_axis_a: (2.0 * l_major).sqrt(),
        semi_axis_b: (2.0 * l_minor).sqrt(),
        angle: axis[1].atan2(axis[0]),
    })
}

impl ShapeExtractor for BorderFollowingExtractor {
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, mask), fields(width = mask.width, height = mask.height))
    )]
    fn extract_contours(&self, mask: &BinaryMask, connectivity: Connectivity) -> Vec<RawContour> {
        if mask.width == 0 || mask.height == 0 || mask.data.len() != mask.width * mask.height {
            return Vec::new();
        }
        let (labels, regions) = label_regions(mask, connectivity);
        regions
            .iter()
            .filter(|r| r.pixels >= self.min_region_pixels)
            .map(|r| RawContour::new(outer_border(&labels, r)))
            .collect()
    }

    fn fit_polygon(&self, contour: &RawContour, fit: &PolygonFit) -> Vec<PixelPoint> {
        fit_polygon_points(&contour.points, fit)
    }

    fn fit_ellipse(&self, points: &[PixelPoint]) -> Option<Ellipse> {
        // Degenerate spreads have no ellipse at all; the conic fit only refines.
        let moments = fit_ellipse_moments(points)?;
        let limit = 4.0 * moments.semi_axis_a.max(1.0);
        Some(
            fit_ellipse_conic(points)
                .filter(|e| e.semi_axis_a.is_finite() && e.semi_axis_a <= limit)
                .unwrap_or(moments),
        )
    }
}
