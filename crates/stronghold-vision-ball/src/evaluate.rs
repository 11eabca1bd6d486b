use serde::{Deserialize, Serialize};
use stronghold_vision_core::{Ellipse, PixelPoint, RawContour, ShapeExtractor};

use crate::params::BallParams;

/// Ellipse that passed the ball acceptance rule.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BallCandidate {
    pub ellipse: Ellipse,
}

impl BallCandidate {
    pub fn area(&self) -> f64 {
        self.ellipse.area()
    }

    pub fn average_radius(&self) -> f64 {
        self.ellipse.average_radius()
    }

    pub fn center(&self) -> PixelPoint {
        self.ellipse.pixel_center()
    }

    /// Rounded average radius as reported on the wire.
    pub fn radius_px(&self) -> i32 {
        self.average_radius().round() as i32
    }
}

/// Roundness, minimum size, and "not larger than the search region".
pub fn is_ball_shape(ellipse: &Ellipse, params: &BallParams) -> bool {
    let ratio = ellipse.aspect_ratio();
    let avg = ellipse.average_radius();
    let limit = params.roi.min_side() as f64;
    ratio < params.max_aspect_ratio && avg > params.min_average_radius && avg <= limit
}

/// Fit every contour to an ellipse and keep the ones that look like a ball.
pub fn evaluate_ball_contours<X: ShapeExtractor + ?Sized>(
    contours: &[RawContour],
    extractor: &X,
    params: &BallParams,
) -> Vec<BallCandidate> {
    contours
        .iter()
        .filter_map(|contour| {
            let vertices = extractor.fit_polygon(contour, &params.polygon_fit);
            let ellipse = extractor.fit_ellipse(&vertices)?;
            log::trace!(
                "ball ellipse: ratio {:.3}, radius {:.1}",
                ellipse.aspect_ratio(),
                ellipse.average_radius()
            );
            is_ball_shape(&ellipse, params).then_some(BallCandidate { ellipse })
        })
        .collect()
}
