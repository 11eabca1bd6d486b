use serde::Serialize;
use stronghold_vision_core::{BinaryMask, FrameView, Reading, ShapeExtractor, TargetKind};

use crate::evaluate::{evaluate_ball_contours, BallCandidate};
use crate::params::BallParams;
use crate::preprocess::ball_mask;
use crate::select::select_largest;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Output of one ball detection pass.
#[derive(Clone, Debug, Serialize)]
pub struct BallDetection {
    /// Accepted candidates in extraction order.
    pub candidates: Vec<BallCandidate>,
    /// Index into `candidates` of the selected target.
    pub selected: Option<usize>,
}

impl BallDetection {
    pub fn target(&self) -> Option<&BallCandidate> {
        self.selected.and_then(|i| self.candidates.get(i))
    }

    /// `[BALL_FLAG, radius, x, y]`, or the flag and zeros without a target.
    pub fn reading(&self) -> Reading {
        match self.target() {
            Some(ball) => {
                let c = ball.center();
                Reading::detection(TargetKind::Ball, &[ball.radius_px(), c.x, c.y])
            }
            None => Reading::empty(TargetKind::Ball),
        }
    }
}

/// Ball detector: ROI value threshold, ellipse fit, roundness filter, largest area wins.
#[derive(Clone, Debug, Default)]
pub struct BallDetector {
    params: BallParams,
}

impl BallDetector {
    pub fn new(params: BallParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &BallParams {
        &self.params
    }

    pub fn preprocess(&self, frame: &FrameView<'_>) -> BinaryMask {
        ball_mask(frame, &self.params)
    }

    /// Run extraction, evaluation and selection on an already thresholded mask.
    pub fn detect_in_mask<X: ShapeExtractor + ?Sized>(
        &self,
        mask: &BinaryMask,
        extractor: &X,
    ) -> BallDetection {
        let contours = extractor.extract_contours(mask, self.params.connectivity);
        let candidates = evaluate_ball_contours(&contours, extractor, &self.params);
        let selected = select_largest(&candidates);
        log::debug!(
            "ball: {} contours, {} accepted, selected {:?}",
            contours.len(),
            candidates.len(),
            selected
        );
        BallDetection {
            candidates,
            selected,
        }
    }

    /// Full pass from a frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame, extractor), fields(width = frame.width, height = frame.height))
    )]
    pub fn detect<X: ShapeExtractor + ?Sized>(
        &self,
        frame: &FrameView<'_>,
        extractor: &X,
    ) -> BallDetection {
        if let Err(e) = frame.validate() {
            log::warn!("ball: skipping malformed frame: {e}");
            return BallDetection {
                candidates: Vec::new(),
                selected: None,
            };
        }
        let mask = self.preprocess(frame);
        self.detect_in_mask(&mask, extractor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;
    use stronghold_vision_core::{
        Connectivity, Ellipse, PixelPoint, PolygonFit, RawContour, BALL_FLAG,
    };

    /// One contour per canned ellipse; fitting returns the ellipse for that contour.
    struct Canned(Vec<Ellipse>);

    impl ShapeExtractor for Canned {
        fn extract_contours(&self, _: &BinaryMask, _: Connectivity) -> Vec<RawContour> {
            (0..self.0.len())
                .map(|i| RawContour::new(vec![Point2::new(i as i32, 0)]))
                .collect()
        }

        fn fit_polygon(&self, contour: &RawContour, _: &PolygonFit) -> Vec<PixelPoint> {
            contour.points.clone()
        }

        fn fit_ellipse(&self, points: &[PixelPoint]) -> Option<Ellipse> {
            self.0.get(points.first()?.x as usize).copied()
        }
    }

    fn circle_with_area(x: f64, y: f64, area: f64) -> Ellipse {
        let r = (area / std::f64::consts::PI).sqrt();
        Ellipse::new(Point2::new(x, y), r, r)
    }

    #[test]
    fn larger_of_two_accepted_balls_is_selected() {
        // radii ~31.9 and ~41.4 px: both pass the size floor
        let small = circle_with_area(100.0, 120.0, 3200.0);
        let large = circle_with_area(180.0, 140.0, 5400.0);
        let det = BallDetector::default();
        let out = det.detect_in_mask(&BinaryMask::zeros(1, 1), &Canned(vec![small, large]));
        assert_eq!(out.candidates.len(), 2);
        assert_eq!(out.selected, Some(1));
        assert_eq!(out.reading().values, vec![BALL_FLAG, 41, 180, 140]);
    }

    #[test]
    fn elongated_and_tiny_ellipses_are_rejected() {
        let det = BallDetector::default();
        let stretched = Ellipse::new(Point2::new(100.0, 100.0), 60.0, 40.0);
        let tiny = Ellipse::new(Point2::new(100.0, 100.0), 10.0, 10.0);
        let out = det.detect_in_mask(&BinaryMask::zeros(1, 1), &Canned(vec![stretched, tiny]));
        assert!(out.target().is_none());
        assert_eq!(out.reading().values, vec![BALL_FLAG, 0, 0, 0]);
    }

    #[test]
    fn malformed_frame_yields_no_target() {
        let data = [0u8; 100];
        let frame = FrameView {
            width: 320,
            height: 240,
            data: &data,
        };
        let out = BallDetector::default().detect(&frame, &Canned(Vec::new()));
        assert!(out.candidates.is_empty());
        assert_eq!(out.reading().flag(), Some(BALL_FLAG));
        assert!(!out.reading().detected);
    }
}
