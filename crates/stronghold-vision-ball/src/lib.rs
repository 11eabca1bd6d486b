//! Ball detector.
//!
//! Per frame:
//! 1. Take one value channel inside a fixed region of interest; zero everything else.
//! 2. Zero values below a floor, then binarize against a local square mean.
//! 3. Trace contours, fit open polygons, approximate each with an ellipse.
//! 4. Keep round (ratio < 1.2), large enough (radius > 30) ellipses that still
//!    fit inside the region, and report the one with the largest area.
//!
//! The value channel is a parameter ([`ValueChannel`]). The default reads the
//! blue channel directly; [`ValueChannel::HsvValue`] uses the HSV value
//! `max(r, g, b)` instead.

mod detector;
mod evaluate;
mod params;
mod preprocess;
mod select;

pub use detector::{BallDetection, BallDetector};
pub use evaluate::{evaluate_ball_contours, is_ball_shape, BallCandidate};
pub use params::{BallParams, RegionOfInterest, ValueChannel};
pub use preprocess::{ball_mask, roi_value_image};
pub use select::select_largest;
