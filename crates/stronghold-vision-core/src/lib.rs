//! Core types for the stronghold target pipeline.
//!
//! Frames, binary masks, pixel geometry, target readings, adaptive
//! thresholding, and the [`ShapeExtractor`] capability the detectors consume.
//! Target-specific rules live in the tower and ball crates.

mod contour;
mod extract;
mod geometry;
mod image;
mod logger;
mod target;
mod threshold;

pub use contour::BorderFollowingExtractor;
pub use extract::{Connectivity, PolygonFit, RawContour, ShapeExtractor};
pub use geometry::{BoundingBox, Ellipse, PixelPoint};
pub use image::{BinaryMask, Frame, FrameView, GrayImage, ImageError};
pub use target::{Reading, TargetKind, BALL_FLAG, TOWER_FLAG};
pub use threshold::{threshold_local_square, ThresholdPolarity};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
