//! Tower marker detector.
//!
//! ## Quickstart
//!
//! ```
//! use stronghold_vision_core::{BorderFollowingExtractor, Frame};
//! use stronghold_vision_tower::{TowerDetector, TowerParams};
//!
//! let frame = Frame::filled(64, 48, [0, 0, 0]);
//! let detector = TowerDetector::new(TowerParams::default());
//! let detection = detector.detect(&frame.view(), &BorderFollowingExtractor::new());
//! assert!(detection.target().is_none());
//! ```
//!
//! Per frame:
//! 1. Keep pixels whose three channels all exceed 230.
//! 2. Trace contours (8-connectivity) and fit closed polygons.
//! 3. Merge near-duplicate vertices, then keep polygons with 6 to 8 vertices.
//! 4. Report the center of the most square survivor.

mod detector;
mod evaluate;
mod params;
mod preprocess;
mod select;

pub use detector::{TowerDetection, TowerDetector};
pub use evaluate::{evaluate_tower_contours, is_tower_shape, smooth_vertices, TowerCandidate};
pub use params::TowerParams;
pub use preprocess::tower_mask;
pub use select::select_squarest;
