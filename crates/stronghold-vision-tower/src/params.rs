use serde::{Deserialize, Serialize};
use stronghold_vision_core::{Connectivity, PolygonFit};

/// Parameters of the tower detector.
///
/// Defaults are the tuned competition constants; a detector takes ownership
/// of its params at construction and never changes them.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TowerParams {
    /// A pixel is foreground iff all three channels are strictly above this value.
    pub channel_threshold: u8,
    pub connectivity: Connectivity,
    pub polygon_fit: PolygonFit,
    /// Consecutive vertices closer than this (pixels) are merged.
    pub smoothing_window: f64,
    /// Accept polygons with strictly more vertices than this...
    pub min_vertices_exclusive: usize,
    /// ...and strictly fewer than this.
    pub max_vertices_exclusive: usize,
}

impl Default for TowerParams {
    fn default() -> Self {
        Self {
            channel_threshold: 230,
            connectivity: Connectivity::Eight,
            polygon_fit: PolygonFit {
                tolerance: 0.05,
                closed: true,
                max_points: 100,
            },
            smoothing_window: 10.0,
            min_vertices_exclusive: 5,
            max_vertices_exclusive: 9,
        }
    }
}
