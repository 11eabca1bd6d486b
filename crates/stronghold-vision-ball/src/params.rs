use serde::{Deserialize, Serialize};
use stronghold_vision_core::{Connectivity, PolygonFit, ThresholdPolarity};

/// Fixed rectangular search region. Both bounds are inclusive.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl RegionOfInterest {
    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x - self.x <= self.width && y >= self.y && y - self.y <= self.height
    }

    /// Whether the inclusive far corner is representable.
    pub fn is_bounded(&self) -> bool {
        self.x.checked_add(self.width).is_some() && self.y.checked_add(self.height).is_some()
    }

    /// Smaller of width and height.
    pub fn min_side(&self) -> usize {
        self.width.min(self.height)
    }
}

/// Source of the single value channel that gets thresholded.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueChannel {
    Red,
    Green,
    Blue,
    /// HSV value, `max(r, g, b)`.
    HsvValue,
}

impl ValueChannel {
    #[inline]
    pub fn sample(self, rgb: [u8; 3]) -> u8 {
        match self {
            ValueChannel::Red => rgb[0],
            ValueChannel::Green => rgb[1],
            ValueChannel::Blue => rgb[2],
            ValueChannel::HsvValue => rgb[0].max(rgb[1]).max(rgb[2]),
        }
    }
}

/// Parameters of the ball detector.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BallParams {
    pub roi: RegionOfInterest,
    pub value_channel: ValueChannel,
    /// Values below this are zeroed before adaptive thresholding.
    pub value_floor: u8,
    /// Half-size of the local mean window.
    pub threshold_radius: usize,
    pub threshold_scale: f32,
    pub threshold_polarity: ThresholdPolarity,
    pub connectivity: Connectivity,
    pub polygon_fit: PolygonFit,
    /// Accept ellipses whose long/short axis ratio is strictly below this.
    pub max_aspect_ratio: f64,
    /// Accept ellipses whose average radius is strictly above this (pixels).
    pub min_average_radius: f64,
}

impl Default for BallParams {
    fn default() -> Self {
        Self {
            roi: RegionOfInterest {
                x: 50,
                y: 70,
                width: 220,
                height: 130,
            },
            value_channel: ValueChannel::Blue,
            value_floor: 110,
            threshold_radius: 20,
            threshold_scale: 0.98,
            threshold_polarity: ThresholdPolarity::Bright,
            connectivity: Connectivity::Eight,
            polygon_fit: PolygonFit {
                tolerance: 0.05,
                closed: false,
                max_points: 180,
            },
            max_aspect_ratio: 1.2,
            min_average_radius: 30.0,
        }
    }
}
