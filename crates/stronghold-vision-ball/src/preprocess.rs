use stronghold_vision_core::{threshold_local_square, BinaryMask, FrameView, GrayImage};

use crate::params::{BallParams, RegionOfInterest, ValueChannel};

/// Value channel inside the region of interest, zero elsewhere; values below `floor` are zeroed.
pub fn roi_value_image(
    frame: &FrameView<'_>,
    roi: &RegionOfInterest,
    channel: ValueChannel,
    floor: u8,
) -> GrayImage {
    let mut out = GrayImage::zeros(frame.width, frame.height);
    for y in 0..frame.height {
        for x in 0..frame.width {
            if !roi.contains(x, y) {
                continue;
            }
            let v = channel.sample(frame.pixel(x, y));
            if v >= floor {
                out.set(x, y, v);
            }
        }
    }
    out
}

/// Ball preprocessing: ROI crop, value floor, adaptive threshold.
///
/// Pixels outside the region of interest are always background.
pub fn ball_mask(frame: &FrameView<'_>, params: &BallParams) -> BinaryMask {
    let value = roi_value_image(frame, &params.roi, params.value_channel, params.value_floor);
    let mut mask = threshold_local_square(
        &value,
        params.threshold_radius,
        params.threshold_scale,
        params.threshold_polarity,
    );
    for y in 0..mask.height {
        for x in 0..mask.width {
            if !params.roi.contains(x, y) {
                mask.set(x, y, false);
            }
        }
    }
    mask
}
