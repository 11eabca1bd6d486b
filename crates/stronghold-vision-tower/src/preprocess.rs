use stronghold_vision_core::{BinaryMask, FrameView};

/// Mark pixels whose three channels all exceed `threshold`.
pub fn tower_mask(frame: &FrameView<'_>, threshold: u8) -> BinaryMask {
    let mut mask = BinaryMask::like(frame);
    for (dst, px) in mask.data.iter_mut().zip(frame.data.chunks_exact(3)) {
        *dst = (px[0] > threshold && px[1] > threshold && px[2] > threshold) as u8;
    }
    mask
}
