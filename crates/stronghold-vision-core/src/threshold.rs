//! Adaptive binarization against a local square mean.

use serde::{Deserialize, Serialize};

use crate::image::{BinaryMask, GrayImage};

/// Which side of the local threshold counts as foreground.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdPolarity {
    /// `value > mean * scale`
    Bright,
    /// `value <= mean * scale`
    Dark,
}

/// Summed-area table with a one-pixel zero border.
struct Integral {
    stride: usize,
    sums: Vec<u64>,
}

impl Integral {
    fn new(img: &GrayImage) -> Self {
        let stride = img.width + 1;
        let mut sums = vec![0u64; stride * (img.height + 1)];
        for y in 0..img.height {
            let mut row = 0u64;
            for x in 0..img.width {
                row += img.get(x, y) as u64;
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row;
            }
        }
        Self { stride, sums }
    }

    /// Sum over the inclusive rectangle `[x0, x1] x [y0, y1]`.
    #[inline]
    fn sum(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> u64 {
        let s = self.stride;
        self.sums[(y1 + 1) * s + x1 + 1] + self.sums[y0 * s + x0]
            - self.sums[y0 * s + x1 + 1]
            - self.sums[(y1 + 1) * s + x0]
    }
}

/// Threshold every pixel against the mean of the `(2r+1)^2` window around it.
///
/// The window is clipped at the image border, so edge pixels use fewer samples.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(img), fields(width = img.width, height = img.height))
)]
pub fn threshold_local_square(
    img: &GrayImage,
    radius: usize,
    scale: f32,
    polarity: ThresholdPolarity,
) -> BinaryMask {
    let mut out = BinaryMask::zeros(img.width, img.height);
    if img.width == 0 || img.height == 0 {
        return out;
    }
    let integral = Integral::new(img);

    for y in 0..img.height {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius).min(img.height - 1);
        for x in 0..img.width {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius).min(img.width - 1);
            let count = ((x1 - x0 + 1) * (y1 - y0 + 1)) as f32;
            let mean = integral.sum(x0, y0, x1, y1) as f32 / count;
            let v = img.get(x, y) as f32;
            let on = match polarity {
                ThresholdPolarity::Bright => v > mean * scale,
                ThresholdPolarity::Dark => v <= mean * scale,
            };
            out.set(x, y, on);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_from(width: usize, height: usize, f: impl Fn(usize, usize) -> u8) -> GrayImage {
        let mut img = GrayImage::zeros(width, height);
        for y in 0..height {
            for x in 0..width {
                img.set(x, y, f(x, y));
            }
        }
        img
    }

    #[test]
    fn bright_blob_on_dark_background_is_foreground() {
        let img = gray_from(40, 40, |x, y| {
            if (15..25).contains(&x) && (15..25).contains(&y) {
                200
            } else {
                0
            }
        });
        let mask = threshold_local_square(&img, 5, 0.98, ThresholdPolarity::Bright);
        assert_eq!(mask.get(20, 20), 1);
        assert_eq!(mask.get(2, 2), 0);
        assert_eq!(mask.count_ones(), 100);
    }

    #[test]
    fn dark_polarity_marks_uniform_regions() {
        let img = gray_from(10, 10, |_, _| 120);
        let dark = threshold_local_square(&img, 3, 0.98, ThresholdPolarity::Dark);
        let bright = threshold_local_square(&img, 3, 0.98, ThresholdPolarity::Bright);
        assert_eq!(dark.count_ones(), 0);
        assert_eq!(bright.count_ones(), 100);
    }

    #[test]
    fn empty_image_gives_empty_mask() {
        let mask = threshold_local_square(&GrayImage::zeros(0, 0), 20, 0.98, ThresholdPolarity::Bright);
        assert!(mask.data.is_empty());
    }
}
