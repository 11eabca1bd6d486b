//! Best-effort debug display.
//!
//! The pipeline hands each processed frame plus an [`Overlay`] to a
//! [`DebugDisplay`]. Failures are logged by the caller and never stop the loop.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_hollow_ellipse_mut, draw_line_segment_mut};
use stronghold_vision_core::{Ellipse, Frame, ImageError, PixelPoint, Reading};

use crate::config::DisplayConfig;
use crate::error::DisplayError;

/// Shape drawn on top of a frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Overlay {
    None,
    Polygon(Vec<PixelPoint>),
    Ellipse(Ellipse),
}

pub trait DebugDisplay {
    fn show(&mut self, frame: &Frame, overlay: &Overlay, reading: &Reading)
        -> Result<(), DisplayError>;
}

/// Open the display described by `cfg`: PNG dumps into `output_dir`
/// (`debug_frames` when unset).
pub fn open_display(cfg: &DisplayConfig) -> Result<Box<dyn DebugDisplay + Send>, DisplayError> {
    let dir = cfg
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("debug_frames"));
    Ok(Box::new(ImageDumpDisplay::create(dir)?))
}

const OUTLINE: Rgb<u8> = Rgb([0, 255, 0]);
const CROSS: Rgb<u8> = Rgb([255, 0, 0]);

fn to_rgb(frame: &Frame) -> Result<RgbImage, DisplayError> {
    frame.validate()?;
    let dims = u32::try_from(frame.width).ok().zip(u32::try_from(frame.height).ok());
    dims.and_then(|(w, h)| RgbImage::from_raw(w, h, frame.data.clone()))
        .ok_or(DisplayError::Frame(ImageError::InvalidDimensions {
            width: frame.width,
            height: frame.height,
        }))
}

fn draw_ellipse(canvas: &mut RgbImage, e: &Ellipse) {
    let c = e.pixel_center();
    let quarter = std::f64::consts::FRAC_PI_2;
    let turns = e.angle / quarter;
    let axis_aligned = (turns - turns.round()).abs() < 1e-3;
    if axis_aligned || (e.semi_axis_a - e.semi_axis_b).abs() < 0.5 {
        let (a, b) = (e.semi_axis_a.round() as i32, e.semi_axis_b.round() as i32);
        let (rx, ry) = if (turns.round() as i64).rem_euclid(2) == 0 {
            (a, b)
        } else {
            (b, a)
        };
        draw_hollow_ellipse_mut(canvas, (c.x, c.y), rx, ry, OUTLINE);
        return;
    }
    let steps = ((e.semi_axis_a + e.semi_axis_b) * 2.0).clamp(16.0, 360.0) as usize;
    let at = |k: usize| {
        let p = e.point_at(std::f64::consts::TAU * k as f64 / steps as f64);
        (p.x as f32, p.y as f32)
    };
    for k in 0..steps {
        draw_line_segment_mut(canvas, at(k), at(k + 1), OUTLINE);
    }
}

/// Frame as an RGB image with the overlay outline and a cross at the reported center.
pub fn annotate(
    frame: &Frame,
    overlay: &Overlay,
    reading: &Reading,
) -> Result<RgbImage, DisplayError> {
    let mut canvas = to_rgb(frame)?;
    match overlay {
        Overlay::None => {}
        Overlay::Polygon(vertices) => {
            for (i, a) in vertices.iter().enumerate() {
                let b = &vertices[(i + 1) % vertices.len()];
                draw_line_segment_mut(
                    &mut canvas,
                    (a.x as f32, a.y as f32),
                    (b.x as f32, b.y as f32),
                    OUTLINE,
                );
            }
        }
        Overlay::Ellipse(e) => draw_ellipse(&mut canvas, e),
    }
    let fields = reading.fields();
    if reading.detected && fields.len() >= 2 {
        // center is always the last two fields
        let (x, y) = (fields[fields.len() - 2], fields[fields.len() - 1]);
        draw_cross_mut(&mut canvas, CROSS, x, y);
    }
    Ok(canvas)
}

/// Writes every annotated frame as `frame_NNNNNN.png` into a directory.
#[derive(Debug)]
pub struct ImageDumpDisplay {
    dir: PathBuf,
    counter: u64,
}

impl ImageDumpDisplay {
    /// Create the output directory if needed.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self, DisplayError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| DisplayError::OutputDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir, counter: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DebugDisplay for ImageDumpDisplay {
    fn show(
        &mut self,
        frame: &Frame,
        overlay: &Overlay,
        reading: &Reading,
    ) -> Result<(), DisplayError> {
        let img = annotate(frame, overlay, reading)?;
        let path = self.dir.join(format!("frame_{:06}.png", self.counter));
        img.save(&path)?;
        self.counter += 1;
        log::trace!("display: wrote {}", path.display());
        Ok(())
    }
}
