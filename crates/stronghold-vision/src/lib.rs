//! Facade crate for the `stronghold-vision-*` workspace.
//!
//! This crate provides:
//! - re-exports of the core, tower, ball and link crates
//! - the telemetry-gated [`Pipeline`] driver and its collaborator traits
//! - JSON configuration ([`PipelineConfig`])
//! - a best-effort debug display that dumps annotated PNGs
//!
//! ## Quickstart
//!
//! ```no_run
//! use std::sync::{mpsc, Arc};
//! use stronghold_vision::{CollaboratorError, Pipeline, PipelineConfig};
//! use stronghold_vision::core::Frame;
//! use stronghold_vision::link::TelemetryChannel;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let telemetry = Arc::new(TelemetryChannel::new());
//! let (tx, rx) = mpsc::channel();
//! let camera = || -> Result<Frame, CollaboratorError> { Ok(Frame::filled(320, 240, [0, 0, 0])) };
//!
//! let pipeline = Pipeline::new(&PipelineConfig::default(), Arc::clone(&telemetry), camera, tx)?;
//! let (stop, worker) = pipeline.spawn()?;
//!
//! telemetry.publish([0; 8]);
//! let payload = rx.recv()?;
//! assert_eq!(payload.len(), 20);
//!
//! stop.stop();
//! worker.join().ok();
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `stronghold_vision::core`: frames, masks, geometry, readings, the shape extractor.
//! - `stronghold_vision::tower`: tower preprocessing, evaluation and selection.
//! - `stronghold_vision::ball`: ball preprocessing, evaluation and selection.
//! - `stronghold_vision::link`: smoothing, payload encoding, telemetry hand-off.

pub use stronghold_vision_ball as ball;
pub use stronghold_vision_core as core;
pub use stronghold_vision_link as link;
pub use stronghold_vision_tower as tower;

mod config;
mod display;
mod error;
mod pipeline;

pub use config::{DisplayConfig, PipelineConfig};
pub use display::{annotate, open_display, DebugDisplay, ImageDumpDisplay, Overlay};
pub use error::{CollaboratorError, ConfigError, DisplayError, PipelineError};
pub use pipeline::{
    CycleOutcome, CycleReport, FrameSource, NetworkSink, Pipeline, PipelineState, StopHandle,
};

pub use stronghold_vision_core::{Reading, TargetKind};

/// Convert a decoded `image` crate buffer into a pipeline frame.
pub fn frame_from_rgb(img: &image::RgbImage) -> Result<core::Frame, core::ImageError> {
    core::Frame::new(
        img.width() as usize,
        img.height() as usize,
        img.as_raw().clone(),
    )
}
