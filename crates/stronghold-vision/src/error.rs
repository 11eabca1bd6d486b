use std::path::PathBuf;

use stronghold_vision_core::ImageError;
use stronghold_vision_link::LinkError;

/// Boxed error returned by external collaborators (frame source, network sink).
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Failures inside a pipeline cycle.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Debug display failures. Never fatal to the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum DisplayError {
    #[error("cannot prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("display is unavailable: {0}")]
    Unavailable(String),

    #[error("cannot annotate frame: {0}")]
    Frame(#[from] ImageError),

    #[error(transparent)]
    Encode(#[from] image::ImageError),
}
