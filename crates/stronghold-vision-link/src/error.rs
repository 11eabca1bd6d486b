use stronghold_vision_core::TargetKind;

/// Errors raised while smoothing, encoding or decoding readings.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum LinkError {
    #[error("reading has {got} values, layout expects {expected}")]
    ValueCount { expected: usize, got: usize },

    #[error("reading is for {got}, expected {expected}")]
    KindMismatch {
        expected: TargetKind,
        got: TargetKind,
    },

    #[error("field block of {got} bytes cannot hold {needed} bytes of values")]
    LayoutTooSmall { needed: usize, got: usize },

    #[error("payload is {got} bytes, layout expects {expected}")]
    PayloadLength { expected: usize, got: usize },
}
