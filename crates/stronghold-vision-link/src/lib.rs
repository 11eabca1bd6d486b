//! Everything between a selected target and the bytes on the wire.
//!
//! - [`HistorySmoother`] applies per-target temporal smoothing.
//! - [`encode_payload`] writes the fixed big-endian layout with telemetry appended.
//! - [`TelemetryChannel`] holds the latest telemetry block and gates capture on fresh data.
//!
//! ```
//! use stronghold_vision_core::{Reading, TargetKind};
//! use stronghold_vision_link::{encode_payload, PayloadLayout};
//!
//! let reading = Reading::detection(TargetKind::Tower, &[160, 90]);
//! let bytes = encode_payload(&PayloadLayout::TOWER, &reading, &[0; 8]).unwrap();
//! assert_eq!(bytes.len(), 20);
//! assert_eq!(&bytes[..4], &[0, 0, 0, 1]);
//! ```

mod encode;
mod error;
mod history;
mod telemetry;

pub use encode::{
    decode_payload, encode_payload, DecodedPayload, PayloadLayout, TelemetryBlock, TELEMETRY_LEN,
};
pub use error::LinkError;
pub use history::{HistorySmoother, HistoryState, SmoothingPolicy};
pub use telemetry::{TelemetryChannel, TelemetrySample, TelemetryWait};
