use serde::{Deserialize, Serialize};
use stronghold_vision_core::{Reading, TargetKind};

use crate::error::LinkError;

/// Size of the telemetry block appended to every payload.
pub const TELEMETRY_LEN: usize = 8;

/// Opaque telemetry bytes copied verbatim into the payload.
pub type TelemetryBlock = [u8; TELEMETRY_LEN];

/// Byte layout of an outbound payload.
///
/// `value_count` big-endian `i32`s fill the start of a `field_block_len`
/// byte region (remaining bytes zero), followed by the telemetry block.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PayloadLayout {
    pub value_count: usize,
    pub field_block_len: usize,
}

impl PayloadLayout {
    /// `[flag, x, y]` in 12 bytes, telemetry at offset 12, 20 bytes total.
    pub const TOWER: Self = Self {
        value_count: 3,
        field_block_len: 12,
    };

    /// `[flag, radius, x, y]` in 16 bytes, telemetry at offset 16, 24 bytes total.
    pub const BALL: Self = Self {
        value_count: 4,
        field_block_len: 16,
    };

    pub const fn for_target(kind: TargetKind) -> Self {
        match kind {
            TargetKind::Tower => Self::TOWER,
            TargetKind::Ball => Self::BALL,
        }
    }

    #[inline]
    pub const fn telemetry_offset(&self) -> usize {
        self.field_block_len
    }

    #[inline]
    pub const fn total_len(&self) -> usize {
        self.field_block_len + TELEMETRY_LEN
    }

    pub fn validate(&self) -> Result<(), LinkError> {
        let needed = self.value_count * 4;
        if self.field_block_len < needed {
            return Err(LinkError::LayoutTooSmall {
                needed,
                got: self.field_block_len,
            });
        }
        Ok(())
    }
}

/// Serialize a reading and the telemetry block into a fresh payload.
pub fn encode_payload(
    layout: &PayloadLayout,
    reading: &Reading,
    telemetry: &TelemetryBlock,
) -> Result<Vec<u8>, LinkError> {
    layout.validate()?;
    if reading.values.len() != layout.value_count {
        return Err(LinkError::ValueCount {
            expected: layout.value_count,
            got: reading.values.len(),
        });
    }

    let mut out = vec![0u8; layout.total_len()];
    for (chunk, v) in out[..layout.field_block_len]
        .chunks_exact_mut(4)
        .zip(&reading.values)
    {
        chunk.copy_from_slice(&v.to_be_bytes());
    }
    let off = layout.telemetry_offset();
    out[off..off + TELEMETRY_LEN].copy_from_slice(telemetry);
    Ok(out)
}

/// Payload split back into its parts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodedPayload {
    pub values: Vec<i32>,
    pub telemetry: TelemetryBlock,
}

impl DecodedPayload {
    pub fn flag(&self) -> Option<i32> {
        self.values.first().copied()
    }
}

/// Inverse of [`encode_payload`]. Padding bytes are ignored.
pub fn decode_payload(layout: &PayloadLayout, bytes: &[u8]) -> Result<DecodedPayload, LinkError> {
    layout.validate()?;
    if bytes.len() != layout.total_len() {
        return Err(LinkError::PayloadLength {
            expected: layout.total_len(),
            got: bytes.len(),
        });
    }
    let values = bytes[..layout.value_count * 4]
        .chunks_exact(4)
        .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let off = layout.telemetry_offset();
    let mut telemetry = [0u8; TELEMETRY_LEN];
    telemetry.copy_from_slice(&bytes[off..off + TELEMETRY_LEN]);
    Ok(DecodedPayload { values, telemetry })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stronghold_vision_core::{BALL_FLAG, TOWER_FLAG};

    const TELEMETRY: TelemetryBlock = [0xde, 0xad, 0xbe, 0xef, 1, 2, 3, 4];

    #[test]
    fn tower_payload_layout() {
        let reading = Reading::detection(TargetKind::Tower, &[160, 90]);
        let bytes = encode_payload(&PayloadLayout::TOWER, &reading, &TELEMETRY).unwrap();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[..12], &[0, 0, 0, 1, 0, 0, 0, 160, 0, 0, 0, 90]);
        assert_eq!(&bytes[12..], &TELEMETRY);
    }

    #[test]
    fn ball_payload_layout() {
        let reading = Reading::detection(TargetKind::Ball, &[42, 160, 135]);
        let bytes = encode_payload(&PayloadLayout::BALL, &reading, &TELEMETRY).unwrap();
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[..4], &BALL_FLAG.to_be_bytes());
        assert_eq!(&bytes[4..8], &42i32.to_be_bytes());
        assert_eq!(&bytes[16..], &TELEMETRY);
    }

    #[test]
    fn no_target_still_carries_flag_and_telemetry() {
        let bytes = encode_payload(
            &PayloadLayout::TOWER,
            &Reading::empty(TargetKind::Tower),
            &TELEMETRY,
        )
        .unwrap();
        assert_eq!(&bytes[..4], &TOWER_FLAG.to_be_bytes());
        assert!(bytes[4..12].iter().all(|&b| b == 0));
        assert_eq!(&bytes[12..], &TELEMETRY);
    }

    #[test]
    fn negative_values_are_twos_complement() {
        let reading = Reading::detection(TargetKind::Tower, &[-1, 0]);
        let bytes = encode_payload(&PayloadLayout::TOWER, &reading, &[0; 8]).unwrap();
        assert_eq!(&bytes[4..8], &[0xff; 4]);
    }

    #[test]
    fn wider_field_block_is_zero_padded() {
        let layout = PayloadLayout {
            value_count: 3,
            field_block_len: 16,
        };
        let reading = Reading::detection(TargetKind::Tower, &[7, 8]);
        let bytes = encode_payload(&layout, &reading, &TELEMETRY).unwrap();
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[12..16], &[0; 4]);
        let decoded = decode_payload(&layout, &bytes).unwrap();
        assert_eq!(decoded.values, vec![TOWER_FLAG, 7, 8]);
        assert_eq!(decoded.telemetry, TELEMETRY);
    }

    #[test]
    fn mismatched_reading_is_an_error() {
        let err = encode_payload(
            &PayloadLayout::BALL,
            &Reading::empty(TargetKind::Tower),
            &TELEMETRY,
        )
        .unwrap_err();
        assert_eq!(err, LinkError::ValueCount { expected: 4, got: 3 });
    }

    #[test]
    fn undersized_layout_is_rejected() {
        let layout = PayloadLayout {
            value_count: 4,
            field_block_len: 12,
        };
        assert_eq!(
            layout.validate(),
            Err(LinkError::LayoutTooSmall { needed: 16, got: 12 })
        );
    }

    #[test]
    fn decode_checks_length() {
        let err = decode_payload(&PayloadLayout::TOWER, &[0; 19]).unwrap_err();
        assert_eq!(err, LinkError::PayloadLength { expected: 20, got: 19 });
    }
}
