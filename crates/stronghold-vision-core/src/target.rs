use serde::{Deserialize, Serialize};

/// Leading payload flag for tower readings.
pub const TOWER_FLAG: i32 = 1;
/// Leading payload flag for ball readings.
pub const BALL_FLAG: i32 = 2;

/// Shape family a pipeline searches for. Fixed for the lifetime of a pipeline.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Tower,
    Ball,
}

impl TargetKind {
    pub const fn flag(self) -> i32 {
        match self {
            TargetKind::Tower => TOWER_FLAG,
            TargetKind::Ball => BALL_FLAG,
        }
    }

    /// Number of integer values in a reading, flag included.
    ///
    /// Tower: `[flag, x, y]`. Ball: `[flag, radius, x, y]`.
    pub const fn value_count(self) -> usize {
        match self {
            TargetKind::Tower => 3,
            TargetKind::Ball => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            TargetKind::Tower => "tower",
            TargetKind::Ball => "ball",
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-cycle reading vector: `values[0]` is the type flag, the rest are target fields.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub kind: TargetKind,
    pub values: Vec<i32>,
    /// Whether a target was selected this cycle (or, after smoothing, is still being reported).
    pub detected: bool,
}

impl Reading {
    /// Flag followed by zeros.
    pub fn empty(kind: TargetKind) -> Self {
        let mut values = vec![0; kind.value_count()];
        values[0] = kind.flag();
        Self {
            kind,
            values,
            detected: false,
        }
    }

    /// Build a detection from the target fields (flag excluded).
    ///
    /// Missing trailing fields are zero-filled, extra ones are dropped.
    pub fn detection(kind: TargetKind, fields: &[i32]) -> Self {
        let mut reading = Self::empty(kind);
        for (dst, &src) in reading.values[1..].iter_mut().zip(fields) {
            *dst = src;
        }
        reading.detected = true;
        reading
    }

    /// Leading type flag; `None` for a reading with no values at all.
    #[inline]
    pub fn flag(&self) -> Option<i32> {
        self.values.first().copied()
    }

    /// Target fields after the flag, empty when there are none.
    #[inline]
    pub fn fields(&self) -> &[i32] {
        self.values.get(1..).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reading_carries_only_the_flag() {
        let r = Reading::empty(TargetKind::Ball);
        assert_eq!(r.values, vec![BALL_FLAG, 0, 0, 0]);
        assert!(!r.detected);
        assert_eq!(Reading::empty(TargetKind::Tower).values, vec![TOWER_FLAG, 0, 0]);
    }

    #[test]
    fn detection_pads_and_truncates_fields() {
        let r = Reading::detection(TargetKind::Tower, &[160]);
        assert_eq!(r.values, vec![TOWER_FLAG, 160, 0]);
        let r = Reading::detection(TargetKind::Tower, &[1, 2, 3, 4]);
        assert_eq!(r.fields(), &[1, 2]);
        assert!(r.detected);
    }

    #[test]
    fn truncated_reading_has_no_flag_and_no_fields() {
        let r: Reading =
            serde_json::from_str(r#"{"kind": "ball", "values": [], "detected": true}"#).unwrap();
        assert_eq!(r.flag(), None);
        assert!(r.fields().is_empty());

        let r = Reading::empty(TargetKind::Tower);
        assert_eq!(r.flag(), Some(TOWER_FLAG));
        assert_eq!(r.fields(), &[0, 0]);
    }

    #[test]
    fn target_kind_serializes_lowercase() {
        let json = serde_json::to_string(&TargetKind::Ball).unwrap();
        assert_eq!(json, "\"ball\"");
    }
}
