//! Temporal smoothing of per-cycle readings.
//!
//! The smoother keeps a short window of recent target fields. Detections are
//! averaged over the detected entries in the window; isolated misses are
//! bridged by holding the last reported value for up to `max_gap` cycles.
//! The type flag is never smoothed.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use stronghold_vision_core::{Reading, TargetKind};

use crate::error::LinkError;

/// How readings are smoothed before encoding.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingPolicy {
    pub enabled: bool,
    /// Number of recent cycles considered for averaging.
    pub window: usize,
    /// Consecutive misses that still report the last value.
    pub max_gap: usize,
}

impl Default for SmoothingPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            window: 5,
            max_gap: 3,
        }
    }
}

impl SmoothingPolicy {
    /// Pass-through policy: every raw reading is reported as is.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Default policy per target: towers pass through, balls are smoothed.
    pub fn for_target(kind: TargetKind) -> Self {
        match kind {
            TargetKind::Tower => Self::disabled(),
            TargetKind::Ball => Self::default(),
        }
    }
}

/// Rolling state carried between cycles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryState {
    /// Target fields of recent cycles, `None` for misses. Oldest first.
    recent: VecDeque<Option<Vec<i32>>>,
    /// Last reading handed out.
    last: Reading,
    /// Consecutive misses since the last detection.
    misses: usize,
}

impl HistoryState {
    /// Neutral state: empty window, last output is the flag and zeros.
    pub fn new(kind: TargetKind) -> Self {
        Self {
            recent: VecDeque::new(),
            last: Reading::empty(kind),
            misses: 0,
        }
    }

    pub fn last(&self) -> &Reading {
        &self.last
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

/// Stateful smoother for one target kind.
#[derive(Clone, Debug)]
pub struct HistorySmoother {
    kind: TargetKind,
    policy: SmoothingPolicy,
    state: HistoryState,
}

impl HistorySmoother {
    pub fn new(kind: TargetKind, policy: SmoothingPolicy) -> Self {
        if policy.enabled && policy.window == 0 {
            log::warn!("{kind} smoothing window is 0; treating it as 1");
        }
        Self {
            kind,
            policy,
            state: HistoryState::new(kind),
        }
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn policy(&self) -> &SmoothingPolicy {
        &self.policy
    }

    pub fn state(&self) -> &HistoryState {
        &self.state
    }

    /// Drop all history and return to the neutral state.
    pub fn reset(&mut self) {
        self.state = HistoryState::new(self.kind);
    }

    /// Fold one raw reading into the history and return the reading to report.
    pub fn update(&mut self, raw: &Reading) -> Result<Reading, LinkError> {
        if raw.kind != self.kind {
            return Err(LinkError::KindMismatch {
                expected: self.kind,
                got: raw.kind,
            });
        }
        if raw.values.len() != self.kind.value_count() {
            return Err(LinkError::ValueCount {
                expected: self.kind.value_count(),
                got: raw.values.len(),
            });
        }

        if !self.policy.enabled {
            self.state.last = raw.clone();
            self.state.misses = if raw.detected { 0 } else { self.state.misses + 1 };
            return Ok(raw.clone());
        }

        let window = self.policy.window.max(1);
        self.state
            .recent
            .push_back(raw.detected.then(|| raw.fields().to_vec()));
        while self.state.recent.len() > window {
            self.state.recent.pop_front();
        }

        let out = if raw.detected {
            self.state.misses = 0;
            self.window_mean()
        } else {
            self.state.misses += 1;
            if self.state.last.detected && self.state.misses <= self.policy.max_gap {
                log::trace!(
                    "{}: bridging miss {}/{}",
                    self.kind,
                    self.state.misses,
                    self.policy.max_gap
                );
                self.state.last.clone()
            } else {
                // The target is lost; stale detections must not leak into the
                // mean once it is reacquired.
                self.state.recent.clear();
                Reading::empty(self.kind)
            }
        };

        self.state.last = out.clone();
        Ok(out)
    }

    /// Rounded mean of the detected entries; the newest entry is always one.
    fn window_mean(&self) -> Reading {
        let field_count = self.kind.value_count() - 1;
        let mut sums = vec![0i64; field_count];
        let mut n = 0i64;
        for fields in self.state.recent.iter().flatten() {
            for (s, &v) in sums.iter_mut().zip(fields) {
                *s += i64::from(v);
            }
            n += 1;
        }
        let n = n.max(1) as f64;
        let means: Vec<i32> = sums
            .into_iter()
            .map(|s| (s as f64 / n).round() as i32)
            .collect();
        Reading::detection(self.kind, &means)
    }
}
