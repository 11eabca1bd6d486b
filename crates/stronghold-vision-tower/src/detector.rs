use serde::Serialize;
use stronghold_vision_core::{BinaryMask, FrameView, Reading, ShapeExtractor, TargetKind};

use crate::evaluate::{evaluate_tower_contours, TowerCandidate};
use crate::params::TowerParams;
use crate::preprocess::tower_mask;
use crate::select::select_squarest;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Output of one tower detection pass.
#[derive(Clone, Debug, Serialize)]
pub struct TowerDetection {
    /// Accepted candidates in extraction order.
    pub candidates: Vec<TowerCandidate>,
    /// Index into `candidates` of the selected target.
    pub selected: Option<usize>,
}

impl TowerDetection {
    pub fn target(&self) -> Option<&TowerCandidate> {
        self.selected.and_then(|i| self.candidates.get(i))
    }

    /// `[TOWER_FLAG, x, y]`, or the flag and zeros without a target.
    pub fn reading(&self) -> Reading {
        match self.target() {
            Some(t) => {
                let c = t.center();
                Reading::detection(TargetKind::Tower, &[c.x, c.y])
            }
            None => Reading::empty(TargetKind::Tower),
        }
    }
}

/// Tower marker detector: threshold, extract, filter by vertex count, pick the squarest.
#[derive(Clone, Debug, Default)]
pub struct TowerDetector {
    params: TowerParams,
}

impl TowerDetector {
    pub fn new(params: TowerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TowerParams {
        &self.params
    }

    pub fn preprocess(&self, frame: &FrameView<'_>) -> BinaryMask {
        tower_mask(frame, self.params.channel_threshold)
    }

    /// Run extraction, evaluation and selection on an already thresholded mask.
    pub fn detect_in_mask<X: ShapeExtractor + ?Sized>(
        &self,
        mask: &BinaryMask,
        extractor: &X,
    ) -> TowerDetection {
        let contours = extractor.extract_contours(mask, self.params.connectivity);
        let candidates = evaluate_tower_contours(&contours, extractor, &self.params);
        let selected = select_squarest(&candidates);
        log::debug!(
            "tower: {} contours, {} accepted, selected {:?}",
            contours.len(),
            candidates.len(),
            selected
        );
        TowerDetection {
            candidates,
            selected,
        }
    }

    /// Full pass from a frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame, extractor), fields(width = frame.width, height = frame.height))
    )]
    pub fn detect<X: ShapeExtractor + ?Sized>(
        &self,
        frame: &FrameView<'_>,
        extractor: &X,
    ) -> TowerDetection {
        if let Err(e) = frame.validate() {
            log::warn!("tower: skipping malformed frame: {e}");
            return TowerDetection {
                candidates: Vec::new(),
                selected: None,
            };
        }
        let mask = self.preprocess(frame);
        self.detect_in_mask(&mask, extractor)
    }
}
