//! JSON pipeline configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stronghold_vision_ball::BallParams;
use stronghold_vision_core::TargetKind;
use stronghold_vision_link::{PayloadLayout, SmoothingPolicy};
use stronghold_vision_tower::TowerParams;

use crate::error::ConfigError;

fn default_tower_smoothing() -> SmoothingPolicy {
    SmoothingPolicy::for_target(TargetKind::Tower)
}

fn default_ball_smoothing() -> SmoothingPolicy {
    SmoothingPolicy::for_target(TargetKind::Ball)
}

fn default_tower_layout() -> PayloadLayout {
    PayloadLayout::TOWER
}

fn default_ball_layout() -> PayloadLayout {
    PayloadLayout::BALL
}

fn default_telemetry_timeout_ms() -> u64 {
    100
}

/// Debug display settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Directory receiving annotated frames.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// Everything a pipeline instance needs. Both target sections are always
/// present; `target` picks the one that runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub target: TargetKind,
    #[serde(default)]
    pub tower: TowerParams,
    #[serde(default)]
    pub ball: BallParams,
    #[serde(default = "default_tower_smoothing")]
    pub tower_smoothing: SmoothingPolicy,
    #[serde(default = "default_ball_smoothing")]
    pub ball_smoothing: SmoothingPolicy,
    #[serde(default = "default_tower_layout")]
    pub tower_layout: PayloadLayout,
    #[serde(default = "default_ball_layout")]
    pub ball_layout: PayloadLayout,
    /// Upper bound on one telemetry wait; the stop flag is checked at least this often.
    #[serde(default = "default_telemetry_timeout_ms")]
    pub telemetry_timeout_ms: u64,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::for_target(TargetKind::Tower)
    }
}

impl PipelineConfig {
    pub fn for_target(target: TargetKind) -> Self {
        Self {
            target,
            tower: TowerParams::default(),
            ball: BallParams::default(),
            tower_smoothing: default_tower_smoothing(),
            ball_smoothing: default_ball_smoothing(),
            tower_layout: default_tower_layout(),
            ball_layout: default_ball_layout(),
            telemetry_timeout_ms: default_telemetry_timeout_ms(),
            display: DisplayConfig::default(),
        }
    }

    /// Load and validate a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Smoothing policy of the active target.
    pub fn smoothing(&self) -> SmoothingPolicy {
        match self.target {
            TargetKind::Tower => self.tower_smoothing,
            TargetKind::Ball => self.ball_smoothing,
        }
    }

    /// Payload layout of the active target.
    pub fn layout(&self) -> PayloadLayout {
        match self.target {
            TargetKind::Tower => self.tower_layout,
            TargetKind::Ball => self.ball_layout,
        }
    }

    pub fn telemetry_timeout(&self) -> Duration {
        Duration::from_millis(self.telemetry_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (kind, layout) in [
            (TargetKind::Tower, self.tower_layout),
            (TargetKind::Ball, self.ball_layout),
        ] {
            if layout.value_count != kind.value_count() {
                return Err(ConfigError::Invalid(format!(
                    "{kind} layout has {} values, readings have {}",
                    layout.value_count,
                    kind.value_count()
                )));
            }
            layout
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("{kind} layout: {e}")))?;
        }

        let tower = &self.tower;
        if tower.min_vertices_exclusive >= tower.max_vertices_exclusive {
            return Err(ConfigError::Invalid(format!(
                "tower vertex bounds ({}, {}) accept nothing",
                tower.min_vertices_exclusive, tower.max_vertices_exclusive
            )));
        }

        let ball = &self.ball;
        if ball.roi.width == 0 || ball.roi.height == 0 {
            return Err(ConfigError::Invalid("ball roi is empty".to_string()));
        }
        if !ball.roi.is_bounded() {
            return Err(ConfigError::Invalid(format!(
                "ball roi {:?} extends past the addressable range",
                ball.roi
            )));
        }
        if !ball.threshold_scale.is_finite() || ball.threshold_scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "ball threshold_scale must be positive, got {}",
                ball.threshold_scale
            )));
        }
        for (kind, policy) in [
            (TargetKind::Tower, self.tower_smoothing),
            (TargetKind::Ball, self.ball_smoothing),
        ] {
            if policy.enabled && (policy.window == 0 || policy.max_gap == 0) {
                return Err(ConfigError::Invalid(format!(
                    "{kind} smoothing needs window >= 1 and max_gap >= 1, got {} and {}",
                    policy.window, policy.max_gap
                )));
            }
        }
        if self.telemetry_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "telemetry_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
