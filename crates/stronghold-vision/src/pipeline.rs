//! Steady-state pipeline driver.
//!
//! One [`Pipeline`] runs one target type on one dedicated worker. Every cycle
//! waits for a telemetry sample newer than the last one consumed, captures a
//! frame, runs detection, smoothing and encoding, and hands the payload to the
//! network sink:
//!
//! ```text
//! WaitingForTelemetry -> Capturing -> Processing -> Transmitting -> WaitingForTelemetry
//! ```
//!
//! A [`StopHandle`] moves the pipeline to `Stopped`; the flag is checked once
//! per cycle and after every telemetry wait, so shutdown latency is bounded by
//! the telemetry timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::Serialize;
use stronghold_vision_ball::BallDetector;
use stronghold_vision_core::{
    BorderFollowingExtractor, Frame, FrameView, Reading, ShapeExtractor, TargetKind,
};
use stronghold_vision_link::{
    encode_payload, HistorySmoother, PayloadLayout, TelemetryChannel, TelemetrySample,
    TelemetryWait,
};
use stronghold_vision_tower::TowerDetector;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::config::PipelineConfig;
use crate::display::{open_display, DebugDisplay, Overlay};
use crate::error::{CollaboratorError, DisplayError, PipelineError};

/// Supplies one frame per cycle.
pub trait FrameSource {
    fn capture_frame(&mut self) -> Result<Frame, CollaboratorError>;
}

impl<F> FrameSource for F
where
    F: FnMut() -> Result<Frame, CollaboratorError>,
{
    fn capture_frame(&mut self) -> Result<Frame, CollaboratorError> {
        self()
    }
}

/// Receives every encoded payload.
pub trait NetworkSink {
    fn send(&mut self, payload: Vec<u8>) -> Result<(), CollaboratorError>;
}

impl NetworkSink for std::sync::mpsc::Sender<Vec<u8>> {
    fn send(&mut self, payload: Vec<u8>) -> Result<(), CollaboratorError> {
        std::sync::mpsc::Sender::send(self, payload).map_err(|e| e.to_string().into())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum PipelineState {
    WaitingForTelemetry,
    Capturing,
    Processing,
    Transmitting,
    Stopped,
}

/// How a cycle ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum CycleOutcome {
    /// A payload went to the sink.
    Transmitted,
    /// No fresh telemetry within the timeout; nothing captured.
    TelemetryTimeout,
    /// The frame source failed or returned a malformed frame; the cycle was skipped.
    FrameUnavailable,
    Stopped,
}

/// Everything observable about one cycle.
#[derive(Clone, Debug, Serialize)]
pub struct CycleReport {
    /// States entered during the cycle, in order.
    pub states: Vec<PipelineState>,
    pub outcome: CycleOutcome,
    pub telemetry_seq: Option<u64>,
    /// Reading straight from the detector.
    pub raw: Option<Reading>,
    /// Reading after smoothing, as encoded.
    pub reading: Option<Reading>,
    pub payload: Option<Vec<u8>>,
}

impl CycleReport {
    fn new() -> Self {
        Self {
            states: Vec::with_capacity(5),
            outcome: CycleOutcome::Stopped,
            telemetry_seq: None,
            raw: None,
            reading: None,
            payload: None,
        }
    }

    fn with_outcome(mut self, outcome: CycleOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}

/// Cooperative stop signal shared with the thread that owns the pipeline.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

enum Detector {
    Tower(TowerDetector),
    Ball(BallDetector),
}

impl Detector {
    fn from_config(config: &PipelineConfig) -> Self {
        match config.target {
            TargetKind::Tower => Detector::Tower(TowerDetector::new(config.tower.clone())),
            TargetKind::Ball => Detector::Ball(BallDetector::new(config.ball.clone())),
        }
    }

    fn detect<X: ShapeExtractor + ?Sized>(
        &self,
        frame: &FrameView<'_>,
        extractor: &X,
    ) -> (Reading, Overlay) {
        match self {
            Detector::Tower(d) => {
                let detection = d.detect(frame, extractor);
                let overlay = detection
                    .target()
                    .map_or(Overlay::None, |t| Overlay::Polygon(t.vertices.clone()));
                (detection.reading(), overlay)
            }
            Detector::Ball(d) => {
                let detection = d.detect(frame, extractor);
                let overlay = detection
                    .target()
                    .map_or(Overlay::None, |t| Overlay::Ellipse(t.ellipse));
                (detection.reading(), overlay)
            }
        }
    }
}

type BoxedDisplay = Box<dyn DebugDisplay + Send>;

pub struct Pipeline {
    kind: TargetKind,
    detector: Detector,
    extractor: Box<dyn ShapeExtractor + Send>,
    source: Box<dyn FrameSource + Send>,
    sink: Box<dyn NetworkSink + Send>,
    display: Option<BoxedDisplay>,
    smoother: HistorySmoother,
    layout: PayloadLayout,
    telemetry: Arc<TelemetryChannel>,
    telemetry_timeout: Duration,
    last_seq: u64,
    state: PipelineState,
    stop: StopHandle,
}

impl Pipeline {
    /// Build a pipeline for `config.target` using the built-in shape extractor.
    ///
    /// When `config.display.enabled` is set a display is opened; if that
    /// fails the pipeline logs a warning and runs without one.
    pub fn new(
        config: &PipelineConfig,
        telemetry: Arc<TelemetryChannel>,
        source: impl FrameSource + Send + 'static,
        sink: impl NetworkSink + Send + 'static,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let kind = config.target;
        let pipeline = Self {
            kind,
            detector: Detector::from_config(config),
            extractor: Box::new(BorderFollowingExtractor::new()),
            source: Box::new(source),
            sink: Box::new(sink),
            display: None,
            smoother: HistorySmoother::new(kind, config.smoothing()),
            layout: config.layout(),
            telemetry,
            telemetry_timeout: config.telemetry_timeout(),
            last_seq: 0,
            state: PipelineState::WaitingForTelemetry,
            stop: StopHandle::default(),
        };
        Ok(if config.display.enabled {
            pipeline.attach_display(open_display(&config.display))
        } else {
            pipeline
        })
    }

    /// Replace the shape extraction backend.
    pub fn with_extractor(mut self, extractor: impl ShapeExtractor + Send + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// Install the result of a display initialization. Errors are logged and dropped.
    pub fn attach_display(mut self, display: Result<BoxedDisplay, DisplayError>) -> Self {
        match display {
            Ok(d) => self.display = Some(d),
            Err(e) => {
                log::warn!("{}: debug display unavailable, continuing without it: {e}", self.kind);
                self.display = None;
            }
        }
        self
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn has_display(&self) -> bool {
        self.display.is_some()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn history(&self) -> &HistorySmoother {
        &self.smoother
    }

    fn enter(&mut self, state: PipelineState, report: &mut CycleReport) {
        self.state = state;
        report.states.push(state);
    }

    /// Run one full cycle, blocking for at most the telemetry timeout while waiting.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self), fields(kind = %self.kind, last_seq = self.last_seq))
    )]
    pub fn run_cycle(&mut self) -> Result<CycleReport, PipelineError> {
        let mut report = CycleReport::new();
        if self.stop.is_stopped() || self.state == PipelineState::Stopped {
            self.enter(PipelineState::Stopped, &mut report);
            return Ok(report.with_outcome(CycleOutcome::Stopped));
        }

        self.enter(PipelineState::WaitingForTelemetry, &mut report);
        let sample = match self
            .telemetry
            .wait_newer(self.last_seq, self.telemetry_timeout)
        {
            TelemetryWait::Fresh(sample) => sample,
            TelemetryWait::TimedOut => {
                return Ok(report.with_outcome(CycleOutcome::TelemetryTimeout));
            }
            TelemetryWait::Closed => {
                log::info!("{}: telemetry closed, stopping", self.kind);
                self.enter(PipelineState::Stopped, &mut report);
                return Ok(report.with_outcome(CycleOutcome::Stopped));
            }
        };
        if self.stop.is_stopped() {
            self.enter(PipelineState::Stopped, &mut report);
            return Ok(report.with_outcome(CycleOutcome::Stopped));
        }
        self.last_seq = sample.seq;
        report.telemetry_seq = Some(sample.seq);

        self.enter(PipelineState::Capturing, &mut report);
        let frame = match self.source.capture_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("{}: frame capture failed: {e}", self.kind);
                self.enter(PipelineState::WaitingForTelemetry, &mut report);
                return Ok(report.with_outcome(CycleOutcome::FrameUnavailable));
            }
        };
        if let Err(e) = frame.validate() {
            log::warn!("{}: discarding malformed frame: {e}", self.kind);
            self.enter(PipelineState::WaitingForTelemetry, &mut report);
            return Ok(report.with_outcome(CycleOutcome::FrameUnavailable));
        }

        self.enter(PipelineState::Processing, &mut report);
        let (raw, overlay, reading, payload) = match self.process(&frame, &sample) {
            Ok(out) => out,
            Err(e) => {
                self.state = PipelineState::WaitingForTelemetry;
                return Err(e);
            }
        };

        self.enter(PipelineState::Transmitting, &mut report);
        if let Err(e) = self.sink.send(payload.clone()) {
            log::warn!("{}: network sink rejected payload: {e}", self.kind);
        }
        let display_err = match self.display.as_mut() {
            Some(display) => display.show(&frame, &overlay, &reading).err(),
            None => None,
        };
        if let Some(e) = display_err {
            log::warn!("{}: debug display failed, disabling it: {e}", self.kind);
            self.display = None;
        }

        self.enter(PipelineState::WaitingForTelemetry, &mut report);
        report.raw = Some(raw);
        report.reading = Some(reading);
        report.payload = Some(payload);
        Ok(report.with_outcome(CycleOutcome::Transmitted))
    }

    fn process(
        &mut self,
        frame: &Frame,
        sample: &TelemetrySample,
    ) -> Result<(Reading, Overlay, Reading, Vec<u8>), PipelineError> {
        let (raw, overlay) = self.detector.detect(&frame.view(), &*self.extractor);
        let reading = self.smoother.update(&raw)?;
        let payload = encode_payload(&self.layout, &reading, &sample.bytes)?;
        log::debug!(
            "{} #{}: raw {:?} -> sent {:?}",
            self.kind,
            sample.seq,
            raw.values,
            reading.values
        );
        Ok((raw, overlay, reading, payload))
    }

    /// Loop until stopped. Cycle errors are logged and the loop carries on.
    pub fn run(&mut self) {
        log::info!("{} pipeline running", self.kind);
        loop {
            match self.run_cycle() {
                Ok(report) if report.outcome == CycleOutcome::Stopped => break,
                Ok(_) => {}
                Err(e) => log::error!("{}: cycle failed: {e}", self.kind),
            }
        }
        log::info!("{} pipeline stopped", self.kind);
    }

    /// Move the pipeline onto a dedicated worker thread named after its target.
    pub fn spawn(mut self) -> std::io::Result<(StopHandle, JoinHandle<Self>)> {
        let stop = self.stop_handle();
        let handle = thread::Builder::new()
            .name(self.kind.name().to_string())
            .spawn(move || {
                self.run();
                self
            })?;
        Ok((stop, handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use stronghold_vision_core::TOWER_FLAG;

    fn dark_frame() -> Result<Frame, CollaboratorError> {
        Ok(Frame::filled(32, 24, [0, 0, 0]))
    }

    #[test]
    fn waits_when_no_telemetry() {
        let mut cfg = PipelineConfig::default();
        cfg.telemetry_timeout_ms = 5;
        let (tx, rx) = mpsc::channel();
        let telemetry = Arc::new(TelemetryChannel::new());
        let mut p = Pipeline::new(&cfg, telemetry, dark_frame, tx).unwrap();

        let report = p.run_cycle().unwrap();
        assert_eq!(report.outcome, CycleOutcome::TelemetryTimeout);
        assert_eq!(report.states, vec![PipelineState::WaitingForTelemetry]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn one_cycle_per_telemetry_sample() {
        let mut cfg = PipelineConfig::default();
        cfg.telemetry_timeout_ms = 5;
        let (tx, rx) = mpsc::channel();
        let telemetry = Arc::new(TelemetryChannel::new());
        let mut p = Pipeline::new(&cfg, Arc::clone(&telemetry), dark_frame, tx).unwrap();

        telemetry.publish([1; 8]);
        let report = p.run_cycle().unwrap();
        assert_eq!(report.outcome, CycleOutcome::Transmitted);
        assert_eq!(
            report.states,
            vec![
                PipelineState::WaitingForTelemetry,
                PipelineState::Capturing,
                PipelineState::Processing,
                PipelineState::Transmitting,
                PipelineState::WaitingForTelemetry,
            ]
        );
        let payload = rx.try_recv().unwrap();
        assert_eq!(&payload[..4], &TOWER_FLAG.to_be_bytes());

        // same sample again: no second cycle
        let again = p.run_cycle().unwrap();
        assert_eq!(again.outcome, CycleOutcome::TelemetryTimeout);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn frame_failure_skips_the_cycle() {
        let cfg = PipelineConfig::default();
        let (tx, rx) = mpsc::channel();
        let telemetry = Arc::new(TelemetryChannel::new());
        let failing = || -> Result<Frame, CollaboratorError> { Err("camera unplugged".into()) };
        let mut p = Pipeline::new(&cfg, Arc::clone(&telemetry), failing, tx).unwrap();

        telemetry.publish([0; 8]);
        let report = p.run_cycle().unwrap();
        assert_eq!(report.outcome, CycleOutcome::FrameUnavailable);
        assert_eq!(p.state(), PipelineState::WaitingForTelemetry);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn malformed_frame_skips_the_cycle_for_both_targets() {
        for kind in [TargetKind::Tower, TargetKind::Ball] {
            let cfg = PipelineConfig::for_target(kind);
            let (tx, rx) = mpsc::channel();
            let telemetry = Arc::new(TelemetryChannel::new());
            let short = || -> Result<Frame, CollaboratorError> {
                Ok(Frame {
                    width: 320,
                    height: 240,
                    data: vec![0; 100],
                })
            };
            let mut p = Pipeline::new(&cfg, Arc::clone(&telemetry), short, tx).unwrap();

            telemetry.publish([0; 8]);
            let report = p.run_cycle().unwrap();
            assert_eq!(report.outcome, CycleOutcome::FrameUnavailable, "{kind}");
            assert_eq!(p.state(), PipelineState::WaitingForTelemetry);
            assert!(rx.try_recv().is_err());

            // the pipeline keeps serving later samples
            telemetry.publish([1; 8]);
            assert_eq!(
                p.run_cycle().unwrap().outcome,
                CycleOutcome::FrameUnavailable
            );
        }
    }

    #[test]
    fn display_init_failure_is_not_fatal() {
        let (tx, _rx) = mpsc::channel();
        let p = Pipeline::new(
            &PipelineConfig::default(),
            Arc::new(TelemetryChannel::new()),
            dark_frame,
            tx,
        )
        .unwrap()
        .attach_display(Err(DisplayError::Unavailable("no screen".to_string())));
        assert!(!p.has_display());
        assert_eq!(p.state(), PipelineState::WaitingForTelemetry);
    }

    #[test]
    fn stop_is_terminal() {
        let (tx, _rx) = mpsc::channel();
        let telemetry = Arc::new(TelemetryChannel::new());
        let mut p = Pipeline::new(
            &PipelineConfig::default(),
            Arc::clone(&telemetry),
            dark_frame,
            tx,
        )
        .unwrap();
        p.stop_handle().stop();
        telemetry.publish([0; 8]);
        let report = p.run_cycle().unwrap();
        assert_eq!(report.outcome, CycleOutcome::Stopped);
        assert_eq!(p.state(), PipelineState::Stopped);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.tower_layout.field_block_len = 4;
        let (tx, _rx) = mpsc::channel();
        let err = Pipeline::new(&cfg, Arc::new(TelemetryChannel::new()), dark_frame, tx);
        assert!(matches!(err, Err(PipelineError::Config(_))));
    }
}
