//! Latest-value telemetry hand-off between a network receiver and the pipeline.
//!
//! The receiver publishes blocks as they arrive; each publish bumps a
//! sequence number. The pipeline waits for a sequence newer than the one it
//! last consumed, which gates frame capture on fresh telemetry.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::encode::TelemetryBlock;

/// One published telemetry block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TelemetrySample {
    /// Starts at 1 and increases by one per publish.
    pub seq: u64,
    pub bytes: TelemetryBlock,
}

/// Outcome of [`TelemetryChannel::wait_newer`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TelemetryWait {
    Fresh(TelemetrySample),
    TimedOut,
    Closed,
}

#[derive(Debug, Default)]
struct Slot {
    latest: Option<TelemetrySample>,
    closed: bool,
}

/// Shared single-slot telemetry state. Wrap in an `Arc` to share.
#[derive(Debug, Default)]
pub struct TelemetryChannel {
    slot: Mutex<Slot>,
    arrived: Condvar,
}

impl TelemetryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the latest block and wake waiters. Returns the new sequence number.
    pub fn publish(&self, bytes: TelemetryBlock) -> u64 {
        let mut slot = self.slot.lock();
        let seq = slot.latest.map_or(1, |s| s.seq + 1);
        slot.latest = Some(TelemetrySample { seq, bytes });
        drop(slot);
        self.arrived.notify_all();
        seq
    }

    /// Whether any telemetry has been received yet.
    pub fn is_available(&self) -> bool {
        self.slot.lock().latest.is_some()
    }

    pub fn latest(&self) -> Option<TelemetrySample> {
        self.slot.lock().latest
    }

    /// Wake all waiters; subsequent waits return [`TelemetryWait::Closed`]
    /// once no newer sample is pending.
    pub fn close(&self) {
        self.slot.lock().closed = true;
        self.arrived.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.slot.lock().closed
    }

    /// Block until a sample with `seq > after` exists, the channel closes, or `timeout` elapses.
    pub fn wait_newer(&self, after: u64, timeout: Duration) -> TelemetryWait {
        let deadline = Instant::now() + timeout;
        let mut slot = self.slot.lock();
        loop {
            if let Some(sample) = slot.latest.filter(|s| s.seq > after) {
                return TelemetryWait::Fresh(sample);
            }
            if slot.closed {
                return TelemetryWait::Closed;
            }
            if self.arrived.wait_until(&mut slot, deadline).timed_out() {
                return match slot.latest.filter(|s| s.seq > after) {
                    Some(sample) => TelemetryWait::Fresh(sample),
                    None if slot.closed => TelemetryWait::Closed,
                    None => TelemetryWait::TimedOut,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn unavailable_until_first_publish() {
        let ch = TelemetryChannel::new();
        assert!(!ch.is_available());
        assert_eq!(ch.publish([1; 8]), 1);
        assert!(ch.is_available());
        assert_eq!(ch.publish([2; 8]), 2);
        assert_eq!(ch.latest().unwrap().bytes, [2; 8]);
    }

    #[test]
    fn wait_returns_immediately_when_newer_exists() {
        let ch = TelemetryChannel::new();
        ch.publish([7; 8]);
        let got = ch.wait_newer(0, Duration::from_millis(1));
        assert_eq!(
            got,
            TelemetryWait::Fresh(TelemetrySample {
                seq: 1,
                bytes: [7; 8]
            })
        );
    }

    #[test]
    fn consumed_sample_does_not_satisfy_wait() {
        let ch = TelemetryChannel::new();
        ch.publish([7; 8]);
        assert_eq!(
            ch.wait_newer(1, Duration::from_millis(20)),
            TelemetryWait::TimedOut
        );
    }

    #[test]
    fn publish_from_another_thread_wakes_waiter() {
        let ch = Arc::new(TelemetryChannel::new());
        let tx = Arc::clone(&ch);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            tx.publish([9; 8]);
        });
        match ch.wait_newer(0, Duration::from_secs(5)) {
            TelemetryWait::Fresh(s) => assert_eq!(s.bytes, [9; 8]),
            other => panic!("unexpected {other:?}"),
        }
        handle.join().unwrap();
    }

    #[test]
    fn close_releases_waiters() {
        let ch = Arc::new(TelemetryChannel::new());
        let tx = Arc::clone(&ch);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            tx.close();
        });
        assert_eq!(
            ch.wait_newer(0, Duration::from_secs(5)),
            TelemetryWait::Closed
        );
        handle.join().unwrap();
        assert!(ch.is_closed());
    }
}
