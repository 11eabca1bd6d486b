//! Diagnostics output for the per-target worker threads.
//!
//! A running pipeline has one worker per target type, all writing to the
//! same stderr. Every line carries the time since the logger was installed
//! and the worker's thread name, e.g. `[  1.234s  INFO tower] lost target`,
//! so interleaved tower and ball streams stay readable. Install once with
//! [`init_with_level`]. With the `tracing` feature, `init_tracing` installs
//! a subscriber instead, which also reports how long each detection took.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

struct WorkerLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for WorkerLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let thread = std::thread::current();
        let line = format_line(
            self.started.elapsed().as_secs_f64(),
            record.level(),
            thread.name(),
            record.args(),
        );
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn format_line(
    elapsed: f64,
    level: Level,
    thread: Option<&str>,
    message: &std::fmt::Arguments<'_>,
) -> String {
    format!(
        "[{:7.3}s {:>5} {}] {}",
        elapsed,
        level,
        thread.unwrap_or("-"),
        message
    )
}

static LOGGER: OnceLock<WorkerLogger> = OnceLock::new();

/// Install the worker logger with the provided level filter.
///
/// Only the first call installs anything; later calls return `Ok(())`.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| WorkerLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_thread_names(true)
            .json()
            .flatten_event(true)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_thread_names(true)
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}
