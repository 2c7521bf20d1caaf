//! Structured run-level logging: info/warn/error plus periodic status and a
//! final summary event, generalizing the core crate's internal subsystem
//! logger up to the level of a single demodulation run.

use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Logfmt,
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "logfmt" => Ok(LogFormat::Logfmt),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    Info { message: String },
    Warn { message: String },
    Error { message: String },
    Status(StatusEvent),
    Summary(SummaryEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEvent {
    pub timestamp: DateTime<Utc>,
    pub done: u64,
    pub size: u64,
    pub freq_hz: f32,
    pub gain: f32,
    pub locked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryEvent {
    pub duration_secs: f64,
    pub symbols_written: u64,
    pub final_freq_hz: f32,
    pub final_locked: bool,
}

pub struct StructuredLogger {
    format: LogFormat,
    quiet: bool,
    start_time: DateTime<Utc>,
}

impl StructuredLogger {
    pub fn new(format: LogFormat, quiet: bool) -> Self {
        Self {
            format,
            quiet,
            start_time: Utc::now(),
        }
    }

    pub fn log(&mut self, event: LogEvent) -> Result<()> {
        if self.quiet && matches!(event, LogEvent::Status(_)) {
            return Ok(());
        }
        let line = match self.format {
            LogFormat::Json => serde_json::to_string(&event)?,
            LogFormat::Logfmt => format_logfmt(&event),
            LogFormat::Pretty => format_pretty(&event),
        };
        let mut out = io::stderr();
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }

    pub fn elapsed(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

fn format_logfmt(event: &LogEvent) -> String {
    let ts = Utc::now().to_rfc3339();
    match event {
        LogEvent::Info { message } => format!("ts=\"{ts}\" level=info msg=\"{message}\""),
        LogEvent::Warn { message } => format!("ts=\"{ts}\" level=warn msg=\"{message}\""),
        LogEvent::Error { message } => format!("ts=\"{ts}\" level=error msg=\"{message}\""),
        LogEvent::Status(s) => format!(
            "ts=\"{ts}\" type=status done={} size={} freq_hz={:.2} gain={:.3} locked={}",
            s.done, s.size, s.freq_hz, s.gain, s.locked
        ),
        LogEvent::Summary(s) => format!(
            "ts=\"{ts}\" type=summary duration_secs={:.2} symbols={} freq_hz={:.2} locked={}",
            s.duration_secs, s.symbols_written, s.final_freq_hz, s.final_locked
        ),
    }
}

fn format_pretty(event: &LogEvent) -> String {
    let ts = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
    match event {
        LogEvent::Info { message } => format!("[{ts}] INFO: {message}"),
        LogEvent::Warn { message } => format!("[{ts}] WARN: {message}"),
        LogEvent::Error { message } => format!("[{ts}] ERROR: {message}"),
        LogEvent::Status(s) => format!(
            "[{ts}] {}/{} symbols | {:+.1} Hz | gain {:.2} | {}",
            s.done,
            s.size,
            s.freq_hz,
            s.gain,
            if s.locked { "LOCKED" } else { "SEARCHING" }
        ),
        LogEvent::Summary(s) => format!(
            "[{ts}] SUMMARY: {:.2}s, {} symbols, {:+.1} Hz final, {}",
            s.duration_secs,
            s.symbols_written,
            s.final_freq_hz,
            if s.final_locked { "locked" } else { "not locked" }
        ),
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Json => write!(f, "json"),
            LogFormat::Logfmt => write!(f, "logfmt"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}
