//! Logging setup for the Worker.
//!
//! Events go through `tracing`. [`init_logging`] installs a subscriber whose
//! writer hands each formatted line to the Workers console. Until it runs (unit
//! tests, native builds) events are dropped.

use std::io;
use std::str::FromStr;
use std::sync::OnceLock;

use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use worker::console_log;

use crate::config::ResolverConfig;

static LOGGING: OnceLock<()> = OnceLock::new();

/// Output encoding for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Installs the global subscriber once per isolate. Later calls are no-ops.
pub fn init_logging(config: &ResolverConfig) {
    LOGGING.get_or_init(|| {
        let filter = EnvFilter::try_new(&config.log_level)
            .unwrap_or_else(|_| EnvFilter::new("info"));

        // No timestamps: std's clock is unavailable on wasm32-unknown-unknown.
        let result = match config.log_format {
            LogFormat::Text => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().without_time().with_writer(ConsoleMakeWriter))
                .try_init(),
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .without_time()
                        .with_writer(ConsoleMakeWriter),
                )
                .try_init(),
        };

        if let Err(e) = result {
            console_log!("[observability] tracing setup failed: {}", e);
        }
    });
}

/// Hands out one buffer per event.
struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleLine;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleLine(Vec::new())
    }
}

/// Buffers one formatted event and flushes it to the console on drop.
struct ConsoleLine(Vec<u8>);

impl io::Write for ConsoleLine {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleLine {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.0);
        let line = line.trim_end();
        if !line.is_empty() {
            console_log!("{}", line);
        }
    }
}
