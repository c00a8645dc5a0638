//! Log capture for asserting on formatted, correlation-prefixed output.

use corrid_core::CorrelationConfig;
use corrid_observability::CorrelationFormat;
use corrid_observability::filter::{CorrelationIdFilter, TaskLineageFilter};
use std::io;
use std::sync::{Arc, Mutex};
use tracing::Subscriber;

/// In-memory sink usable as a `tracing_subscriber` writer.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().expect("log buffer poisoned");
        String::from_utf8_lossy(&buffer).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Lines whose message contains `needle`.
    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.contains(needle))
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .expect("log buffer poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Subscriber writing `[correlation_id] [parent-current] message fields`
/// lines into `capture`, without timestamps, levels or targets.
pub fn capture_subscriber(
    config: &CorrelationConfig,
    capture: LogCapture,
) -> impl Subscriber + Send + Sync {
    let format = CorrelationFormat::new(
        tracing_subscriber::fmt::format()
            .without_time()
            .with_level(false)
            .with_target(false),
    )
    .with_filter(CorrelationIdFilter::from_config(config))
    .with_filter(TaskLineageFilter::from_config(config));

    tracing_subscriber::fmt()
        .with_writer(move || capture.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .event_format(format)
        .finish()
}

/// Split a captured line into its bracketed prefix values and the rest.
pub fn parse_prefixed_line(line: &str) -> (Vec<String>, String) {
    let mut values = Vec::new();
    let mut rest = line;
    while let Some(stripped) = rest.strip_prefix('[') {
        match stripped.find("] ") {
            Some(end) => {
                values.push(stripped[..end].to_string());
                rest = &stripped[end + 2..];
            }
            None => break,
        }
    }
    (values, rest.to_string())
}
