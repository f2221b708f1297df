//! Telemetry
//!
//! One `{goal, action, rationale, result}` record per agent per tick.
//! Emission is fire-and-forget: a failed write is logged and dropped.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use sim_events::TelemetryEvent;

/// Consumer of per-agent telemetry.
pub trait TelemetrySink {
    fn emit(&mut self, event: &TelemetryEvent);

    fn flush(&mut self) {}
}

/// Appends records to a JSONL file.
pub struct JsonlTelemetrySink {
    writer: Option<BufWriter<File>>,
    event_count: u64,
    failures: u64,
}

impl JsonlTelemetrySink {
    /// Opens `path` for appending, creating parent directories.
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            event_count: 0,
            failures: 0,
        })
    }

    /// A sink that discards events
    pub fn null() -> Self {
        Self {
            writer: None,
            event_count: 0,
            failures: 0,
        }
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    fn write_line(&mut self, event: &TelemetryEvent) -> std::io::Result<()> {
        if let Some(ref mut writer) = self.writer {
            let json = event.to_jsonl()?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }
}

impl TelemetrySink for JsonlTelemetrySink {
    fn emit(&mut self, event: &TelemetryEvent) {
        self.event_count += 1;
        if let Err(e) = self.write_line(event) {
            self.failures += 1;
            tracing::debug!("Telemetry for {} dropped: {}", event.agent_id, e);
        }
    }

    fn flush(&mut self) {
        if let Some(ref mut writer) = self.writer {
            if let Err(e) = writer.flush() {
                tracing::warn!("Failed to flush telemetry: {}", e);
            }
        }
    }
}

impl Drop for JsonlTelemetrySink {
    fn drop(&mut self) {
        TelemetrySink::flush(self);
    }
}

/// Keeps records in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub events: Vec<TelemetryEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TelemetrySink for MemorySink {
    fn emit(&mut self, event: &TelemetryEvent) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_events::fixtures::sample_telemetry;
    use std::io::BufRead;

    #[test]
    fn test_jsonl_sink_writes_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("telemetry.jsonl");
        let events = sample_telemetry();

        {
            let mut sink = JsonlTelemetrySink::new(&path).unwrap();
            for event in &events {
                sink.emit(event);
            }
            assert_eq!(sink.event_count(), events.len() as u64);
        }

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = std::io::BufReader::new(file)
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), events.len());
        assert_eq!(TelemetryEvent::from_jsonl(&lines[0]).unwrap(), events[0]);
    }

    #[test]
    fn test_sink_appends_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.jsonl");
        let events = sample_telemetry();
        for _ in 0..2 {
            let mut sink = JsonlTelemetrySink::new(&path).unwrap();
            sink.emit(&events[0]);
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_null_sink_counts_without_writing() {
        let mut sink = JsonlTelemetrySink::null();
        for event in sample_telemetry() {
            sink.emit(&event);
        }
        assert_eq!(sink.event_count(), 3);
        assert_eq!(sink.failures(), 0);
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::new();
        sink.emit(&sample_telemetry()[1]);
        assert_eq!(sink.events.len(), 1);
    }
}
