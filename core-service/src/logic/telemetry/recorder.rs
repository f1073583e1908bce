//! Exam Telemetry Recorder
//!
//! Keeps the last `MAX_EVENTS` events in memory and exports them as JSONL.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, Timelike, Utc};
use parking_lot::Mutex;

use super::event::{TelemetryEvent, TelemetryEventType};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Events kept in memory
pub const MAX_EVENTS: usize = 200;

const EXPORT_DIR: &str = "telemetry";
const EXPORT_EXT: &str = ".jsonl";

// ============================================================================
// LOG
// ============================================================================

#[derive(Debug, Default)]
pub struct TelemetryLog {
    events: Mutex<VecDeque<TelemetryEvent>>,
}

impl TelemetryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event_type: TelemetryEventType, details: serde_json::Value) {
        let event = TelemetryEvent::new(event_type, details);
        log::debug!("[Telemetry] recorded {}", event.event_type.as_str());

        let mut events = self.events.lock();
        events.push_back(event);
        while events.len() > MAX_EVENTS {
            events.pop_front();
        }
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Write every held event to a new timestamped file in `dir`
    pub fn export_jsonl(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let now = Utc::now();
        let filename = format!(
            "exam_telemetry_{}_{:02}_{:02}_{:02}{:02}{:02}{}",
            now.year(),
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            EXPORT_EXT
        );
        let file_path = dir.join(filename);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&file_path)?;
        let mut writer = BufWriter::new(file);

        let events = self.events();
        for event in &events {
            writer.write_all(event.to_jsonl().as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        log::info!("Exported {} telemetry events to {:?}", events.len(), file_path);
        Ok(file_path)
    }
}

/// Default export directory under the platform data dir
pub fn default_export_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("exam-proctor")
        .join(EXPORT_DIR)
}

/// Read events back from an exported file. Unparseable lines are skipped.
pub fn read_events(file_path: &Path) -> std::io::Result<Vec<TelemetryEvent>> {
    let reader = BufReader::new(File::open(file_path)?);
    let mut events = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        if let Ok(event) = serde_json::from_str::<TelemetryEvent>(&line) {
            events.push(event);
        }
    }

    Ok(events)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_keeps_last_two_hundred() {
        let log = TelemetryLog::new();
        for i in 0..205 {
            log.record(TelemetryEventType::ViolationRecorded, json!({ "n": i }));
        }

        let events = log.events();
        assert_eq!(events.len(), MAX_EVENTS);
        assert_eq!(events[0].details["n"], 5);
        assert_eq!(events[MAX_EVENTS - 1].details["n"], 204);
    }

    #[test]
    fn test_export_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let log = TelemetryLog::new();
        log.record(TelemetryEventType::SessionCreated, json!({ "sessionId": "SESS_1" }));
        log.record(TelemetryEventType::ProctoringStopped, serde_json::Value::Null);

        let path = log.export_jsonl(temp_dir.path()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().next().unwrap().contains("\"type\":\"session_created\""));

        let events = read_events(&path).unwrap();
        assert_eq!(events, log.events());
    }

    #[test]
    fn test_clear() {
        let log = TelemetryLog::new();
        log.record(TelemetryEventType::AdmissionAssessed, json!({}));
        log.clear();
        assert!(log.is_empty());
    }
}
