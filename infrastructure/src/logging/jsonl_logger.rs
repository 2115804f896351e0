//! JSONL file writer for execution events.
//!
//! Each [`ExecutionEvent`] is serialized as a single JSON line, appended to
//! the file via a buffered writer.

use prism_application::EventLogger;
use prism_domain::ExecutionEvent;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL event logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Appends to an existing file and
/// flushes after every record.
pub struct JsonlEventLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventLogger {
    /// Open (or create) the log at `path`, creating parent directories.
    ///
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open event log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventLogger for JsonlEventLogger {
    fn log(&self, event: &ExecutionEvent) {
        let Ok(line) = serde_json::to_string(event) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlEventLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_event_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("events.jsonl");
        let logger = JsonlEventLogger::new(&path).unwrap();

        logger.log(&ExecutionEvent::start("nlu", "orchestrator"));
        logger.log(&ExecutionEvent::error("database", 12, "TOOL_ERROR", "no such table"));

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["agent_id"], "nlu");
        assert_eq!(lines[0]["event_type"], "start");
        assert_eq!(lines[0]["metadata"]["caller"], "orchestrator");
        assert_eq!(lines[1]["event_type"], "error");
        assert!(lines[1]["timestamp"].is_string());
    }

    #[test]
    fn test_appends_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        JsonlEventLogger::new(&path)
            .unwrap()
            .log(&ExecutionEvent::end("nlu", 3));
        JsonlEventLogger::new(&path)
            .unwrap()
            .log(&ExecutionEvent::end("schema", 4));

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["agent_id"], "schema");
    }

    #[test]
    fn test_returns_none_when_path_is_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(JsonlEventLogger::new(dir.path()).is_none());
    }
}
