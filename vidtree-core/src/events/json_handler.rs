//! JSON event handler for machine-readable progress output.
//!
//! Each event is written as one line of JSON with a `timestamp` field
//! (seconds since the Unix epoch) added.

use super::{Event, EventHandler};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Event handler that writes newline-delimited JSON.
pub struct JsonEventHandler {
    output: Mutex<Box<dyn Write + Send>>,
}

impl Default for JsonEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonEventHandler {
    /// Handler writing to stdout.
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            output: Mutex::new(writer),
        }
    }

    fn get_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

impl EventHandler for JsonEventHandler {
    fn handle(&self, event: &Event) {
        let mut value = match serde_json::to_value(event) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to serialize event: {}", e);
                return;
            }
        };
        if let Some(object) = value.as_object_mut() {
            object.insert("timestamp".to_string(), Self::get_timestamp().into());
        }

        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{value}");
            let _ = output.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::TransformResult;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_one_json_object_per_event() {
        let buf = SharedBuf::default();
        let handler = JsonEventHandler::with_writer(Box::new(buf.clone()));

        handler.handle(&Event::FileOutcome {
            path: PathBuf::from("/in/A/1.mp4"),
            destination: PathBuf::from("/out/A/1.mp4"),
            mode: Some("trim"),
            result: TransformResult::Success {
                input_size: 10,
                output_size: 10,
                transformed: false,
            },
            elapsed_secs: 0.5,
        });
        handler.handle(&Event::FileStarted {
            path: PathBuf::from("/in/B/3.mov"),
        });

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["type"], "file_outcome");
        assert_eq!(first["mode"], "trim");
        assert_eq!(first["result"]["status"], "success");
        assert_eq!(first["result"]["transformed"], false);
        assert!(first["timestamp"].is_u64());

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["type"], "file_started");
    }
}
