//! Batch progress events.
//!
//! The orchestrator publishes an `Event` for every milestone through its own
//! `EventDispatcher`. Handlers decide how to surface them: `LogEventHandler`
//! turns them into log lines and `JsonEventHandler` streams them as JSON.

use crate::processing::TransformResult;
use crate::reporting::BatchSummary;

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

pub mod json_handler;
pub mod log_handler;

pub use json_handler::JsonEventHandler;
pub use log_handler::LogEventHandler;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    BatchStarted {
        input_dir: PathBuf,
        output_dir: PathBuf,
        policy: String,
        jobs: usize,
    },

    FileStarted {
        path: PathBuf,
    },

    FileOutcome {
        path: PathBuf,
        destination: PathBuf,
        /// Absent when the file failed before a mode was chosen
        mode: Option<&'static str>,
        result: TransformResult,
        elapsed_secs: f64,
    },

    BatchCompleted {
        summary: BatchSummary,
    },
}

pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event);
}

pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn emit(&self, event: Event) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<String>>);

    impl EventHandler for Recorder {
        fn handle(&self, event: &Event) {
            let name = match event {
                Event::BatchStarted { .. } => "started",
                Event::FileStarted { .. } => "file",
                Event::FileOutcome { .. } => "outcome",
                Event::BatchCompleted { .. } => "completed",
            };
            self.0.lock().unwrap().push(name.to_string());
        }
    }

    #[test]
    fn dispatcher_fans_out_to_every_handler() {
        let first = Arc::new(Recorder(Mutex::new(Vec::new())));
        let second = Arc::new(Recorder(Mutex::new(Vec::new())));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_handler(first.clone());
        dispatcher.add_handler(second.clone());

        dispatcher.emit(Event::FileStarted {
            path: PathBuf::from("a.mp4"),
        });

        assert_eq!(*first.0.lock().unwrap(), vec!["file"]);
        assert_eq!(*second.0.lock().unwrap(), vec!["file"]);
    }
}
