//! Progress reporting for pipeline runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// A progress event.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// The run has started.
    Started {
        total_passes: usize,
    },
    /// A pass is about to run.
    PassStarted {
        name: String,
        index: usize,
        total: usize,
    },
    /// A pass has returned.
    PassCompleted {
        name: String,
        duration_ms: u64,
        changed: bool,
    },
    /// A pass reported a warning.
    Warning {
        name: String,
        message: String,
    },
    /// A pass stopped the pipeline.
    Halted {
        name: String,
    },
    /// The run has finished.
    Completed {
        total_duration_ms: u64,
        passes_run: usize,
    },
    /// A pass failed.
    Error {
        name: String,
        message: String,
    },
}

/// Callback type for progress events.
pub type ProgressCallback = Box<dyn Fn(PipelineEvent) + Send + Sync>;

/// Counts passes and forwards events to an optional callback.
pub struct ProgressTracker<'a> {
    total_passes: usize,
    passes_run: AtomicUsize,
    start_time: Option<Instant>,
    callback: Option<&'a (dyn Fn(PipelineEvent) + Send + Sync)>,
}

impl<'a> ProgressTracker<'a> {
    /// Create a tracker for `total_passes` passes.
    pub fn new(total_passes: usize) -> Self {
        Self {
            total_passes,
            passes_run: AtomicUsize::new(0),
            start_time: None,
            callback: None,
        }
    }

    /// Forward events to `callback`.
    pub fn with_callback(mut self, callback: &'a (dyn Fn(PipelineEvent) + Send + Sync)) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Start tracking.
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
        self.send(PipelineEvent::Started {
            total_passes: self.total_passes,
        });
    }

    /// Report that a pass is starting.
    pub fn pass_started(&self, name: &str) {
        self.send(PipelineEvent::PassStarted {
            name: name.to_string(),
            index: self.passes_run.load(Ordering::Relaxed),
            total: self.total_passes,
        });
    }

    /// Report that a pass has returned.
    pub fn pass_completed(&self, name: &str, duration_ms: u64, changed: bool) {
        self.passes_run.fetch_add(1, Ordering::Relaxed);
        self.send(PipelineEvent::PassCompleted {
            name: name.to_string(),
            duration_ms,
            changed,
        });
    }

    pub fn warning(&self, name: &str, message: &str) {
        self.send(PipelineEvent::Warning {
            name: name.to_string(),
            message: message.to_string(),
        });
    }

    pub fn halted(&self, name: &str) {
        self.send(PipelineEvent::Halted {
            name: name.to_string(),
        });
    }

    pub fn report_error(&self, name: &str, message: String) {
        self.send(PipelineEvent::Error {
            name: name.to_string(),
            message,
        });
    }

    /// Complete tracking.
    pub fn complete(&self) {
        self.send(PipelineEvent::Completed {
            total_duration_ms: self.elapsed_ms(),
            passes_run: self.passes_run(),
        });
    }

    /// Number of passes that have returned.
    pub fn passes_run(&self) -> usize {
        self.passes_run.load(Ordering::Relaxed)
    }

    /// Milliseconds since `start`.
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    fn send(&self, event: PipelineEvent) {
        if let Some(callback) = self.callback {
            callback(event);
        }
    }
}
