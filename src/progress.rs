//! Progress events and the sinks that receive them.
//!
//! All audit text produced by a run flows through a `ProgressSink`. The sink
//! answers each event with a cancel flag, which the workflow samples only at
//! step starts.
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusType {
    Running,
    Complete,
    Failed,
}

impl StatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusType::Running => "running",
            StatusType::Complete => "complete",
            StatusType::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub context: String,
    pub message: String,
    pub status: StatusType,
    pub id: i64,
    pub sequence: u64,
    pub cancel_requested: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub trait ProgressSink {
    /// Receive an event; returning `true` asks the run to cancel.
    fn on_progress(&mut self, event: &ProgressEvent) -> bool;
}

/// Per-run event emitter. Owns the sequence counter so every run starts at 0.
pub struct ProgressReporter<'a> {
    sink: &'a mut dyn ProgressSink,
    next_sequence: u64,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(sink: &'a mut dyn ProgressSink) -> Self {
        Self {
            sink,
            next_sequence: 0,
        }
    }

    fn emit(
        &mut self,
        context: &str,
        message: String,
        status: StatusType,
        id: i64,
        cancel_requested: bool,
        error: Option<String>,
    ) -> bool {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        match error.as_deref() {
            Some(error) => tracing::warn!(
                context,
                sequence,
                status = status.as_str(),
                error,
                "{message}"
            ),
            None => tracing::info!(context, sequence, status = status.as_str(), "{message}"),
        }
        let event = ProgressEvent {
            context: context.to_string(),
            message,
            status,
            id,
            sequence,
            cancel_requested,
            error,
        };
        self.sink.on_progress(&event)
    }

    /// Announce a step. Returns `true` when the sink requests cancellation.
    pub fn step_starting(&mut self, context: &str, message: impl Into<String>) -> bool {
        self.step_starting_with_id(context, message, 0)
    }

    pub fn step_starting_with_id(
        &mut self,
        context: &str,
        message: impl Into<String>,
        id: i64,
    ) -> bool {
        let cancel = self.emit(context, message.into(), StatusType::Running, id, false, None);
        if cancel {
            tracing::info!(context, "cancellation requested");
        }
        cancel
    }

    pub fn step_progress(&mut self, context: &str, message: impl Into<String>) {
        self.emit(context, message.into(), StatusType::Running, 0, false, None);
    }

    pub fn step_error(&mut self, context: &str, message: impl Into<String>, error: String) {
        self.emit(
            context,
            message.into(),
            StatusType::Running,
            0,
            false,
            Some(error),
        );
    }

    pub fn step_finished(&mut self, context: &str, message: impl Into<String>) {
        self.emit(context, message.into(), StatusType::Running, 0, false, None);
    }

    /// Emit the single terminal event of a run.
    pub fn finish(
        &mut self,
        context: &str,
        message: impl Into<String>,
        ok: bool,
        cancel_requested: bool,
        error: Option<String>,
    ) {
        let status = if ok {
            StatusType::Complete
        } else {
            StatusType::Failed
        };
        self.emit(context, message.into(), status, 0, cancel_requested, error);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleFormat {
    Text,
    Json,
}

/// Writes events to the terminal: text on stderr, or JSON Lines on stdout.
///
/// When `cancel_file` is set, its existence at any event requests
/// cancellation.
pub struct ConsoleSink {
    format: ConsoleFormat,
    cancel_file: Option<PathBuf>,
}

impl ConsoleSink {
    pub fn new(format: ConsoleFormat, cancel_file: Option<PathBuf>) -> Self {
        Self {
            format,
            cancel_file,
        }
    }
}

impl ProgressSink for ConsoleSink {
    fn on_progress(&mut self, event: &ProgressEvent) -> bool {
        match self.format {
            ConsoleFormat::Text => {
                eprintln!(
                    "[{:>3}] {} {}: {}",
                    event.sequence,
                    event.status.as_str(),
                    event.context,
                    event.message
                );
                if let Some(error) = &event.error {
                    eprintln!("      error: {error}");
                }
            }
            ConsoleFormat::Json => match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(err) => tracing::error!(error = %err, "serialize progress event"),
            },
        }
        self.cancel_file.as_ref().is_some_and(|path| path.exists())
    }
}

/// Collects events in memory; optionally cancels at a given sequence.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    pub(crate) events: Vec<ProgressEvent>,
    pub(crate) cancel_at: Option<u64>,
}

#[cfg(test)]
impl RecordingSink {
    pub(crate) fn cancelling_at(sequence: u64) -> Self {
        Self {
            events: Vec::new(),
            cancel_at: Some(sequence),
        }
    }

    pub(crate) fn messages(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.message.as_str()).collect()
    }

    pub(crate) fn terminal(&self) -> &ProgressEvent {
        self.events.last().expect("at least one event")
    }
}

#[cfg(test)]
impl ProgressSink for RecordingSink {
    fn on_progress(&mut self, event: &ProgressEvent) -> bool {
        self.events.push(event.clone());
        self.cancel_at == Some(event.sequence)
    }
}
