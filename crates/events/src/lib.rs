#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in datalift
//!
//! All user-visible output flows through events - no direct logging or
//! printing is allowed outside the CLI. Events are grouped by functional
//! domain and wrapped with structured metadata for tracing integration.
//! This is the progress-event stream that presentation layers consume
//! independently of the pipeline.

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::{
    AppEvent, FailureContext, GeneralEvent, ImportEvent, PipelineEvent, ProgressEvent,
    TrainingEvent, UploadEvent,
};

use tokio::sync::mpsc::UnboundedSender;

/// An event plus the metadata captured at emission time
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: AppEvent,
}

impl EventMessage {
    /// Wrap an event with metadata derived from its domain and severity.
    #[must_use]
    pub fn new(event: AppEvent) -> Self {
        Self {
            meta: EventMeta::new(event.level(), event.source()),
            event,
        }
    }
}

/// Type alias for event sender
pub type EventSender = UnboundedSender<EventMessage>;

/// Type alias for event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout the datalift system
///
/// This trait provides a single, consistent API for emitting events
/// regardless of whether you have a raw `EventSender` or a struct that
/// contains one.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(EventMessage::new(event));
        }
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    /// Emit a warning event
    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }

    /// Emit an error event
    fn emit_error(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::error(message)));
    }

    /// Emit an operation started event
    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    /// Emit an operation completed event
    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::General(GeneralEvent::OperationCompleted {
            operation: operation.into(),
            success,
        }));
    }

    /// Emit an operation failed event
    fn emit_operation_failed(&self, operation: impl Into<String>, error: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationFailed {
            operation: operation.into(),
            error: error.into(),
        }));
    }

    /// Emit a progress fraction update
    fn emit_progress_fraction(&self, id: impl Into<String>, fraction: f64) {
        self.emit(AppEvent::Progress(ProgressEvent::fraction(id, fraction)));
    }

    /// Emit a counted progress update
    fn emit_progress_counted(&self, id: impl Into<String>, current: u64, total: u64) {
        self.emit(AppEvent::Progress(ProgressEvent::counted(
            id, current, total,
        )));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
/// This allows `EventSender` to be used directly where `EventEmitter` is expected
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_wraps_event_with_meta() {
        let (tx, mut rx) = channel();
        tx.emit_warning("partial upload");

        let message = rx.try_recv().expect("event present");
        assert_eq!(message.meta.level, EventLevel::Warn);
        assert_eq!(message.meta.source, EventSource::GENERAL);
        assert!(matches!(
            message.event,
            AppEvent::General(GeneralEvent::Warning { .. })
        ));
    }

    #[tokio::test]
    async fn counted_progress_computes_fraction() {
        let (tx, mut rx) = channel();
        tx.emit_progress_counted("preprocess", 2, 3);

        let message = rx.try_recv().expect("event present");
        if let AppEvent::Progress(ProgressEvent::Updated { fraction, .. }) = message.event {
            assert!((fraction - 2.0 / 3.0).abs() < f64::EPSILON);
        } else {
            panic!("expected progress update");
        }
    }
}
