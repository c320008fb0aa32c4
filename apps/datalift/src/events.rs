//! Event handling and progress display

use std::collections::HashMap;

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use datalift_events::{
    AppEvent, EventMessage, GeneralEvent, ImportEvent, PipelineEvent, ProgressEvent,
    TrainingEvent, UploadEvent,
};

/// Event handler for progress display and user feedback
pub struct EventHandler {
    /// Multi-progress manager for concurrent progress bars
    multi_progress: MultiProgress,
    /// Active progress bars by progress id
    bars: HashMap<String, ProgressBar>,
    /// Colors enabled
    colors: bool,
    /// Show debug events
    debug: bool,
}

impl EventHandler {
    /// Create new event handler
    pub fn new(colors: bool, debug: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            bars: HashMap::new(),
            colors,
            debug,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        crate::logging::log_event_with_tracing(&message);

        match message.event {
            AppEvent::Progress(event) => self.handle_progress(event),
            AppEvent::Pipeline(event) => self.handle_pipeline(event),
            AppEvent::Upload(event) => self.handle_upload(event),
            AppEvent::Import(event) => self.handle_import(event),
            AppEvent::Training(event) => self.handle_training(event),
            AppEvent::General(event) => self.handle_general(event),
        }
    }

    fn handle_progress(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { id, operation, total } => {
                let bar = self
                    .multi_progress
                    .add(ProgressBar::new(total.unwrap_or(100)));
                bar.set_style(
                    ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
                bar.set_message(operation);
                self.bars.insert(id, bar);
            }
            ProgressEvent::Updated {
                id,
                fraction,
                current,
                total,
            } => {
                if let Some(bar) = self.bars.get(&id) {
                    if let (Some(current), Some(total)) = (current, total) {
                        bar.set_length(total);
                        bar.set_position(current);
                    } else {
                        bar.set_length(100);
                        bar.set_position((fraction * 100.0) as u64);
                    }
                }
            }
            ProgressEvent::Completed { id } => {
                if let Some(bar) = self.bars.remove(&id) {
                    bar.finish_and_clear();
                }
            }
            ProgressEvent::Failed { id, error } => {
                if let Some(bar) = self.bars.remove(&id) {
                    bar.abandon_with_message(error);
                }
            }
        }
    }

    fn handle_pipeline(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::StageStarted { label, .. } => {
                self.show_status(&label);
            }
            PipelineEvent::StageCompleted { label, .. } => {
                self.show_status(&format!("{} {label}", self.ok_mark()));
            }
            PipelineEvent::StageFailed { label, error, .. } => {
                self.show_error(&format!("{label}: {error}"));
            }
            PipelineEvent::PipelineCompleted => {
                self.show_status(&format!("{} Pre-processing completed", self.ok_mark()));
            }
            PipelineEvent::PipelineRestarted => {
                self.show_status("Pre-processing state cleared");
            }
        }
    }

    fn handle_upload(&mut self, event: UploadEvent) {
        match event {
            UploadEvent::RecordSkipped { record_id } => {
                if self.debug {
                    self.show_status(&format!("skipped {record_id} (missing image or label)"));
                }
            }
            UploadEvent::ObjectReused { record_id, .. } => {
                if self.debug {
                    self.show_status(&format!("{record_id} already uploaded, skipping"));
                }
            }
            UploadEvent::LabelBackfilled { record_id, object } => {
                self.show_status(&format!("relabeled {object} for {record_id}"));
            }
            UploadEvent::ObjectUploaded { object, label, .. } => {
                if self.debug {
                    self.show_status(&format!("uploaded {object} ({label})"));
                }
            }
            UploadEvent::RecordFailed { record_id, error } => {
                self.show_error(&format!("record {record_id} failed: {error}"));
            }
        }
    }

    fn handle_import(&mut self, event: ImportEvent) {
        match event {
            ImportEvent::Triggered { operation_id } => {
                self.show_status(&format!("import operation {operation_id} started"));
            }
            ImportEvent::OperationReused { operation_id } => {
                self.show_status(&format!("resuming import operation {operation_id}"));
            }
            ImportEvent::AlreadyRunning { operation_id } => match operation_id {
                Some(id) => self.show_status(&format!("import already running as {id}")),
                None => self.show_status("import already running"),
            },
            ImportEvent::Polled { .. } => {}
            ImportEvent::Terminal {
                operation_id,
                success,
                partial_failures,
            } => {
                if success {
                    self.show_status(&format!(
                        "{} import operation {operation_id} finished",
                        self.ok_mark()
                    ));
                } else {
                    self.show_error(&format!(
                        "import operation {operation_id} failed ({partial_failures} partial failures)"
                    ));
                }
            }
        }
    }

    fn handle_training(&mut self, event: TrainingEvent) {
        match event {
            TrainingEvent::Started {
                model_name,
                operation_id,
            } => {
                self.show_status(&format!(
                    "training {model_name} (operation {operation_id})"
                ));
            }
            TrainingEvent::OperationReused { operation_id } => {
                self.show_status(&format!("resuming training operation {operation_id}"));
            }
            TrainingEvent::Terminal {
                operation_id,
                success,
            } => {
                if success {
                    self.show_status(&format!(
                        "{} training operation {operation_id} finished",
                        self.ok_mark()
                    ));
                } else {
                    self.show_error(&format!("training operation {operation_id} failed"));
                }
            }
        }
    }

    fn handle_general(&mut self, event: GeneralEvent) {
        match event {
            GeneralEvent::Warning { message, context } => {
                let mut line = message;
                if let Some(context) = context {
                    line.push_str(": ");
                    line.push_str(&context);
                }
                self.show_warning(&line);
            }
            GeneralEvent::Error { message, details } => {
                let mut line = message;
                if let Some(details) = details {
                    line.push_str(": ");
                    line.push_str(&details);
                }
                self.show_error(&line);
            }
            GeneralEvent::DebugLog { message, .. } => {
                if self.debug {
                    self.show_status(&message);
                }
            }
            GeneralEvent::OperationStarted { operation } => {
                self.show_status(&operation);
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                if success {
                    self.show_status(&format!("{} {operation}", self.ok_mark()));
                } else {
                    self.show_error(&operation);
                }
            }
            GeneralEvent::OperationFailed { operation, error } => {
                self.show_error(&format!("{operation}: {error}"));
            }
        }
    }

    fn ok_mark(&self) -> String {
        if self.colors {
            style("ok").green().to_string()
        } else {
            "ok".to_string()
        }
    }

    fn show_status(&self, message: &str) {
        let _ = self.multi_progress.println(message);
    }

    fn show_warning(&self, message: &str) {
        let line = if self.colors {
            format!("{} {message}", style("warning:").yellow())
        } else {
            format!("warning: {message}")
        };
        let _ = self.multi_progress.println(line);
    }

    fn show_error(&self, message: &str) {
        let line = if self.colors {
            format!("{} {message}", style("error:").red())
        } else {
            format!("error: {message}")
        };
        let _ = self.multi_progress.println(line);
    }
}
