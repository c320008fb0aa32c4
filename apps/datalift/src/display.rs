//! Output rendering and formatting

use console::{style, Term};
use std::io;

use datalift_ops::{OperationResult, PipelinePhase, PipelineReport};
use datalift_types::ColorChoice;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Colors enabled
    colors: bool,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        let colors = match color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => Term::stdout().features().colors_supported(),
        };
        Self {
            json_output,
            colors,
        }
    }

    /// Whether colored output is active
    pub fn colors_enabled(&self) -> bool {
        self.colors
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_plain(result)
        }
    }

    /// Render as JSON
    fn render_json(&self, result: &OperationResult) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        println!("{json}");
        Ok(())
    }

    /// Render as human-readable text
    fn render_plain(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::Pipeline(report) => self.render_pipeline(report),
            OperationResult::Training(report) => {
                println!(
                    "Model {} built (operation {})",
                    report.model_name, report.operation_id
                );
                Ok(())
            }
            OperationResult::Projects(projects) => {
                if projects.is_empty() {
                    println!("No projects visible.");
                }
                for project in projects {
                    println!("{}\t{}", project.project_id, project.name);
                }
                Ok(())
            }
            OperationResult::Datasets(datasets) => {
                if datasets.is_empty() {
                    println!("No datasets in this project.");
                }
                for dataset in datasets {
                    println!(
                        "{}\t{}\t{} examples",
                        dataset.display_name, dataset.name, dataset.example_count
                    );
                }
                Ok(())
            }
            OperationResult::Dataset(dataset) => {
                println!("Created dataset {} ({})", dataset.display_name, dataset.name);
                Ok(())
            }
            OperationResult::Buckets(buckets) => {
                if buckets.is_empty() {
                    println!("No buckets in this project.");
                }
                for bucket in buckets {
                    println!("{bucket}");
                }
                Ok(())
            }
            OperationResult::Success(message) => {
                println!("{message}");
                Ok(())
            }
        }
    }

    fn render_pipeline(&self, report: &PipelineReport) -> io::Result<()> {
        let heading = match report.phase {
            PipelinePhase::NotStarted => "Pre-processing not started",
            PipelinePhase::InProgress => "Pre-processing in progress",
            PipelinePhase::Completed => "Pre-processing completed",
            PipelinePhase::Failed => "Pre-processing failed",
        };
        println!("{heading}");

        for (index, step) in report.completed_steps.iter().enumerate() {
            let mark = if step.status {
                self.paint_green("[ok]")
            } else {
                self.paint_red("[failed]")
            };
            println!("  {}. {} {mark}", index + 1, step.name);
        }

        if report.phase == PipelinePhase::InProgress && !report.current_step.is_empty() {
            println!(
                "  current: {} ({:.0}%)",
                report.current_step,
                report.progress * 100.0
            );
        }

        if report.phase == PipelinePhase::Failed {
            if !report.error_message.is_empty() {
                for line in report.error_message.lines() {
                    println!("  {}", self.paint_red(line));
                }
            }
            println!("Run `datalift restart` to clear state and start over.");
        }

        Ok(())
    }

    fn paint_green(&self, text: &str) -> String {
        if self.colors {
            style(text).green().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_red(&self, text: &str) -> String {
        if self.colors {
            style(text).red().to_string()
        } else {
            text.to_string()
        }
    }
}
