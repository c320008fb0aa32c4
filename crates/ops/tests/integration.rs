//! Integration tests for operation results and reports

#[cfg(test)]
mod tests {
    use datalift_ops::{OperationResult, PipelinePhase, PipelineReport};
    use datalift_types::{PipelineSnapshot, Stage, StepOutcome};

    fn failed_snapshot() -> PipelineSnapshot {
        PipelineSnapshot {
            stage: Some(Stage::Manifest),
            completed_steps: vec![
                StepOutcome::success(Stage::Upload.step_name()),
                StepOutcome::failure(Stage::Manifest.step_name(), "listing failed"),
            ],
            error_message: "listing failed".to_string(),
            ..PipelineSnapshot::default()
        }
    }

    #[test]
    fn failed_pipeline_is_not_success() {
        let result = OperationResult::Pipeline(PipelineReport::from(failed_snapshot()));
        assert!(!result.is_success());
    }

    #[test]
    fn json_output_carries_step_log() {
        let result = OperationResult::Pipeline(PipelineReport::from(failed_snapshot()));
        let json = result.to_json().unwrap();
        assert!(json.contains("\"type\": \"Pipeline\""));
        assert!(json.contains("listing failed"));
        assert!(json.contains(Stage::Upload.step_name()));
    }

    #[test]
    fn success_variants_serialize() {
        let result = OperationResult::Success("done".to_string());
        assert!(result.is_success());
        let json = result.to_json().unwrap();
        assert!(json.contains("done"));
    }

    #[test]
    fn fresh_snapshot_reports_not_started() {
        let report = PipelineReport::from(PipelineSnapshot::default());
        assert_eq!(report.phase, PipelinePhase::NotStarted);
    }
}
