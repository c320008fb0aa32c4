//! Integration tests for persisted pipeline state

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use datalift_pipeline::StateStore;
    use datalift_state::StateManager;
    use datalift_types::{OperationId, PipelineSnapshot, Stage, StepOutcome};

    async fn manager() -> (TempDir, StateManager) {
        let dir = TempDir::new().expect("tempdir");
        let manager = StateManager::new(dir.path()).await.expect("state manager");
        (dir, manager)
    }

    #[tokio::test]
    async fn load_without_row_yields_default_snapshot() {
        let (_dir, state) = manager().await;
        let snapshot = state.load().await.unwrap();
        assert_eq!(snapshot.stage, None);
        assert!(snapshot.completed_steps.is_empty());
        assert_eq!(snapshot.version, 0);
    }

    #[tokio::test]
    async fn save_and_reload_round_trips_snapshot() {
        let (_dir, state) = manager().await;

        let snapshot = PipelineSnapshot {
            stage: Some(Stage::Import),
            operation_id: OperationId::new("op-7"),
            completed_steps: vec![
                StepOutcome::success(Stage::Upload.step_name()),
                StepOutcome::failure(Stage::Manifest.step_name(), "listing failed"),
            ],
            progress: 0.66,
            current_step: Stage::Import.step_label(),
            error_message: "listing failed".to_string(),
            version: 0,
        };

        let saved = state.save(&snapshot).await.unwrap();
        assert_eq!(saved.version, 1);

        let loaded = state.load().await.unwrap();
        assert_eq!(loaded.stage, Some(Stage::Import));
        assert_eq!(loaded.operation_id.as_str(), "op-7");
        assert_eq!(loaded.completed_steps.len(), 2);
        assert_eq!(
            loaded.completed_steps[1].error.as_deref(),
            Some("listing failed")
        );
        assert!((loaded.progress - 0.66).abs() < 1e-9);
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn stale_version_save_is_rejected() {
        let (_dir, state) = manager().await;

        let first = state.save(&PipelineSnapshot::default()).await.unwrap();
        assert_eq!(first.version, 1);

        // A snapshot still carrying version 0 is stale now.
        let stale = PipelineSnapshot::default();
        let error = state.save(&stale).await.unwrap_err();
        assert!(matches!(
            error,
            datalift_errors::Error::State(datalift_errors::StateError::Conflict { .. })
        ));

        // The winner can keep going.
        let winner = state.save(&first).await.unwrap();
        assert_eq!(winner.version, 2);
    }

    #[tokio::test]
    async fn clear_resets_to_first_entry_state() {
        let (_dir, state) = manager().await;

        let mut snapshot = PipelineSnapshot {
            stage: Some(Stage::Manifest),
            error_message: "boom".to_string(),
            ..PipelineSnapshot::default()
        };
        snapshot = state.save(&snapshot).await.unwrap();
        assert_eq!(snapshot.version, 1);

        state.clear().await.unwrap();

        let fresh = state.load().await.unwrap();
        assert_eq!(fresh.stage, None);
        assert!(fresh.completed_steps.is_empty());
        assert!(fresh.error_message.is_empty());
        assert_eq!(fresh.version, 0);
    }

    #[tokio::test]
    async fn training_operation_round_trip() {
        let (_dir, state) = manager().await;

        assert!(state.training_operation().await.unwrap().is_empty());

        state
            .set_training_operation(&OperationId::new("train-3"), "flowers-v1")
            .await
            .unwrap();
        assert_eq!(state.training_operation().await.unwrap().as_str(), "train-3");

        state.clear_training_operation().await.unwrap();
        assert!(state.training_operation().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn state_survives_manager_reopen() {
        let dir = TempDir::new().expect("tempdir");
        {
            let state = StateManager::new(dir.path()).await.unwrap();
            let snapshot = PipelineSnapshot {
                stage: Some(Stage::Upload),
                ..PipelineSnapshot::default()
            };
            state.save(&snapshot).await.unwrap();
        }

        // A new process resumes from the same stage.
        let state = StateManager::new(dir.path()).await.unwrap();
        let loaded = state.load().await.unwrap();
        assert_eq!(loaded.stage, Some(Stage::Upload));
        assert_eq!(loaded.version, 1);
    }
}
