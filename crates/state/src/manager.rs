//! State manager implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

use datalift_errors::{Error, Result, StateError};
use datalift_pipeline::StateStore;
use datalift_types::{OperationId, PipelineSnapshot, Stage, StepOutcome};

/// Owns the database pool and exposes the persisted wizard state
#[derive(Clone)]
pub struct StateManager {
    pool: Pool<Sqlite>,
}

impl StateManager {
    /// Create a new state manager with database setup
    ///
    /// # Errors
    ///
    /// Returns an error if database setup, migrations, or directory
    /// creation fails.
    pub async fn new(base_path: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(base_path).await?;
        let db_path = base_path.join("state.sqlite");

        let pool = crate::create_pool(&db_path).await?;
        crate::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a state manager over an existing pool
    #[must_use]
    pub fn with_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Currently persisted training operation id (empty when none)
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn training_operation(&self) -> Result<OperationId> {
        let row = sqlx::query("SELECT operation_id FROM training_state WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(row
            .map(|r| OperationId::new(r.get::<String, _>("operation_id")))
            .unwrap_or_default())
    }

    /// Persist the training operation id alongside the model name
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn set_training_operation(
        &self,
        operation: &OperationId,
        model_name: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO training_state (id, operation_id, model_name, updated_at) \
             VALUES (1, ?1, ?2, ?3) \
             ON CONFLICT(id) DO UPDATE SET \
                 operation_id = excluded.operation_id, \
                 model_name = excluded.model_name, \
                 updated_at = excluded.updated_at",
        )
        .bind(operation.as_str())
        .bind(model_name)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Forget the training operation (after it reached terminal state)
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn clear_training_operation(&self) -> Result<()> {
        sqlx::query("DELETE FROM training_state WHERE id = 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn decode_steps(raw: &str) -> Result<Vec<StepOutcome>> {
    serde_json::from_str(raw).map_err(|e| {
        StateError::StateCorrupted {
            message: format!("completed_steps column: {e}"),
        }
        .into()
    })
}

#[async_trait]
impl StateStore for StateManager {
    async fn load(&self) -> Result<PipelineSnapshot> {
        let row = sqlx::query(
            "SELECT stage, operation_id, completed_steps, progress, current_step, \
                    error_message, version \
             FROM pipeline_state WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(PipelineSnapshot::default());
        };

        let stage = row
            .get::<Option<i64>, _>("stage")
            .and_then(|n| u8::try_from(n).ok())
            .and_then(Stage::from_number);

        Ok(PipelineSnapshot {
            stage,
            operation_id: OperationId::new(row.get::<String, _>("operation_id")),
            completed_steps: decode_steps(&row.get::<String, _>("completed_steps"))?,
            progress: row.get::<f64, _>("progress"),
            current_step: row.get::<String, _>("current_step"),
            error_message: row.get::<String, _>("error_message"),
            version: row.get::<i64, _>("version"),
        })
    }

    async fn save(&self, snapshot: &PipelineSnapshot) -> Result<PipelineSnapshot> {
        let steps = serde_json::to_string(&snapshot.completed_steps)?;
        let stage = snapshot.stage.map(|s| i64::from(s.number()));
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;

        let current_version: i64 =
            sqlx::query("SELECT version FROM pipeline_state WHERE id = 1")
                .fetch_optional(&mut *tx)
                .await?
                .map_or(0, |row| row.get::<i64, _>("version"));

        if snapshot.version != current_version {
            return Err(Error::from(StateError::Conflict {
                expected: snapshot.version,
            }));
        }

        let next_version = snapshot.version + 1;
        sqlx::query(
            "INSERT INTO pipeline_state \
                 (id, stage, operation_id, completed_steps, progress, current_step, \
                  error_message, version, updated_at) \
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT(id) DO UPDATE SET \
                 stage = excluded.stage, \
                 operation_id = excluded.operation_id, \
                 completed_steps = excluded.completed_steps, \
                 progress = excluded.progress, \
                 current_step = excluded.current_step, \
                 error_message = excluded.error_message, \
                 version = excluded.version, \
                 updated_at = excluded.updated_at",
        )
        .bind(stage)
        .bind(snapshot.operation_id.as_str())
        .bind(&steps)
        .bind(snapshot.progress)
        .bind(&snapshot.current_step)
        .bind(&snapshot.error_message)
        .bind(next_version)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut saved = snapshot.clone();
        saved.version = next_version;
        Ok(saved)
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM pipeline_state WHERE id = 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
