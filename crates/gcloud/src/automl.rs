//! Managed-ML client (AutoML v1beta1 API)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use datalift_errors::{AutomlError, Error, NetworkError, Result};
use datalift_net::NetClient;
use datalift_pipeline::{DatasetService, ImportStart};
use datalift_types::{
    DatasetRef, OperationId, OperationOutcome, OperationTerminal, ProjectId, StorageUri,
};

/// All datasets live in the API's single supported location
const LOCATION: &str = "us-central1";

/// Classification type for new datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationType {
    Multiclass,
    Multilabel,
}

/// Dataset listing entry
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetInfo {
    /// Full machine name (`projects/.../datasets/ICN...`)
    pub name: String,
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    #[serde(rename = "exampleCount", default)]
    pub example_count: i64,
}

#[derive(Debug, Deserialize)]
struct DatasetList {
    #[serde(default)]
    datasets: Vec<DatasetInfo>,
}

#[derive(Debug, Deserialize)]
struct OperationResource {
    name: String,
    #[serde(default)]
    done: bool,
    error: Option<OperationError>,
    metadata: Option<OperationMetadata>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct OperationMetadata {
    #[serde(rename = "@type", default)]
    type_url: String,
    #[serde(rename = "partialFailures", default)]
    partial_failures: Vec<PartialFailure>,
}

#[derive(Debug, Deserialize)]
struct PartialFailure {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct OperationList {
    #[serde(default)]
    operations: Vec<OperationResource>,
}

/// Client for dataset CRUD, imports, operations, and model training
#[derive(Clone)]
pub struct AutomlClient {
    net: NetClient,
    endpoint: String,
}

impl AutomlClient {
    #[must_use]
    pub fn new(net: NetClient, endpoint: impl Into<String>) -> Self {
        Self {
            net,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn location_url(&self, project: &ProjectId) -> String {
        format!(
            "{}/v1beta1/projects/{}/locations/{}",
            self.endpoint, project, LOCATION
        )
    }

    /// List the project's datasets
    ///
    /// # Errors
    ///
    /// Returns an error if the listing request fails.
    pub async fn list_datasets(&self, project: &ProjectId) -> Result<Vec<DatasetInfo>> {
        let url = format!("{}/datasets", self.location_url(project));
        let listing: DatasetList = self.net.get_json(&url).await?;
        Ok(listing.datasets)
    }

    /// Create an image-classification dataset
    ///
    /// # Errors
    ///
    /// Returns an error if the creation request fails.
    pub async fn create_dataset(
        &self,
        project: &ProjectId,
        display_name: &str,
        classification_type: ClassificationType,
    ) -> Result<DatasetInfo> {
        let url = format!("{}/datasets", self.location_url(project));
        let body = serde_json::json!({
            "displayName": display_name,
            "imageClassificationDatasetMetadata": {
                "classificationType": classification_type,
            },
        });
        let dataset: DatasetInfo = self.net.post_json(&url, &body).await?;
        Ok(dataset)
    }

    /// Trigger model training; returns the operation to poll
    ///
    /// # Errors
    ///
    /// Returns an error if the training trigger fails.
    pub async fn create_model(
        &self,
        project: &ProjectId,
        dataset: &DatasetRef,
        model_name: &str,
        train_budget: u64,
    ) -> Result<OperationId> {
        let url = format!("{}/models", self.location_url(project));
        let body = serde_json::json!({
            "displayName": model_name,
            "datasetId": dataset.dataset_id(),
            "imageClassificationModelMetadata": {
                "trainBudget": train_budget,
            },
        });
        let operation: serde_json::Value =
            self.net.post_json(&url, &body).await.map_err(|e| {
                Error::from(AutomlError::TrainingFailed {
                    message: e.to_string(),
                })
            })?;
        operation_id_from_value(&operation)
    }

    async fn get_operation(
        &self,
        project: &ProjectId,
        operation: &OperationId,
    ) -> Result<OperationResource> {
        let url = format!("{}/operations/{}", self.location_url(project), operation);
        self.net.get_json(&url).await
    }
}

fn operation_id_from_value(value: &serde_json::Value) -> Result<OperationId> {
    let name = value
        .get("name")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| {
            Error::from(AutomlError::MalformedOperationName {
                name: value.to_string(),
            })
        })?;
    Ok(OperationId::from_operation_name(name))
}

/// The trigger error the remote raises while an import is in flight.
/// A conflict status is definitive; some deployments return it as a plain
/// bad request with a telltale message instead.
fn is_already_running(status: u16, message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    status == 409 || (status == 400 && (message.contains("already") || message.contains("in progress")))
}

#[async_trait]
impl DatasetService for AutomlClient {
    async fn import_data(
        &self,
        project: &ProjectId,
        dataset: &DatasetRef,
        source_uri: &StorageUri,
    ) -> Result<ImportStart> {
        let url = format!(
            "{}/datasets/{}:importData",
            self.location_url(project),
            dataset.dataset_id()
        );
        let body = serde_json::json!({
            "inputConfig": {
                "gcsSource": { "inputUris": [source_uri.as_str()] },
            },
        });

        match self.net.post_json::<_, serde_json::Value>(&url, &body).await {
            Ok(operation) => Ok(ImportStart::Started(operation_id_from_value(&operation)?)),
            Err(Error::Network(NetworkError::HttpError { status, message }))
                if is_already_running(status, &message) =>
            {
                Ok(ImportStart::AlreadyRunning)
            }
            Err(Error::Network(NetworkError::HttpError { message, .. })) => {
                Err(AutomlError::ImportFailed { message }.into())
            }
            Err(other) => Err(other),
        }
    }

    async fn find_running_import(
        &self,
        project: &ProjectId,
        dataset: &DatasetRef,
    ) -> Result<Option<OperationId>> {
        let url = format!("{}/operations", self.location_url(project));
        let listing: OperationList = self.net.get_json(&url).await?;
        let running = listing.operations.into_iter().find(|op| {
            !op.done
                && op
                    .metadata
                    .as_ref()
                    .is_some_and(|meta| meta.type_url.contains("ImportData"))
        });
        // The operations listing does not name the dataset; the single
        // supported location runs at most one import per dataset, so the
        // first running import is taken.
        let _ = dataset;
        Ok(running.map(|op| OperationId::from_operation_name(&op.name)))
    }

    async fn poll_operation(
        &self,
        project: &ProjectId,
        operation: &OperationId,
    ) -> Result<OperationOutcome> {
        let resource = self.get_operation(project, operation).await?;
        if !resource.done {
            return Ok(OperationOutcome::Pending);
        }
        match resource.error {
            None => Ok(OperationOutcome::Done(OperationTerminal::Succeeded)),
            Some(error) => {
                let partial_failures = resource
                    .metadata
                    .map(|meta| {
                        meta.partial_failures
                            .into_iter()
                            .map(|failure| failure.message)
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(OperationOutcome::Done(OperationTerminal::Failed {
                    message: error.message,
                    partial_failures,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_running_detection() {
        assert!(is_already_running(409, "conflict"));
        assert!(is_already_running(400, "An import task is already in progress"));
        assert!(!is_already_running(400, "invalid input uri"));
        assert!(!is_already_running(500, "already broken"));
    }

    #[test]
    fn operation_id_extraction() {
        let value = serde_json::json!({"name": "projects/p/locations/us-central1/operations/777"});
        assert_eq!(operation_id_from_value(&value).unwrap().as_str(), "777");
    }
}
