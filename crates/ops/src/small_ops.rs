//! Thin CRUD operations over the cloud APIs - form-filling glue for the
//! provisioning commands.

use datalift_errors::Result;
use datalift_gcloud::ClassificationType;
use datalift_types::ProjectId;

use crate::context::OpsCtx;
use crate::types::{DatasetSummary, ProjectSummary};

/// List projects visible to the configured credentials.
///
/// # Errors
///
/// Returns an error if the listing request fails.
pub async fn list_projects(ctx: &OpsCtx) -> Result<Vec<ProjectSummary>> {
    let projects = ctx.crm.list_projects().await?;
    Ok(projects
        .into_iter()
        .map(|p| ProjectSummary {
            project_id: p.project_id,
            name: p.name,
        })
        .collect())
}

/// List the configured project's datasets.
///
/// # Errors
///
/// Returns an error if the listing request fails.
pub async fn list_datasets(ctx: &OpsCtx) -> Result<Vec<DatasetSummary>> {
    let project = ProjectId::new(&ctx.config.gcloud.project);
    let datasets = ctx.automl.list_datasets(&project).await?;
    Ok(datasets.into_iter().map(summarize).collect())
}

/// Create an image-classification dataset.
///
/// # Errors
///
/// Returns an error if the creation request fails.
pub async fn create_dataset(
    ctx: &OpsCtx,
    display_name: &str,
    multilabel: bool,
) -> Result<DatasetSummary> {
    let project = ProjectId::new(&ctx.config.gcloud.project);
    let classification_type = if multilabel {
        ClassificationType::Multilabel
    } else {
        ClassificationType::Multiclass
    };
    let dataset = ctx
        .automl
        .create_dataset(&project, display_name, classification_type)
        .await?;
    Ok(summarize(dataset))
}

/// List the configured project's storage buckets.
///
/// # Errors
///
/// Returns an error if the listing request fails.
pub async fn list_buckets(ctx: &OpsCtx) -> Result<Vec<String>> {
    ctx.storage.list_buckets(&ctx.config.gcloud.project).await
}

fn summarize(dataset: datalift_gcloud::DatasetInfo) -> DatasetSummary {
    DatasetSummary {
        name: dataset.name,
        display_name: dataset.display_name,
        example_count: dataset.example_count,
    }
}
