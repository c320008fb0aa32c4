//! Cloud Resource Manager client (project listing)

use serde::Deserialize;

use datalift_errors::Result;
use datalift_net::NetClient;

/// One project visible to the caller
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInfo {
    #[serde(rename = "projectId")]
    pub project_id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ProjectList {
    #[serde(default)]
    projects: Vec<ProjectInfo>,
}

/// Client for the resource-manager API
#[derive(Clone)]
pub struct CrmClient {
    net: NetClient,
    endpoint: String,
}

impl CrmClient {
    #[must_use]
    pub fn new(net: NetClient, endpoint: impl Into<String>) -> Self {
        Self {
            net,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    /// List projects the credentials can see
    ///
    /// # Errors
    ///
    /// Returns an error if the listing request fails.
    pub async fn list_projects(&self) -> Result<Vec<ProjectInfo>> {
        let url = format!("{}/v1/projects", self.endpoint);
        let listing: ProjectList = self.net.get_json(&url).await?;
        Ok(listing.projects)
    }
}
