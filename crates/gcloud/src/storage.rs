//! Object storage client (GCS JSON API)

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;

use datalift_errors::{Error, NetworkError, Result, StorageError};
use datalift_net::NetClient;
use datalift_pipeline::ObjectStore;
use datalift_types::{BucketName, ObjectMetadata, RemoteObject};

/// RFC 3986 unreserved characters stay literal; everything else (including
/// `/`) is escaped, since the whole object name is one path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Client for the object storage JSON + upload APIs
#[derive(Clone)]
pub struct StorageClient {
    net: NetClient,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct ObjectResource {
    name: String,
    #[serde(default)]
    metadata: ObjectMetadata,
}

#[derive(Debug, Deserialize)]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectResource>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BucketResource {
    name: String,
}

#[derive(Debug, Deserialize)]
struct BucketList {
    #[serde(default)]
    items: Vec<BucketResource>,
}

impl StorageClient {
    #[must_use]
    pub fn new(net: NetClient, endpoint: impl Into<String>) -> Self {
        Self {
            net,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn object_url(&self, bucket: &BucketName, name: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}",
            self.endpoint,
            bucket,
            encode_segment(name)
        )
    }

    /// List the project's buckets
    ///
    /// # Errors
    ///
    /// Returns an error if the listing request fails.
    pub async fn list_buckets(&self, project: &str) -> Result<Vec<String>> {
        let url = format!("{}/storage/v1/b?project={}", self.endpoint, project);
        let listing: BucketList = self.net.get_json(&url).await?;
        Ok(listing.items.into_iter().map(|b| b.name).collect())
    }
}

#[async_trait]
impl ObjectStore for StorageClient {
    async fn stat(&self, bucket: &BucketName, name: &str) -> Result<Option<ObjectMetadata>> {
        let response = self.net.get(&self.object_url(bucket, name)).await?;
        match response.status().as_u16() {
            404 => Ok(None),
            status if (200..300).contains(&status) => {
                let resource: ObjectResource = response
                    .json()
                    .await
                    .map_err(|e| Error::from(NetworkError::InvalidResponse(e.to_string())))?;
                Ok(Some(resource.metadata))
            }
            status => Err(NetworkError::HttpError {
                status,
                message: response.text().await.unwrap_or_default(),
            }
            .into()),
        }
    }

    async fn upload(
        &self,
        bucket: &BucketName,
        name: &str,
        media_type: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let url = format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.endpoint,
            bucket,
            encode_segment(name)
        );
        self.net
            .post_bytes(&url, media_type, bytes)
            .await
            .map_err(|e| {
                Error::from(StorageError::UploadFailed {
                    object: name.to_string(),
                    message: e.to_string(),
                })
            })?;
        Ok(())
    }

    async fn patch_metadata(
        &self,
        bucket: &BucketName,
        name: &str,
        metadata: ObjectMetadata,
    ) -> Result<()> {
        let body = serde_json::json!({ "metadata": metadata });
        let _: serde_json::Value = self
            .net
            .patch_json(&self.object_url(bucket, name), &body)
            .await
            .map_err(|e| {
                Error::from(StorageError::MetadataPatchFailed {
                    object: name.to_string(),
                    message: e.to_string(),
                })
            })?;
        Ok(())
    }

    async fn list(&self, bucket: &BucketName, prefix: &str) -> Result<Vec<RemoteObject>> {
        let base = format!(
            "{}/storage/v1/b/{}/o?prefix={}",
            self.endpoint,
            bucket,
            encode_segment(prefix)
        );

        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let url = match &page_token {
                Some(token) => format!("{base}&pageToken={}", encode_segment(token)),
                None => base.clone(),
            };
            let listing: ObjectList = self.net.get_json(&url).await.map_err(|e| {
                Error::from(StorageError::ListFailed {
                    prefix: prefix.to_string(),
                    message: e.to_string(),
                })
            })?;
            objects.extend(listing.items.into_iter().map(|item| RemoteObject {
                name: item.name,
                metadata: item.metadata,
            }));
            match listing.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(objects)
    }
}
