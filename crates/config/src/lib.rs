#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for datalift
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/datalift/datalift.toml)
//! - Environment variables (`DATALIFT_*`)
//! - CLI flags

use serde::{Deserialize, Serialize};

use datalift_errors::{ConfigError, Error};
use datalift_types::ColorChoice;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub gcloud: GcloudConfig,

    #[serde(default)]
    pub records: RecordsConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64, // seconds
}

/// Cloud API endpoints and resource selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcloudConfig {
    #[serde(default = "default_storage_endpoint")]
    pub storage_endpoint: String,
    #[serde(default = "default_automl_endpoint")]
    pub automl_endpoint: String,
    #[serde(default = "default_crm_endpoint")]
    pub crm_endpoint: String,
    /// Cloud project id
    #[serde(default)]
    pub project: String,
    /// Target bucket for training uploads
    #[serde(default)]
    pub bucket: String,
    /// Dataset machine name or bare dataset id
    #[serde(default)]
    pub dataset: String,
}

/// Record-store connection and field selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsConfig {
    #[serde(default = "default_records_endpoint")]
    pub endpoint: String,
    /// Base (workspace) identifier
    #[serde(default)]
    pub base: String,
    /// Source table name
    #[serde(default)]
    pub table: String,
    /// Field holding the image attachments
    #[serde(default = "default_image_field")]
    pub image_field: String,
    /// Field holding the label
    #[serde(default = "default_label_field")]
    pub label_field: String,
}

/// Pre-processing pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upload worker count; 1 serializes records in submission order
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,
    /// Seconds between operation polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

/// API credentials
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// OAuth2 access token for the cloud APIs
    #[serde(default)]
    pub access_token: String,
    /// API token for the record store
    #[serde(default)]
    pub records_token: String,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    /// Directory holding the state database (defaults to the user data dir)
    pub state_dir: Option<PathBuf>,
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            color: ColorChoice::Auto,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: 300, // 5 minutes
            retries: 3,
            retry_delay: 1, // 1 second
        }
    }
}

impl Default for GcloudConfig {
    fn default() -> Self {
        Self {
            storage_endpoint: default_storage_endpoint(),
            automl_endpoint: default_automl_endpoint(),
            crm_endpoint: default_crm_endpoint(),
            project: String::new(),
            bucket: String::new(),
            dataset: String::new(),
        }
    }
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_records_endpoint(),
            base: String::new(),
            table: String::new(),
            image_field: default_image_field(),
            label_field: default_label_field(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            upload_concurrency: 1,
            poll_interval: 5,
        }
    }
}

// Default value functions for serde

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_timeout() -> u64 {
    300 // 5 minutes
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1 // 1 second
}

fn default_storage_endpoint() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_automl_endpoint() -> String {
    "https://automl.googleapis.com".to_string()
}

fn default_crm_endpoint() -> String {
    "https://cloudresourcemanager.googleapis.com".to_string()
}

fn default_records_endpoint() -> String {
    "https://api.airtable.com".to_string()
}

fn default_image_field() -> String {
    "Image".to_string()
}

fn default_label_field() -> String {
    "Label".to_string()
}

fn default_upload_concurrency() -> usize {
    1
}

fn default_poll_interval() -> u64 {
    5
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("datalift").join("datalift.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration from an optional path or fall back to the default
    /// path and then to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    pub async fn load_or_default(path: &Option<PathBuf>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => {
                let config_path = Self::default_path()?;
                if config_path.exists() {
                    Self::load_from_file(&config_path).await
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // DATALIFT_COLOR
        if let Ok(color) = std::env::var("DATALIFT_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "DATALIFT_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        // DATALIFT_ACCESS_TOKEN
        if let Ok(token) = std::env::var("DATALIFT_ACCESS_TOKEN") {
            self.auth.access_token = token;
        }

        // DATALIFT_RECORDS_TOKEN
        if let Ok(token) = std::env::var("DATALIFT_RECORDS_TOKEN") {
            self.auth.records_token = token;
        }

        // DATALIFT_PROJECT
        if let Ok(project) = std::env::var("DATALIFT_PROJECT") {
            self.gcloud.project = project;
        }

        // DATALIFT_UPLOAD_CONCURRENCY
        if let Ok(workers) = std::env::var("DATALIFT_UPLOAD_CONCURRENCY") {
            self.pipeline.upload_concurrency =
                workers.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "DATALIFT_UPLOAD_CONCURRENCY".to_string(),
                    value: workers,
                })?;
        }

        // DATALIFT_POLL_INTERVAL
        if let Ok(interval) = std::env::var("DATALIFT_POLL_INTERVAL") {
            self.pipeline.poll_interval =
                interval.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "DATALIFT_POLL_INTERVAL".to_string(),
                    value: interval,
                })?;
        }

        Ok(())
    }

    /// Validate the fields every pipeline run needs.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing or invalid field.
    pub fn validate_for_pipeline(&self) -> Result<(), Error> {
        for (field, value) in [
            ("gcloud.project", &self.gcloud.project),
            ("gcloud.bucket", &self.gcloud.bucket),
            ("gcloud.dataset", &self.gcloud.dataset),
            ("records.base", &self.records.base),
            ("records.table", &self.records.table),
        ] {
            if value.is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                }
                .into());
            }
        }

        if self.pipeline.upload_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.upload_concurrency".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Get the state directory (with default)
    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        self.paths.state_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("datalift")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_from_file_parses_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datalift.toml");
        tokio::fs::write(
            &path,
            r#"
[gcloud]
project = "my-project"
bucket = "training-data"
dataset = "projects/my-project/locations/us-central1/datasets/ICN1"

[records]
base = "appXYZ"
table = "Images"

[pipeline]
upload_concurrency = 2
poll_interval = 1
"#,
        )
        .await
        .unwrap();

        let config = Config::load_from_file(&path).await.unwrap();
        assert_eq!(config.gcloud.project, "my-project");
        assert_eq!(config.pipeline.upload_concurrency, 2);
        assert_eq!(config.network.retries, 3);
        assert!(config.validate_for_pipeline().is_ok());
    }

    #[test]
    fn validation_names_missing_field() {
        let config = Config::default();
        let err = config.validate_for_pipeline().unwrap_err();
        assert!(err.to_string().contains("gcloud.project"));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = Config::default();
        config.gcloud.project = "p".into();
        config.gcloud.bucket = "b".into();
        config.gcloud.dataset = "d".into();
        config.records.base = "a".into();
        config.records.table = "t".into();
        config.pipeline.upload_concurrency = 0;
        assert!(config.validate_for_pipeline().is_err());
    }
}
