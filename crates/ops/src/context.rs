//! Operations context for dependency injection

use std::sync::Arc;
use std::time::Duration;

use datalift_config::Config;
use datalift_errors::{Error, OpsError, Result};
use datalift_events::EventSender;
use datalift_gcloud::{AutomlClient, CrmClient, StorageClient};
use datalift_net::{NetClient, NetConfig};
use datalift_records::{FieldSelection, HttpRecordSource};
use datalift_state::StateManager;

/// Operations context providing access to all system components
pub struct OpsCtx {
    /// Record-store client
    pub records: Arc<HttpRecordSource>,
    /// Object storage client
    pub storage: Arc<StorageClient>,
    /// Managed-ML client
    pub automl: Arc<AutomlClient>,
    /// Resource-manager client
    pub crm: CrmClient,
    /// Persisted wizard state
    pub state: Arc<StateManager>,
    /// Event sender for progress reporting
    pub tx: EventSender,
    /// System configuration
    pub config: Config,
}

/// Builder for [`OpsCtx`]
pub struct OpsContextBuilder {
    config: Option<Config>,
    tx: Option<EventSender>,
}

impl Default for OpsContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OpsContextBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: None,
            tx: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Construct the context: HTTP clients from the config's endpoints and
    /// tokens, plus the state database under the configured state dir.
    ///
    /// # Errors
    ///
    /// Returns an error if a required builder field is missing or a
    /// component fails to initialize.
    pub async fn build(self) -> Result<OpsCtx> {
        let config = self.config.ok_or_else(|| missing("config"))?;
        let tx = self.tx.ok_or_else(|| missing("event sender"))?;

        let net_config = NetConfig {
            timeout: Duration::from_secs(config.network.timeout),
            retry_count: config.network.retries,
            retry_delay: Duration::from_secs(config.network.retry_delay),
            ..NetConfig::default()
        };

        let cloud_net =
            NetClient::new(net_config.clone())?.with_bearer_token(&config.auth.access_token);
        let records_net =
            NetClient::new(net_config)?.with_bearer_token(&config.auth.records_token);

        let records = Arc::new(HttpRecordSource::new(
            records_net,
            &config.records.endpoint,
            &config.records.base,
            FieldSelection {
                image_field: config.records.image_field.clone(),
                label_field: config.records.label_field.clone(),
            },
        ));
        let storage = Arc::new(StorageClient::new(
            cloud_net.clone(),
            &config.gcloud.storage_endpoint,
        ));
        let automl = Arc::new(AutomlClient::new(
            cloud_net.clone(),
            &config.gcloud.automl_endpoint,
        ));
        let crm = CrmClient::new(cloud_net, &config.gcloud.crm_endpoint);

        let state = Arc::new(StateManager::new(&config.state_dir()).await?);

        Ok(OpsCtx {
            records,
            storage,
            automl,
            crm,
            state,
            tx,
            config,
        })
    }
}

fn missing(component: &str) -> Error {
    OpsError::ContextCreationFailed {
        message: format!("missing {component}"),
    }
    .into()
}
