use async_trait::async_trait;
use serde_json::json;

use crate::account::errors::NotifierError;
use crate::account::ports::CompanionNotifier;
use crate::config::CompanionConfig;

/// Pushes freshly issued tokens to the companion service's sync endpoint.
#[derive(Debug, Clone)]
pub struct HttpCompanionNotifier {
    client: reqwest::Client,
    sync_url: String,
}

impl HttpCompanionNotifier {
    pub fn new(sync_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            sync_url: sync_url.into(),
        }
    }

    pub fn from_config(config: &CompanionConfig) -> Self {
        Self::new(config.sync_url.clone())
    }
}

#[async_trait]
impl CompanionNotifier for HttpCompanionNotifier {
    async fn notify_account_created(&self, token: &str) -> Result<(), NotifierError> {
        let response = self
            .client
            .post(&self.sync_url)
            .json(&json!({ "token": token }))
            .send()
            .await
            .map_err(|e| NotifierError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::Rejected(status.as_u16()));
        }

        tracing::debug!(url = %self.sync_url, "Companion acknowledged new account");
        Ok(())
    }
}
