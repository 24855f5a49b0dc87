use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::config::AssetStoreConfig;

/// Metadata returned by the external media store after an upload. The URL is
/// opaque; duration is only reported for media the store can probe.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredAsset {
    pub url: String,
    pub duration: Option<f64>,
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset store rejected the file: {0}")]
    Rejected(String),
    #[error("asset store request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Boundary to the external binary-asset service. Uploads return a reference
/// URL plus metadata; deletes are advisory and may fail independently.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredAsset, AssetError>;

    async fn delete(&self, url: &str) -> Result<(), AssetError>;
}

/// HTTP client for the asset service.
pub struct HttpAssetStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAssetStore {
    pub fn new(config: &AssetStoreConfig) -> Result<Self, AssetError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredAsset, AssetError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .authorize(self.client.post(format!("{}/upload", self.base_url)))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AssetError::Rejected(format!("{status}: {body}")));
        }

        Ok(response.json::<StoredAsset>().await?)
    }

    async fn delete(&self, url: &str) -> Result<(), AssetError> {
        let response = self
            .authorize(self.client.delete(format!("{}/assets", self.base_url)))
            .query(&[("url", url)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AssetError::Rejected(response.status().to_string()));
        }
        Ok(())
    }
}

/// Ask the store to drop an asset that is no longer referenced. Failure is
/// logged and swallowed; the owning record has already moved on.
pub async fn delete_best_effort(store: &dyn AssetStore, url: &str) {
    if let Err(e) = store.delete(url).await {
        warn!(url, error = %e, "failed to delete replaced asset");
    }
}
