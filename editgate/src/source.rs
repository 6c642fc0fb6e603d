//! Credential manifest retrieval.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::errors::{Error, Result};
use crate::manifest::Manifest;

/// A trait for retrieving the current credential manifest.
///
/// In practice this fetches the manifest document over http from the
/// configured authority, using the `reqwest` library; see
/// [`HttpManifestSource`]. Loading never fails: implementations resolve every
/// retrieval problem to their fallback manifest, so the component stays
/// operable with no network access.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn load_manifest(&self) -> Manifest;
}

/// The concrete remote implementation of [`CredentialSource`].
pub struct HttpManifestSource {
    client: Client,
    manifest_url: Url,
    request_timeout: Duration,
    fallback: Manifest,
}

impl HttpManifestSource {
    pub fn new(manifest_url: Url, request_timeout: Duration, fallback: Manifest) -> Self {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            manifest_url,
            request_timeout,
            fallback,
        }
    }

    /// Fetch and parse the remote manifest document.
    ///
    /// A unique `_` query parameter is appended per request so intermediate
    /// caches cannot serve a stale document to a repeated login attempt.
    async fn try_fetch(&self) -> Result<Manifest> {
        let mut url = self.manifest_url.clone();
        url.query_pairs_mut()
            .append_pair("_", &Utc::now().timestamp_millis().to_string());

        debug!("Fetching credential manifest from URL: {}", url);

        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| Error::Retrieval { reason: e.to_string() })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Retrieval {
                reason: format!("manifest endpoint returned {status}: {body}"),
            });
        }

        // Get the response body as text first for logging
        let body_text = response
            .text()
            .await
            .map_err(|e| Error::Retrieval { reason: e.to_string() })?;
        debug!("Manifest response body: {}", body_text);

        serde_json::from_str::<Manifest>(&body_text).map_err(|e| Error::Retrieval {
            reason: format!("error decoding manifest document: {e}"),
        })
    }
}

#[async_trait]
impl CredentialSource for HttpManifestSource {
    #[tracing::instrument(skip_all)]
    async fn load_manifest(&self) -> Manifest {
        match self.try_fetch().await {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("Using fallback credentials: {e}");
                self.fallback.clone()
            }
        }
    }
}

/// A static implementation of [`CredentialSource`] that always returns a
/// predefined manifest. Used for deployments with no remote authority
/// configured, and in tests.
pub struct StaticManifestSource {
    manifest: Manifest,
}

impl StaticManifestSource {
    pub fn new(manifest: Manifest) -> Self {
        Self { manifest }
    }
}

#[async_trait]
impl CredentialSource for StaticManifestSource {
    async fn load_manifest(&self) -> Manifest {
        self.manifest.clone()
    }
}
