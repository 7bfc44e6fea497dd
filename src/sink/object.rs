//! Object-storage sink
//!
//! Writes the content map into a container named after the site, against an
//! Azure-blob-style REST surface authenticated with a SAS token. Container
//! creation is attempted first; a 409 Conflict means the container already
//! exists and triggers full-replace semantics: every existing blob is listed
//! and deleted before the new entries are uploaded. The conflict is recovered
//! here and never surfaces to the caller.

use crate::config::SinkConfig;
use crate::sink::{Sink, SinkError, SinkResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EnumerationResults {
    #[serde(default)]
    blobs: Blobs,

    /// Continuation marker; empty or absent on the last page
    #[serde(default)]
    next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Blobs {
    #[serde(default)]
    blob: Vec<BlobEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BlobEntry {
    name: String,
}

pub struct ObjectStoreSink {
    client: Client,
    account_url: String,
    sas_token: String,
}

impl ObjectStoreSink {
    /// Builds a sink from configuration, reading the SAS token from the
    /// environment variable the config names
    pub fn from_config(config: &SinkConfig) -> SinkResult<Self> {
        let account_url = config.account_url.clone().unwrap_or_default();
        let sas_token = std::env::var(&config.sas_token_env)
            .map_err(|_| SinkError::MissingCredential(config.sas_token_env.clone()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            account_url: account_url.trim_end_matches('/').to_string(),
            sas_token: sas_token.trim_start_matches('?').to_string(),
        })
    }

    fn container_url(&self, container: &str) -> String {
        format!(
            "{}/{}?restype=container&{}",
            self.account_url, container, self.sas_token
        )
    }

    fn list_url(&self, container: &str, marker: Option<&str>) -> String {
        match marker {
            Some(m) => format!(
                "{}/{}?restype=container&comp=list&marker={}&{}",
                self.account_url, container, m, self.sas_token
            ),
            None => format!(
                "{}/{}?restype=container&comp=list&{}",
                self.account_url, container, self.sas_token
            ),
        }
    }

    fn blob_url(&self, container: &str, name: &str) -> String {
        format!("{}/{}/{}?{}", self.account_url, container, name, self.sas_token)
    }

    /// Deletes every blob currently in the container
    ///
    /// Listings are paginated; each page carries a continuation marker that
    /// is followed until the service returns an empty one.
    async fn clear_container(&self, container: &str) -> SinkResult<()> {
        let mut marker: Option<String> = None;
        let mut deleted = 0usize;

        loop {
            let response = self
                .client
                .get(self.list_url(container, marker.as_deref()))
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(SinkError::Api {
                    operation: "list blobs".to_string(),
                    status: status.as_u16(),
                });
            }

            let xml = response.text().await?;
            let listing: EnumerationResults =
                quick_xml::de::from_str(&xml).map_err(|e| SinkError::Listing(e.to_string()))?;

            for blob in &listing.blobs.blob {
                let response = self
                    .client
                    .delete(self.blob_url(container, &blob.name))
                    .send()
                    .await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(SinkError::Api {
                        operation: format!("delete blob {}", blob.name),
                        status: status.as_u16(),
                    });
                }
                deleted += 1;
                tracing::debug!(blob = %blob.name, "deleted existing blob");
            }

            match listing.next_marker.filter(|m| !m.is_empty()) {
                Some(m) => marker = Some(m),
                None => break,
            }
        }

        tracing::info!(container, deleted, "cleared existing container");
        Ok(())
    }
}

#[async_trait]
impl Sink for ObjectStoreSink {
    async fn write(&self, site: &str, files: &BTreeMap<String, String>) -> SinkResult<()> {
        let response = self.client.put(self.container_url(site)).send().await?;
        match response.status().as_u16() {
            201 => {
                tracing::info!(container = site, "container created");
            }
            409 => {
                // Expected: the container exists, replace its contents
                tracing::info!(container = site, "container exists, replacing contents");
                self.clear_container(site).await?;
            }
            status => {
                return Err(SinkError::Api {
                    operation: "create container".to_string(),
                    status,
                });
            }
        }

        for (key, body) in files {
            let name = format!("{}.txt", key);
            let response = self
                .client
                .put(self.blob_url(site, &name))
                .header("x-ms-blob-type", "BlockBlob")
                .header("content-type", "text/plain; charset=utf-8")
                .body(body.clone())
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(SinkError::Api {
                    operation: format!("upload blob {}", name),
                    status: status.as_u16(),
                });
            }
            tracing::debug!(blob = %name, "uploaded blob");
        }

        tracing::info!(container = site, count = files.len(), "upload complete");
        Ok(())
    }
}
