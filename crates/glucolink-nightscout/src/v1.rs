//! Nightscout API v1 sink
//!
//! Every request carries the `api-secret` header. The last entry is read
//! with `GET /api/v1/entries?count=1`; an empty array means the site holds
//! no data yet. Uploads post the whole batch as one JSON array.

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use tracing::debug;

use glucolink_core::config::NightscoutConfig;
use glucolink_core::domain::{StoredEntry, SyncEntry};
use glucolink_core::ports::IEntrySink;

use crate::models::{EntryV1, StoredEntryDto};
use crate::{http_client, NightscoutError};

const ENTRIES_PATH: &str = "/api/v1/entries";

/// API v1 client
pub struct NightscoutV1Client {
    client: Client,
    base_url: String,
    api_secret: String,
    device: String,
}

impl NightscoutV1Client {
    /// Creates a client
    ///
    /// # Arguments
    /// * `base_url` - Scheme and host of the site, e.g. `https://ns.example.com`
    /// * `api_secret` - Value of the `api-secret` header
    /// * `device` - Device name stamped on uploaded entries
    pub fn new(
        base_url: impl Into<String>,
        api_secret: impl Into<String>,
        device: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_secret: api_secret.into(),
            device: device.into(),
        })
    }

    /// Creates a client from the `nightscout` configuration section
    pub fn from_config(config: &NightscoutConfig) -> Result<Self> {
        Self::new(config.base_url(), &config.api_token, &config.device)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("api-secret", &self.api_secret)
    }

    /// Fetches the most recent stored entry, `None` when the site is empty
    pub async fn fetch_last_entry(&self) -> Result<Option<StoredEntry>> {
        let response = self
            .request(Method::GET, ENTRIES_PATH)
            .query(&[("count", "1")])
            .send()
            .await
            .context("Failed to query Nightscout v1 entries")?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(NightscoutError::Http {
                endpoint: ENTRIES_PATH.to_string(),
                status: status.as_u16(),
                expected: StatusCode::OK.as_u16(),
            }
            .into());
        }

        let mut entries: Vec<StoredEntryDto> = response
            .json()
            .await
            .map_err(|e| NightscoutError::InvalidResponse(format!("{ENTRIES_PATH}: {e}")))?;

        match entries.pop() {
            Some(dto) => {
                let entry = StoredEntry::try_from(dto)?;
                debug!(date = %entry.date, "Last Nightscout v1 entry");
                Ok(Some(entry))
            }
            None => {
                debug!("Nightscout v1 holds no entries");
                Ok(None)
            }
        }
    }

    /// Posts the entries as a single array
    pub async fn post_entries(&self, entries: &[SyncEntry]) -> Result<()> {
        let body: Vec<EntryV1<'_>> = entries
            .iter()
            .map(|e| EntryV1::new(e, &self.device))
            .collect();

        let response = self
            .request(Method::POST, ENTRIES_PATH)
            .json(&body)
            .send()
            .await
            .context("Failed to upload entries to Nightscout v1")?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(NightscoutError::Http {
                endpoint: ENTRIES_PATH.to_string(),
                status: status.as_u16(),
                expected: StatusCode::OK.as_u16(),
            }
            .into());
        }

        debug!(count = entries.len(), "Posted entries to Nightscout v1");
        Ok(())
    }
}

#[async_trait::async_trait]
impl IEntrySink for NightscoutV1Client {
    async fn last_entry(&self) -> Result<Option<StoredEntry>> {
        self.fetch_last_entry().await
    }

    async fn upload_entries(&self, entries: &[SyncEntry]) -> Result<()> {
        self.post_entries(entries).await
    }

    fn name(&self) -> &'static str {
        "v1"
    }
}
