//! Nightscout API v3 sink
//!
//! Each operation first exchanges the configured access token for a
//! short-lived JWT via `GET /api/v2/authorization/request/{token}`. Reads
//! use `GET /api/v3/entries?limit=1&sort$desc=date` and treat an empty
//! result as an error. The API rejects batch bodies, so uploads send one
//! request per entry, concurrently, and require `201 Created` from each.

use anyhow::{Context, Result};
use futures_util::future::join_all;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use tracing::{debug, warn};

use glucolink_core::config::NightscoutConfig;
use glucolink_core::domain::{StoredEntry, SyncEntry};
use glucolink_core::ports::IEntrySink;

use crate::models::{AuthorizationResponse, EntryV3, StoredEntryDto, V3Envelope};
use crate::{http_client, NightscoutError};

const ENTRIES_PATH: &str = "/api/v3/entries";

/// API v3 client
pub struct NightscoutV3Client {
    client: Client,
    base_url: String,
    access_token: String,
    device: String,
    app: String,
}

impl NightscoutV3Client {
    /// Creates a client
    ///
    /// # Arguments
    /// * `base_url` - Scheme and host of the site
    /// * `access_token` - Nightscout access token exchanged for JWTs
    /// * `device` - Device name stamped on uploaded entries
    /// * `app` - Application name stamped on uploaded entries
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        device: impl Into<String>,
        app: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            device: device.into(),
            app: app.into(),
        })
    }

    /// Creates a client from the `nightscout` configuration section
    pub fn from_config(config: &NightscoutConfig) -> Result<Self> {
        Self::new(
            config.base_url(),
            &config.api_token,
            &config.device,
            &config.app,
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
    }

    /// Exchanges the access token for a JWT
    pub async fn jwt_token(&self) -> Result<String> {
        let path = format!("/api/v2/authorization/request/{}", self.access_token);

        let response = self
            .request(Method::GET, &path)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to request Nightscout JWT")?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(NightscoutError::Http {
                endpoint: "/api/v2/authorization/request".to_string(),
                status: status.as_u16(),
                expected: StatusCode::OK.as_u16(),
            }
            .into());
        }

        let body: AuthorizationResponse = response
            .json()
            .await
            .map_err(|e| NightscoutError::InvalidResponse(format!("authorization: {e}")))?;

        match body.token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(NightscoutError::MissingToken.into()),
        }
    }

    /// Fetches the most recent stored entry; an empty store is an error
    pub async fn fetch_last_entry(&self) -> Result<StoredEntry> {
        let jwt = self.jwt_token().await?;

        let response = self
            .request(Method::GET, ENTRIES_PATH)
            .query(&[("limit", "1"), ("sort$desc", "date")])
            .bearer_auth(&jwt)
            .send()
            .await
            .context("Failed to query Nightscout v3 entries")?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(NightscoutError::Http {
                endpoint: ENTRIES_PATH.to_string(),
                status: status.as_u16(),
                expected: StatusCode::OK.as_u16(),
            }
            .into());
        }

        let envelope: V3Envelope<StoredEntryDto> = response
            .json()
            .await
            .map_err(|e| NightscoutError::InvalidResponse(format!("{ENTRIES_PATH}: {e}")))?;

        let dto = envelope
            .result
            .into_iter()
            .next()
            .ok_or(NightscoutError::EmptyStore)?;
        let entry = StoredEntry::try_from(dto)?;
        debug!(date = %entry.date, "Last Nightscout v3 entry");
        Ok(entry)
    }

    /// Posts every entry in its own request; all must return 201
    pub async fn post_entries(&self, entries: &[SyncEntry]) -> Result<()> {
        if entries.is_empty() {
            return Err(NightscoutError::EmptyBatch.into());
        }

        let jwt = self.jwt_token().await?;

        let requests = entries.iter().map(|entry| {
            self.request(Method::POST, ENTRIES_PATH)
                .bearer_auth(&jwt)
                .json(&EntryV3::new(entry, &self.device, &self.app))
                .send()
        });
        let responses = join_all(requests).await;

        let mut failures = 0usize;
        let mut first_error: Option<anyhow::Error> = None;
        for response in responses {
            let outcome: Result<()> = match response {
                Ok(resp) if resp.status() == StatusCode::CREATED => Ok(()),
                Ok(resp) => Err(NightscoutError::Http {
                    endpoint: ENTRIES_PATH.to_string(),
                    status: resp.status().as_u16(),
                    expected: StatusCode::CREATED.as_u16(),
                }
                .into()),
                Err(e) => Err(anyhow::Error::new(e).context("Failed to post entry to Nightscout v3")),
            };
            if let Err(e) = outcome {
                failures += 1;
                first_error.get_or_insert(e);
            }
        }

        if let Some(err) = first_error {
            warn!(failures, total = entries.len(), "Nightscout v3 upload failed");
            return Err(err);
        }

        debug!(count = entries.len(), "Posted entries to Nightscout v3");
        Ok(())
    }
}

#[async_trait::async_trait]
impl IEntrySink for NightscoutV3Client {
    async fn last_entry(&self) -> Result<Option<StoredEntry>> {
        self.fetch_last_entry().await.map(Some)
    }

    async fn upload_entries(&self, entries: &[SyncEntry]) -> Result<()> {
        self.post_entries(entries).await
    }

    fn name(&self) -> &'static str {
        "v3"
    }
}
