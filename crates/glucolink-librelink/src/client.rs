//! LibreLink Up API client
//!
//! Provides a typed HTTP client for the LibreLink Up follower API.
//! Handles the fixed client headers, the session cookie jar, authenticated
//! headers, JSON deserialization, and endpoint construction.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use glucolink_core::domain::Region;
//! use glucolink_core::ports::Credentials;
//! use glucolink_librelink::client::LibreLinkClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = LibreLinkClient::new(Region::Eu)?;
//! let outcome = client
//!     .post_login(&Credentials::new("me@example.com", "secret"))
//!     .await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT},
    Client, Method, RequestBuilder, Response,
};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use glucolink_core::domain::{
    AuthHeaders, Connection, GlucoseReading, MeasurementPayload, PatientId, Region,
};
use glucolink_core::ports::{Credentials, LoginOutcome};

use crate::models::{ConnectionsResponse, GraphResponse, LoginRequest, LoginResponse};
use crate::LibreLinkError;

/// Browser identity the API expects
pub const LLU_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU OS 17_4.1 like Mac OS X) \
AppleWebKit/536.26 (KHTML, like Gecko) Version/17.4.1 Mobile/10A5355d Safari/8536.25";

/// Client version announced in the `version` header
pub const LLU_VERSION: &str = "4.12.0";

/// Client product announced in the `product` header
pub const LLU_PRODUCT: &str = "llu.ios";

/// Content type sent on every request
pub const LLU_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

const ACCOUNT_ID_HEADER: &str = "account-id";

// ============================================================================
// LibreLinkClient
// ============================================================================

/// HTTP client for LibreLink Up API calls
///
/// Wraps a `reqwest::Client` that carries the fixed client headers and a
/// cookie store shared by every call made through this instance.
#[derive(Debug, Clone)]
pub struct LibreLinkClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests, without trailing slash
    base_url: String,
}

impl LibreLinkClient {
    /// Creates a client for the given regional endpoint
    ///
    /// # Arguments
    /// * `region` - Regional endpoint the account is homed in
    pub fn new(region: Region) -> Result<Self> {
        Self::with_base_url(format!("https://{}", region.host()))
    }

    /// Creates a client with a custom base URL (useful for testing)
    ///
    /// # Arguments
    /// * `base_url` - Scheme and host, e.g. `http://127.0.0.1:8080`
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .default_headers(default_headers())
            .cookie_store(true)
            .build()
            .context("Failed to build LibreLink Up HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates a request builder for the given method and path
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - API path relative to base URL (e.g. "/llu/connections")
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// Creates a request builder carrying the session's credentials
    pub fn authed_request(&self, method: Method, path: &str, auth: &AuthHeaders) -> RequestBuilder {
        let builder = self.request(method, path).bearer_auth(&auth.bearer_token);
        match &auth.account_id_hash {
            Some(hash) => builder.header(ACCOUNT_ID_HEADER, hash),
            None => builder,
        }
    }

    /// Performs the login handshake
    ///
    /// Returns `Err` only for transport and decoding failures; a completed
    /// handshake is always classified into a [`LoginOutcome`].
    pub async fn post_login(&self, credentials: &Credentials) -> Result<LoginOutcome> {
        debug!("Logging in to {}", self.base_url);

        let body = serde_json::to_vec(&LoginRequest {
            email: &credentials.email,
            password: &credentials.password,
        })
        .context("Failed to encode login request")?;

        let response = self
            .request(Method::POST, "/llu/auth/login")
            .body(body)
            .send()
            .await
            .context("Failed to send login request")?;

        let login: LoginResponse = decode(response, "/llu/auth/login").await?;
        Ok(classify_login(login))
    }

    /// Lists the patient connections of the logged-in follower account
    pub async fn get_connections(&self, auth: &AuthHeaders) -> Result<Vec<Connection>> {
        let response = self
            .authed_request(Method::GET, "/llu/connections", auth)
            .send()
            .await
            .context("Failed to fetch /llu/connections")?;

        let body: ConnectionsResponse = decode(response, "/llu/connections").await?;
        if body.status != 0 {
            return Err(LibreLinkError::Status {
                endpoint: "/llu/connections".to_string(),
                status: body.status,
            }
            .into());
        }

        let connections = body
            .data
            .into_iter()
            .map(Connection::try_from)
            .collect::<Result<Vec<_>, _>>()
            .context("Invalid connection in /llu/connections response")?;

        debug!(count = connections.len(), "Fetched LibreLink Up connections");
        Ok(connections)
    }

    /// Fetches the current reading and the recent history of one patient
    pub async fn get_graph(
        &self,
        auth: &AuthHeaders,
        patient_id: &PatientId,
    ) -> Result<MeasurementPayload> {
        let path = format!("/llu/connections/{}/graph", patient_id.as_str());

        let response = self
            .authed_request(Method::GET, &path, auth)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {path}"))?;

        let body: GraphResponse = decode(response, &path).await?;
        if body.status != 0 {
            return Err(LibreLinkError::Status {
                endpoint: path,
                status: body.status,
            }
            .into());
        }

        if body.data.connection.patient_id != patient_id.as_str() {
            debug!(
                requested = %patient_id,
                returned = %body.data.connection.patient_id,
                "Graph response names a different patient"
            );
        }

        let payload = MeasurementPayload {
            patient_id: patient_id.clone(),
            current: GlucoseReading::from(body.data.connection.glucose_measurement),
            history: body
                .data
                .graph_data
                .into_iter()
                .map(GlucoseReading::from)
                .collect(),
        };

        debug!(
            history = payload.history.len(),
            "Fetched glucose measurements for {}", patient_id
        );
        Ok(payload)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(LLU_USER_AGENT));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(LLU_CONTENT_TYPE));
    headers.insert(
        HeaderName::from_static("version"),
        HeaderValue::from_static(LLU_VERSION),
    );
    headers.insert(
        HeaderName::from_static("product"),
        HeaderValue::from_static(LLU_PRODUCT),
    );
    headers
}

/// Checks the HTTP status and decodes the JSON body
async fn decode<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!(endpoint, status = status.as_u16(), "{}", body);
        return Err(LibreLinkError::Http {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        }
        .into());
    }

    response
        .json()
        .await
        .map_err(|e| LibreLinkError::InvalidResponse(format!("{endpoint}: {e}")).into())
}

fn classify_login(login: LoginResponse) -> LoginOutcome {
    if login.status != 0 {
        let message = login.error.and_then(|e| e.message);
        error!(
            status = login.status,
            message = message.as_deref().unwrap_or(""),
            "LibreLink Up - Non-zero status code"
        );
        return LoginOutcome::Rejected {
            status: login.status,
            message,
        };
    }

    let data = login.data.unwrap_or_default();

    if data.redirect == Some(true) {
        if let Some(region) = data.region {
            let region = region.to_uppercase();
            error!("LibreLink Up - Logged in to the wrong region. Switch to '{region}' region.");
            return LoginOutcome::WrongRegion { region };
        }
    }

    match (data.auth_ticket, data.user) {
        (Some(ticket), Some(user)) if !ticket.token.is_empty() => {
            info!("Logged in to LibreLink Up");
            LoginOutcome::Authenticated {
                ticket: ticket.into(),
                user_id: user.id,
            }
        }
        (Some(ticket), None) if !ticket.token.is_empty() => {
            info!("Logged in to LibreLink Up");
            LoginOutcome::Authenticated {
                ticket: ticket.into(),
                user_id: String::new(),
            }
        }
        _ => {
            error!("LibreLink Up - No AuthTicket received. Please check your credentials.");
            LoginOutcome::MissingTicket
        }
    }
}
