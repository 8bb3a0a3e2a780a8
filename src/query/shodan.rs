//! Shodan REST API client.
//!
//! Only two endpoints are used: `/shodan/host/{ip}` for enrichment data and
//! `/api-info` for credential checks and the remaining credit balance.

use super::HostLookup;
use crate::error::{CredentialError, QueryError, QueryResult};
use crate::types::{normalize_field, HostRecord, PortBanner};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, trace};

/// Public API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.shodan.io";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest raw error body echoed back in an error message.
const MAX_ERROR_BODY: usize = 200;

/// Account information returned by `/api-info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub scan_credits: i64,
    #[serde(default)]
    pub query_credits: i64,
    #[serde(default)]
    pub plan: Option<String>,
}

/// Raw `/shodan/host/{ip}` response. Scalar fields are kept as JSON values
/// because the API sometimes returns them as lists.
#[derive(Debug, Deserialize)]
pub(crate) struct HostResponse {
    ip_str: Option<String>,
    hostnames: Option<Value>,
    country_name: Option<Value>,
    org: Option<Value>,
    os: Option<Value>,
    #[serde(default)]
    data: Vec<BannerResponse>,
}

#[derive(Debug, Deserialize)]
struct BannerResponse {
    port: Option<u16>,
    transport: Option<Value>,
    data: Option<Value>,
}

impl HostResponse {
    /// Normalize into a [`HostRecord`], falling back to the queried address
    /// when `ip_str` is missing or unparsable.
    pub(crate) fn into_record(self, queried: IpAddr) -> HostRecord {
        let ip = self
            .ip_str
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(queried);

        let ports = self
            .data
            .iter()
            .filter_map(|entry| {
                let port = entry.port?;
                Some(PortBanner::new(
                    port,
                    normalize_field(entry.transport.as_ref()),
                    normalize_field(entry.data.as_ref()),
                ))
            })
            .collect();

        HostRecord {
            ip,
            hostname: normalize_field(self.hostnames.as_ref()),
            country: normalize_field(self.country_name.as_ref()),
            organisation: normalize_field(self.org.as_ref()),
            os: normalize_field(self.os.as_ref()),
            ports,
        }
    }
}

/// Map a non-success HTTP status to a [`QueryError`].
pub(crate) fn classify_status(status: StatusCode, body: &str) -> QueryError {
    let message = error_message(status, body);
    match status {
        StatusCode::NOT_FOUND => QueryError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => QueryError::RateLimited(message),
        _ => QueryError::Fault(format!("HTTP {}: {}", status.as_u16(), message)),
    }
}

/// Extract the API's `{"error": "..."}` message, or fall back to the body.
fn error_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error;
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_string()
    } else {
        body.chars().take(MAX_ERROR_BODY).collect()
    }
}

/// Interpret an `/api-info` response. A rejected key is fatal, anything else
/// that is not account information means the key could not be verified.
pub(crate) fn classify_api_info(
    status: StatusCode,
    body: &str,
) -> Result<ApiInfo, CredentialError> {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(CredentialError::Rejected(error_message(status, body)))
        }
        s if s.is_success() => serde_json::from_str(body).map_err(|e| {
            CredentialError::Unverified(QueryError::Fault(format!(
                "malformed api-info response: {}",
                e
            )))
        }),
        s => Err(CredentialError::Unverified(classify_status(s, body))),
    }
}

fn transport_error(e: reqwest::Error) -> QueryError {
    // the URL carries the API key
    QueryError::Fault(e.without_url().to_string())
}

/// Client for the Shodan REST API.
pub struct ShodanClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ShodanClient {
    /// Create a client against the public API with default timeouts.
    pub fn new(api_key: impl Into<String>) -> QueryResult<Self> {
        Self::with_options(api_key, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom base URL and request timeout.
    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> QueryResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pythodan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| QueryError::Fault(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Issue an authenticated GET and return the status and body.
    async fn fetch(&self, path: &str) -> QueryResult<(StatusCode, String)> {
        debug!(path, "GET");
        let response = self
            .client
            .get(self.url(path))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        trace!(path, status = status.as_u16(), bytes = body.len(), "response");
        Ok((status, body))
    }

    /// Fetch account information, verifying the API key on the way.
    pub async fn api_info(&self) -> Result<ApiInfo, CredentialError> {
        let (status, body) = self.fetch("api-info").await?;
        classify_api_info(status, &body)
    }
}

#[async_trait]
impl HostLookup for ShodanClient {
    async fn lookup(&self, ip: IpAddr) -> QueryResult<HostRecord> {
        let (status, body) = self.fetch(&format!("shodan/host/{}", ip)).await?;

        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        let response: HostResponse = serde_json::from_str(&body)
            .map_err(|e| QueryError::Fault(format!("malformed host response: {}", e)))?;

        Ok(response.into_record(ip))
    }
}
