//! Anime API client.
//!
//! Thin adapter that turns a resource request into exactly one outbound GET.
//!
//! ### Endpoints
//!
//! - `GET {base}/anime?q=<query>&page=<page>&limit=<limit>` → list page
//! - `GET {base}/anime/{id}` → single record
//!
//! ### Failures
//!
//! - Transport failures surface as `ApiError::Network` / `ApiError::Timeout`.
//! - Any non-2xx status surfaces as `ApiError::HttpError`. A `429` is logged
//!   as a warning so throttling can be told apart from hard failures.
//! - Nothing is retried here; retries are a user action.

pub mod base_url;
pub mod error;
pub mod response;

pub use base_url::{UrlError, canonicalize_base};
pub use error::ApiError;

use std::time::{Duration, Instant};

use animedex_core::{AnimeDetail, AppConfig, ListPayload, types::DEFAULT_PAGE_SIZE};
use async_trait::async_trait;
use reqwest::{StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;

use response::{DetailEnvelope, ListEnvelope};

/// Default base URL of the upstream API.
const DEFAULT_BASE_URL: &str = "https://api.jikan.moe/v4";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "animedex/0.1";

/// Source of anime data, keyed the way the query cache asks for it.
///
/// Implemented by `ApiClient`; tests substitute in-memory sources.
#[async_trait]
pub trait AnimeSource: Send + Sync {
    /// Fetch one page of the list, optionally filtered by `query`.
    async fn fetch_list(&self, page: u32, query: &str) -> Result<ListPayload, ApiError>;

    /// Fetch a single record.
    async fn fetch_detail(&self, id: u64) -> Result<AnimeDetail, ApiError>;
}

/// Anime API client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL (default: https://api.jikan.moe/v4).
    pub base_url: String,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
    /// User-agent string (default: animedex/0.x).
    pub user_agent: String,
    /// Items per list page (default: 24).
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl From<&AppConfig> for ApiConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
            page_size: config.page_size,
        }
    }
}

/// Query string of the list endpoint.
#[derive(Debug, Serialize)]
struct ListQuery<'a> {
    q: &'a str,
    page: u32,
    limit: u32,
}

/// HTTP client for the anime API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: url::Url,
    page_size: u32,
}

impl ApiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let base = canonicalize_base(&config.base_url).map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;

        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        Ok(Self { http, base, page_size: config.page_size })
    }

    /// Create a new client from the loaded application configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ApiError> {
        Self::new(ApiConfig::from(config))
    }

    pub fn base_url(&self) -> &url::Url {
        &self.base
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// `GET /anime?q=<query>&page=<page>&limit=<limit>`.
    pub async fn list_anime(&self, page: u32, query: &str, limit: u32) -> Result<ListPayload, ApiError> {
        let url = self.endpoint("anime")?;
        let params = ListQuery { q: query, page, limit };

        tracing::debug!("listing anime: page={} query={:?} limit={}", page, query, limit);

        let envelope: ListEnvelope = self.get_json(self.http.get(url).query(&params)).await?;
        Ok(envelope.into())
    }

    /// `GET /anime/{id}`.
    pub async fn anime_detail(&self, id: u64) -> Result<AnimeDetail, ApiError> {
        let url = self.endpoint(&format!("anime/{id}"))?;

        tracing::debug!("fetching anime detail: id={}", id);

        let envelope: DetailEnvelope = self.get_json(self.http.get(url)).await?;
        Ok(envelope.into())
    }

    fn endpoint(&self, path: &str) -> Result<url::Url, ApiError> {
        self.base.join(path).map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let start = Instant::now();

        let response = request.header(header::ACCEPT, "application/json").send().await?;

        let status = response.status();
        let url = response.url().clone();
        tracing::debug!("{} -> {} in {:?}", url, status, start.elapsed());

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(url = %url, "rate limit exceeded, try again later");
        }

        if !status.is_success() {
            return Err(ApiError::HttpError { status: status.as_u16() });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[async_trait]
impl AnimeSource for ApiClient {
    async fn fetch_list(&self, page: u32, query: &str) -> Result<ListPayload, ApiError> {
        self.list_anime(page, query, self.page_size).await
    }

    async fn fetch_detail(&self, id: u64) -> Result<AnimeDetail, ApiError> {
        self.anime_detail(id).await
    }
}
