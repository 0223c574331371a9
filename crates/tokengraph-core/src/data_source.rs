//! Data source contract and the authenticated HTTP implementation.
//!
//! The pipeline only ever talks to a [`DataSourceClient`]: one GET against a
//! named endpoint with a JSON-valued query map, answered with parsed JSON.
//!
//! | Endpoint | Path | Parameters |
//! |----------|------|------------|
//! | [`ApiEndpoint::TopLiquidity`] | `token/top/liquidity` | `page`, `perPage` |
//! | [`ApiEndpoint::Ohlcv`] | `token/ohlcv` | `unit`, `interval`, `numIntervals` |
//!
//! # Example
//!
//! ```rust,ignore
//! use tokengraph_core::{ApiEndpoint, DataSourceClient, HttpDataSource, QueryParams};
//!
//! async fn top(source: &HttpDataSource) -> Result<(), tokengraph_core::SourceError> {
//!     let params = QueryParams::new().with("page", 1).with("perPage", 10);
//!     let body = source.get(ApiEndpoint::TopLiquidity, params).await?;
//!     println!("{body}");
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::throttling::RequestPacer;
use crate::ValidationError;

/// Upstream endpoints used by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiEndpoint {
    TopLiquidity,
    Ohlcv,
}

impl ApiEndpoint {
    pub const fn path(self) -> &'static str {
        match self {
            Self::TopLiquidity => "token/top/liquidity",
            Self::Ohlcv => "token/ohlcv",
        }
    }
}

impl Display for ApiEndpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// JSON-valued query map. Keys are kept sorted so URLs are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams(BTreeMap<String, Value>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders `?k=v&...`; strings are emitted without JSON quotes.
    pub fn to_query_string(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }

        let pairs: Vec<String> = self
            .0
            .iter()
            .map(|(key, value)| {
                let rendered = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(&rendered)
                )
            })
            .collect();

        format!("?{}", pairs.join("&"))
    }
}

/// Data source error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    MalformedResponse,
    Internal,
}

/// Structured data source error; the `DataSourceError` of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::MalformedResponse,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::MalformedResponse => "source.malformed_response",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Capability consumed by the universe and history fetchers.
///
/// Implementations must be `Send + Sync`; history fetches may run on several
/// tasks at once when fetch concurrency is raised above one.
pub trait DataSourceClient: Send + Sync {
    /// Issues one GET against `endpoint` and returns the parsed JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on transport failure, non-success status, or a
    /// body that is not valid JSON.
    fn get<'a>(
        &'a self,
        endpoint: ApiEndpoint,
        params: QueryParams,
    ) -> Pin<Box<dyn Future<Output = Result<Value, SourceError>> + Send + 'a>>;
}

/// Connection settings for [`HttpDataSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpDataSourceConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub requests_per_minute: u32,
}

impl Default for HttpDataSourceConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://openapi.taptools.io/api/v1"),
            timeout_ms: 10_000,
            requests_per_minute: 60,
        }
    }
}

/// API-key authenticated data source over an [`HttpClient`].
#[derive(Clone)]
pub struct HttpDataSource {
    http_client: Arc<dyn HttpClient>,
    auth: HttpAuth,
    base_url: String,
    timeout_ms: u64,
    pacer: RequestPacer,
}

impl HttpDataSource {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        api_key: impl Into<String>,
        config: HttpDataSourceConfig,
    ) -> Result<Self, ValidationError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ValidationError::EmptyApiKey);
        }

        let base_url = config.base_url.trim().trim_end_matches('/').to_owned();
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(ValidationError::InvalidBaseUrl {
                value: config.base_url,
            });
        }

        Ok(Self {
            http_client,
            auth: HttpAuth::ApiKey(api_key),
            base_url,
            timeout_ms: config.timeout_ms,
            pacer: RequestPacer::per_minute(config.requests_per_minute),
        })
    }

    pub fn url_for(&self, endpoint: ApiEndpoint, params: &QueryParams) -> String {
        format!(
            "{}/{}{}",
            self.base_url,
            endpoint.path(),
            params.to_query_string()
        )
    }

    async fn execute(
        &self,
        endpoint: ApiEndpoint,
        params: QueryParams,
    ) -> Result<Value, SourceError> {
        self.pacer.acquire().await;

        let url = self.url_for(endpoint, &params);
        let request = HttpRequest::get(&url)
            .with_auth(&self.auth)
            .with_timeout_ms(self.timeout_ms);

        debug!(endpoint = %endpoint, url = %url, "issuing data source request");

        let response = self.http_client.execute(request).await.map_err(|error| {
            if error.retryable() {
                SourceError::unavailable(format!("{endpoint} transport error: {}", error.message()))
            } else {
                SourceError::internal(format!("{endpoint} transport error: {}", error.message()))
            }
        })?;

        if !response.is_success() {
            let message = format!("{endpoint} returned status {}", response.status);
            return Err(match response.status {
                429 => SourceError::rate_limited(message),
                500..=599 => SourceError::unavailable(message),
                _ => SourceError::invalid_request(message),
            });
        }

        serde_json::from_str(&response.body).map_err(|e| {
            SourceError::malformed_response(format!("failed to parse {endpoint} response: {e}"))
        })
    }
}

impl std::fmt::Debug for HttpDataSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDataSource")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .field("timeout_ms", &self.timeout_ms)
            .field("pacer", &self.pacer)
            .finish()
    }
}

impl DataSourceClient for HttpDataSource {
    fn get<'a>(
        &'a self,
        endpoint: ApiEndpoint,
        params: QueryParams,
    ) -> Pin<Box<dyn Future<Output = Result<Value, SourceError>> + Send + 'a>> {
        Box::pin(self.execute(endpoint, params))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::http_client::{HttpError, HttpResponse};

    struct RecordingClient {
        response: Result<HttpResponse, HttpError>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingClient {
        fn new(response: Result<HttpResponse, HttpError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl HttpClient for RecordingClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.seen.lock().expect("lock").push(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    fn source(client: Arc<RecordingClient>) -> HttpDataSource {
        HttpDataSource::new(
            client,
            "key-abc",
            HttpDataSourceConfig {
                base_url: String::from("https://api.example.test/api/v1/"),
                timeout_ms: 2_500,
                requests_per_minute: 600,
            },
        )
        .expect("valid source")
    }

    #[test]
    fn query_string_is_sorted_and_unquoted() {
        let params = QueryParams::new()
            .with("unit", "abc def")
            .with("numIntervals", 1000)
            .with("interval", "12h");

        assert_eq!(
            params.to_query_string(),
            "?interval=12h&numIntervals=1000&unit=abc%20def"
        );
        assert_eq!(QueryParams::new().to_query_string(), "");
    }

    #[tokio::test]
    async fn sends_api_key_header_and_builds_endpoint_url() {
        let client = RecordingClient::new(Ok(HttpResponse::ok_json("[]")));
        let source = source(client.clone());

        let body = source
            .get(
                ApiEndpoint::TopLiquidity,
                QueryParams::new().with("page", 1).with("perPage", 5),
            )
            .await
            .expect("request succeeds");

        assert_eq!(body, Value::Array(Vec::new()));
        let seen = client.seen.lock().expect("lock");
        assert_eq!(
            seen[0].url,
            "https://api.example.test/api/v1/token/top/liquidity?page=1&perPage=5"
        );
        assert_eq!(seen[0].headers.get("x-api-key").map(String::as_str), Some("key-abc"));
        assert_eq!(seen[0].timeout_ms, 2_500);
    }

    #[tokio::test]
    async fn maps_status_codes_to_error_kinds() {
        for (status, kind) in [
            (429, SourceErrorKind::RateLimited),
            (503, SourceErrorKind::Unavailable),
            (401, SourceErrorKind::InvalidRequest),
        ] {
            let client = RecordingClient::new(Ok(HttpResponse::with_status(status, "{}")));
            let error = source(client)
                .get(ApiEndpoint::Ohlcv, QueryParams::new())
                .await
                .expect_err("non-success must fail");
            assert_eq!(error.kind(), kind, "status {status}");
        }
    }

    #[tokio::test]
    async fn unparsable_body_is_malformed_response() {
        let client = RecordingClient::new(Ok(HttpResponse::ok_json("<html>")));
        let error = source(client)
            .get(ApiEndpoint::Ohlcv, QueryParams::new())
            .await
            .expect_err("must fail");

        assert_eq!(error.kind(), SourceErrorKind::MalformedResponse);
        assert_eq!(error.code(), "source.malformed_response");
    }

    #[tokio::test]
    async fn transport_errors_keep_retryability() {
        let client = RecordingClient::new(Err(HttpError::new("connection reset")));
        let error = source(client)
            .get(ApiEndpoint::Ohlcv, QueryParams::new())
            .await
            .expect_err("must fail");

        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        assert!(error.retryable());
        assert!(error.message().contains("connection reset"));
    }

    #[test]
    fn rejects_empty_key_and_bad_base_url() {
        let client = RecordingClient::new(Ok(HttpResponse::ok_json("[]")));
        assert_eq!(
            HttpDataSource::new(client.clone(), "  ", HttpDataSourceConfig::default())
                .expect_err("empty key"),
            ValidationError::EmptyApiKey
        );

        let config = HttpDataSourceConfig {
            base_url: String::from("ftp://nope"),
            ..HttpDataSourceConfig::default()
        };
        assert!(matches!(
            HttpDataSource::new(client, "k", config),
            Err(ValidationError::InvalidBaseUrl { .. })
        ));
    }
}
