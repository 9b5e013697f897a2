//! HTTP transport for the Faith backend
//!
//! This module holds the request envelope, the response wrapper, client
//! configuration and the thin reqwest-based transport. The transport does a
//! single round trip per call: it knows nothing about sessions or refresh,
//! it only attaches the bearer it is handed. Renewal lives in
//! [`ApiClient`](crate::ApiClient).

use crate::envelope;
use crate::error::{ApiError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Method, Response as ReqwestResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default backend base URL (local development server)
///
/// Service paths carry their own prefixes (`/auth/...`, `/api/v1/islam/...`),
/// so this is the server root.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default path of the token refresh endpoint
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";

/// Environment variable overriding the base URL
pub const ENV_BASE_URL: &str = "FAITH_API_BASE_URL";

/// Environment variable overriding the timeout, in seconds
pub const ENV_TIMEOUT_SECS: &str = "FAITH_API_TIMEOUT_SECS";

// =============================================================================
// Request Types
// =============================================================================

/// HTTP method of an API request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request
    Get,
    /// POST request
    Post,
    /// PUT request
    Put,
    /// PATCH request
    Patch,
    /// DELETE request
    Delete,
}

impl HttpMethod {
    /// Method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> Method {
        match self {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

/// Which dispatch of a request this is.
///
/// A request is dispatched at most twice: once normally and, after a
/// successful session refresh, once more with the new token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// Original dispatch
    First,
    /// Dispatch after a session refresh
    Retry,
}

impl Attempt {
    /// Whether this is the post-refresh dispatch
    pub fn is_retry(self) -> bool {
        self == Attempt::Retry
    }

    /// One-based attempt number, for logging
    pub fn number(self) -> u8 {
        match self {
            Attempt::First => 1,
            Attempt::Retry => 2,
        }
    }
}

/// Outbound request envelope
///
/// # Examples
/// ```
/// use api_client::http::{ApiRequest, HttpMethod};
///
/// let request = ApiRequest::get("/api/v1/islam/prayers/times")
///     .param("lat", 21.42)
///     .param("lng", 39.82)
///     .opt_param("method", None::<&str>);
///
/// assert_eq!(request.method, HttpMethod::Get);
/// assert_eq!(request.params.len(), 2);
/// assert!(request.authenticated);
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path relative to the configured base URL (e.g. "/auth/profile")
    pub path: String,
    /// Query parameters, in insertion order
    pub params: Vec<(String, String)>,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
    /// JSON body
    pub body: Option<serde_json::Value>,
    /// Whether the session bearer is attached and 401s trigger a refresh
    pub authenticated: bool,
}

impl ApiRequest {
    /// Create a request with the given method and path
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            headers: Vec::new(),
            body: None,
            authenticated: true,
        }
    }

    /// Create a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Create a POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Create a PUT request
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Create a PATCH request
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    /// Create a DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Add a query parameter when a value is present
    pub fn opt_param<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Set the JSON body
    pub fn json_body<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        let body = serde_json::to_value(value)
            .map_err(|e| ApiError::InvalidRequest(format!("body is not serializable: {}", e)))?;
        self.body = Some(body);
        Ok(self)
    }

    /// Send without the session bearer and never trigger a refresh
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Decoded API response
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// HTTP status code
    pub status: u16,
    /// Response headers (lower-case names)
    pub headers: HashMap<String, String>,
    /// Decoded body
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Create a new response
    pub fn new(status: u16, headers: HashMap<String, String>, data: T) -> Self {
        Self { status, headers, data }
    }

    /// Get a header value
    pub fn header(&self, key: &str) -> Option<&String> {
        self.headers.get(&key.to_ascii_lowercase())
    }

    /// Check if the response is successful (2xx status)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the HTTP transport
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, including any path prefix (e.g. "https://host/api")
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Headers included in all requests
    pub default_headers: HashMap<String, String>,
    /// Path of the token refresh endpoint
    pub refresh_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("faith-companion/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new config with a base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Default::default() }
    }

    /// Build a config from `FAITH_API_BASE_URL` and `FAITH_API_TIMEOUT_SECS`,
    /// falling back to the defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => warn!(value = %raw, "Ignoring invalid {}", ENV_TIMEOUT_SECS),
            }
        }

        config
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set the refresh endpoint path
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Join a request path onto the base URL
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

// =============================================================================
// Transport
// =============================================================================

/// Single-round-trip HTTP transport
///
/// Clone is cheap: the reqwest client shares its connection pool and the
/// configuration sits behind an `Arc`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    config: Arc<ClientConfig>,
}

impl HttpClient {
    /// Create a new transport
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config: Arc::new(config) })
    }

    /// Get the configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Issue one request, attaching `bearer` as the Authorization header
    /// when given, and decode a 2xx body as `T`.
    pub async fn execute<T>(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
        attempt: Attempt,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.config.url(&request.path);
        debug!(
            method = request.method.as_str(),
            path = %request.path,
            attempt = attempt.number(),
            authorized = bearer.is_some(),
            "Dispatching request"
        );

        let mut req = self
            .client
            .request(request.method.to_reqwest(), &url)
            .headers(self.build_headers(request)?);

        if !request.params.is_empty() {
            req = req.query(&request.params);
        }

        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }

        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let response = req.send().await?;
        Self::parse_response(response).await
    }

    fn build_headers(&self, request: &ApiRequest) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        for (key, value) in self.config.default_headers.iter().chain(
            request.headers.iter().map(|(k, v)| (k, v)),
        ) {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| ApiError::InvalidRequest(format!("invalid header name: {}", key)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ApiError::InvalidRequest(format!("invalid value for header {}", key)))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }

    async fn parse_response<T>(response: ReqwestResponse) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let status = response.status().as_u16();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(key.as_str().to_string(), value.to_string());
            }
        }

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, body));
        }

        let body = response.text().await?;
        let data = envelope::decode(&body)?;

        Ok(ApiResponse::new(status, headers, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builders() {
        let req = ApiRequest::patch("/api/v1/islam/dhikr/counters/abc")
            .header("X-Client", "mobile")
            .json_body(&json!({"count": 33}))
            .unwrap();

        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.path, "/api/v1/islam/dhikr/counters/abc");
        assert_eq!(req.headers, vec![("X-Client".to_string(), "mobile".to_string())]);
        assert_eq!(req.body, Some(json!({"count": 33})));
        assert!(req.authenticated);
    }

    #[test]
    fn test_optional_params_skipped() {
        let req = ApiRequest::get("/api/v1/islam/calendar/today")
            .opt_param("timezone", None::<String>)
            .opt_param("days", Some(90));

        assert_eq!(req.params, vec![("days".to_string(), "90".to_string())]);
    }

    #[test]
    fn test_anonymous_request() {
        let req = ApiRequest::post("/auth/login").anonymous();
        assert!(!req.authenticated);
    }

    #[test]
    fn test_attempt() {
        assert!(!Attempt::First.is_retry());
        assert!(Attempt::Retry.is_retry());
        assert_eq!(Attempt::First.number(), 1);
        assert_eq!(Attempt::Retry.number(), 2);
    }

    #[test]
    fn test_http_method_as_str() {
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::Post.as_str(), "POST");
        assert_eq!(HttpMethod::Put.as_str(), "PUT");
        assert_eq!(HttpMethod::Patch.as_str(), "PATCH");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
    }

    #[test]
    fn test_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.refresh_path, "/auth/refresh");
        assert!(config.user_agent.starts_with("faith-companion/"));
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("https://faith.example.com/api")
            .with_timeout(Duration::from_secs(30))
            .with_user_agent("FaithTest/1.0")
            .with_header("X-Platform", "ios")
            .with_refresh_path("/auth/token");

        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.user_agent, "FaithTest/1.0");
        assert_eq!(config.default_headers.get("X-Platform"), Some(&"ios".to_string()));
        assert_eq!(config.refresh_path, "/auth/token");
    }

    #[test]
    fn test_config_url_join() {
        let config = ClientConfig::new("https://faith.example.com/api/");
        assert_eq!(config.url("/auth/login"), "https://faith.example.com/api/auth/login");
        assert_eq!(config.url("auth/login"), "https://faith.example.com/api/auth/login");
    }

    #[test]
    fn test_default_config_joins_service_paths_once() {
        let config = ClientConfig::default();
        assert_eq!(config.url("/auth/login"), "http://localhost:3000/auth/login");
        assert_eq!(
            config.url("/api/v1/islam/quran/surahs"),
            "http://localhost:3000/api/v1/islam/quran/surahs"
        );
        assert!(!config.url("/api/content/daily").contains("/api/api/"));
    }

    #[test]
    fn test_config_from_lookup() {
        let config = ClientConfig::from_lookup(|key| match key {
            ENV_BASE_URL => Some("https://prod.example.com/api".to_string()),
            ENV_TIMEOUT_SECS => Some("25".to_string()),
            _ => None,
        });
        assert_eq!(config.base_url, "https://prod.example.com/api");
        assert_eq!(config.timeout, Duration::from_secs(25));
    }

    #[test]
    fn test_config_from_lookup_ignores_bad_timeout() {
        let config = ClientConfig::from_lookup(|key| match key {
            ENV_TIMEOUT_SECS => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_response_header_lookup() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        let response = ApiResponse::new(200, headers, ());

        assert!(response.is_success());
        assert_eq!(response.header("Content-Type"), Some(&"application/json".to_string()));
    }

    #[test]
    fn test_transport_new() {
        let client = HttpClient::new(ClientConfig::new("https://faith.example.com")).unwrap();
        assert_eq!(client.config().base_url, "https://faith.example.com");
    }
}
