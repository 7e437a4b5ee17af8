// crates/nimbus-compute/src/transport.rs
// ============================================================================
// Module: Compute Transport
// Description: Transport seam and blocking HTTP implementation.
// Purpose: Exchange composed REST requests with the compute endpoint.
// Dependencies: reqwest, serde
// ============================================================================

//! ## Overview
//! [`Transport`] is the seam between request composition and the wire. The
//! production implementation, [`HttpTransport`], issues blocking `reqwest`
//! calls against a configured endpoint with a static auth token, redirects
//! disabled, and a hard bound on response body size.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::io::Read;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;
use serde::Deserialize;

use crate::error::ClientError;
use crate::rest::JSON_CONTENT_TYPE;
use crate::rest::Method;
use crate::rest::ResponseHeaders;
use crate::rest::RestRequest;
use crate::rest::RestResponse;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the static service token.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Exchanges one composed request for one raw response.
///
/// Implementations report any received response, whatever its status; success
/// code enforcement belongs to [`crate::RestClient`].
pub trait Transport: Send + Sync {
    /// Sends the request and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when no response could be obtained.
    fn send(&self, request: &RestRequest) -> Result<RestResponse, ClientError>;
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the HTTP transport.
///
/// # Invariants
/// - `base_url` must parse and use `https`, or `http` when `allow_http` is set.
/// - `max_response_bytes` is enforced as a hard upper bound on response bodies.
/// - `timeout_ms` applies to the full request lifecycle.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct HttpTransportConfig {
    /// Compute endpoint base URL; request paths are appended to it.
    pub base_url: String,
    /// Optional static token sent as `X-Auth-Token`.
    pub token: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
    /// Allow cleartext HTTP (disabled by default).
    pub allow_http: bool,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: None,
            timeout_ms: 10_000,
            max_response_bytes: 8 * 1024 * 1024,
            user_agent: "nimbus/0.1".to_string(),
            allow_http: false,
        }
    }
}

impl fmt::Debug for HttpTransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransportConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_ms", &self.timeout_ms)
            .field("max_response_bytes", &self.max_response_bytes)
            .field("user_agent", &self.user_agent)
            .field("allow_http", &self.allow_http)
            .finish()
    }
}

// ============================================================================
// SECTION: HTTP Transport
// ============================================================================

/// Blocking HTTP transport for the compute service.
pub struct HttpTransport {
    /// Parsed endpoint base URL.
    base_url: Url,
    /// Optional static token.
    token: Option<String>,
    /// Maximum response size allowed, in bytes.
    max_response_bytes: usize,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl HttpTransport {
    /// Creates a transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: HttpTransportConfig) -> Result<Self, ClientError> {
        let base_url = parse_base_url(&config.base_url, config.allow_http)?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|err| ClientError::Config(format!("http client build failed: {err}")))?;
        Ok(Self {
            base_url,
            token: config.token,
            max_response_bytes: config.max_response_bytes,
            client,
        })
    }

    /// Returns the endpoint base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves the absolute URL for a request, including its query string.
    ///
    /// Each path segment is appended to the base path percent-encoded, so
    /// reserved characters in ids and keys never leak into the query or
    /// fragment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the base URL cannot carry a path.
    pub fn request_url(&self, request: &RestRequest) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ClientError::Config("compute url cannot carry a path".to_string()))?;
            segments.pop_if_empty();
            for segment in request.path.split('/').filter(|segment| !segment.is_empty()) {
                segments.push(segment);
            }
        }
        if !request.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in request.params.iter() {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &RestRequest) -> Result<RestResponse, ClientError> {
        let url = self.request_url(request)?;
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, url).header(ACCEPT, JSON_CONTENT_TYPE);
        if let Some(token) = &self.token {
            builder = builder.header(AUTH_TOKEN_HEADER, token.as_str());
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        let mut response = builder
            .send()
            .map_err(|err| ClientError::Transport(format!("http request failed: {err}")))?;
        let status = response.status().as_u16();
        let headers = collect_headers(&response);
        let body = read_response_limited(&mut response, &request.path, self.max_response_bytes)?;
        Ok(RestResponse {
            status,
            headers,
            body,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses the endpoint URL and applies the scheme policy.
fn parse_base_url(raw: &str, allow_http: bool) -> Result<Url, ClientError> {
    let url = Url::parse(raw)
        .map_err(|err| ClientError::Config(format!("invalid compute url: {err}")))?;
    match url.scheme() {
        "https" => {}
        "http" if allow_http => {}
        _ => return Err(ClientError::Config("unsupported compute url scheme".to_string())),
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(ClientError::Config("compute url credentials are not allowed".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ClientError::Config(
            "compute url must not carry a query or fragment".to_string(),
        ));
    }
    Ok(url)
}

/// Collects response headers, lower-cased; non-UTF-8 values are skipped.
fn collect_headers(response: &Response) -> ResponseHeaders {
    let mut headers = ResponseHeaders::new();
    for (name, value) in response.headers() {
        if let Ok(value) = value.to_str() {
            headers.insert(name.as_str().to_ascii_lowercase(), value.to_string());
        }
    }
    headers
}

/// Reads the body of the response to `path`, bounded by `max_bytes`.
///
/// A declared `Content-Length` over the limit fails before any read; a body
/// shorter than its declared length is reported as truncated.
fn read_response_limited(
    response: &mut Response,
    path: &str,
    max_bytes: usize,
) -> Result<Vec<u8>, ClientError> {
    let too_large = || {
        ClientError::Transport(format!(
            "compute response for {path} exceeds size limit of {max_bytes} bytes"
        ))
    };
    let limit = u64::try_from(max_bytes)
        .map_err(|_| ClientError::Config("response size limit exceeds u64".to_string()))?;
    let declared = response.content_length();
    if declared.is_some_and(|declared| declared > limit) {
        return Err(too_large());
    }
    let mut body = Vec::new();
    response.take(limit.saturating_add(1)).read_to_end(&mut body).map_err(|err| {
        ClientError::Transport(format!("failed to read compute response for {path}: {err}"))
    })?;
    if body.len() > max_bytes {
        return Err(too_large());
    }
    if let Some(declared) = declared
        && u64::try_from(body.len()).is_ok_and(|read| read < declared)
    {
        return Err(ClientError::Transport(format!("compute response for {path} was truncated")));
    }
    Ok(body)
}
