// crates/nimbus-compute/src/rest.rs
// ============================================================================
// Module: Generic REST Layer
// Description: HTTP verbs, query parameters, JSON bodies, and status checks.
// Purpose: Turn a path plus parameters into one request and enforce success codes.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`RestClient`] owns the verb functions used by the compute path builder.
//! It applies include-if-set semantics to query parameters, serializes JSON
//! bodies with their content headers, delegates to a [`Transport`], and turns
//! any status outside the caller's declared [`SuccessCodes`] into a
//! [`ClientError::Status`].
//!
//! Invariants:
//! - `Content-Type` and `Content-Length` are the last two headers of a request
//!   carrying a JSON body, in that order.
//! - Falsy JSON payloads (null, empty object, empty array) send no body.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::num::FpCategory;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;

use crate::audit::RequestAuditEvent;
use crate::audit::RequestAuditEventParams;
use crate::audit::RequestAuditSink;
use crate::audit::RequestOutcome;
use crate::error::ClientError;
use crate::transport::Transport;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// JSON media type used for request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

// ============================================================================
// SECTION: Request Types
// ============================================================================

/// HTTP verbs issued by the compute client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
    /// HTTP PUT.
    Put,
    /// HTTP DELETE.
    Delete,
}

impl Method {
    /// Returns the wire name of the verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of HTTP status codes a caller accepts as success.
///
/// # Invariants
/// - Never empty; constructors always supply at least one code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessCodes(Vec<u16>);

impl SuccessCodes {
    /// Creates a success set holding a single status code.
    #[must_use]
    pub fn one(status: u16) -> Self {
        Self(vec![status])
    }

    /// Returns true when `status` is an accepted code.
    #[must_use]
    pub fn contains(&self, status: u16) -> bool {
        self.0.contains(&status)
    }

    /// Returns the accepted codes in declaration order.
    #[must_use]
    pub fn as_slice(&self) -> &[u16] {
        &self.0
    }
}

impl From<u16> for SuccessCodes {
    fn from(status: u16) -> Self {
        Self::one(status)
    }
}

impl<const N: usize> From<[u16; N]> for SuccessCodes {
    fn from(codes: [u16; N]) -> Self {
        Self::from(codes.as_slice())
    }
}

impl From<&[u16]> for SuccessCodes {
    fn from(codes: &[u16]) -> Self {
        if codes.is_empty() { Self::one(200) } else { Self(codes.to_vec()) }
    }
}

/// Value that may be sent as a query parameter.
///
/// Parameters follow truthiness: a value is sent only when [`is_set`] holds.
///
/// [`is_set`]: QueryValue::is_set
pub trait QueryValue {
    /// Returns true when the value should be included in the request.
    fn is_set(&self) -> bool;

    /// Renders the value for the query string.
    fn to_query(&self) -> String;
}

impl QueryValue for str {
    fn is_set(&self) -> bool {
        !self.is_empty()
    }

    fn to_query(&self) -> String {
        self.to_string()
    }
}

impl QueryValue for String {
    fn is_set(&self) -> bool {
        !self.is_empty()
    }

    fn to_query(&self) -> String {
        self.clone()
    }
}

impl QueryValue for bool {
    fn is_set(&self) -> bool {
        *self
    }

    fn to_query(&self) -> String {
        self.to_string()
    }
}

impl QueryValue for u32 {
    fn is_set(&self) -> bool {
        *self != 0
    }

    fn to_query(&self) -> String {
        self.to_string()
    }
}

impl QueryValue for u64 {
    fn is_set(&self) -> bool {
        *self != 0
    }

    fn to_query(&self) -> String {
        self.to_string()
    }
}

impl<T: QueryValue + ?Sized> QueryValue for &T {
    fn is_set(&self) -> bool {
        (**self).is_set()
    }

    fn to_query(&self) -> String {
        (**self).to_query()
    }
}

/// Ordered query parameters for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds `name` only when `value` is present and set.
    pub fn set_param<V: QueryValue>(&mut self, name: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value
            && value.is_set()
        {
            self.0.push((name.to_string(), value.to_query()));
        }
        self
    }

    /// Returns the value recorded for `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    /// Iterates parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Returns the number of parameters.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no parameter is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Fully composed outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestRequest {
    /// HTTP verb.
    pub method: Method,
    /// Path relative to the service endpoint, always starting with `/`.
    pub path: String,
    /// Query parameters.
    pub params: QueryParams,
    /// Request headers in the order they were set.
    pub headers: Vec<(String, String)>,
    /// Optional request body.
    pub body: Option<Vec<u8>>,
    /// Accepted status codes.
    pub success: SuccessCodes,
}

impl RestRequest {
    /// Returns the first header value recorded for `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Parses the request body as JSON, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Json`] when the body is not valid JSON.
    pub fn json_body(&self) -> Result<Option<Value>, ClientError> {
        self.body
            .as_deref()
            .map(|body| {
                serde_json::from_slice(body)
                    .map_err(|err| ClientError::Json(format!("invalid request body: {err}")))
            })
            .transpose()
    }
}

// ============================================================================
// SECTION: Response Types
// ============================================================================

/// Response headers keyed by lower-cased header name.
pub type ResponseHeaders = BTreeMap<String, String>;

/// Raw response returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: ResponseHeaders,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl RestResponse {
    /// Builds a response with a JSON body and no headers.
    #[must_use]
    pub fn from_json(status: u16, body: &Value) -> Self {
        Self {
            status,
            headers: ResponseHeaders::new(),
            body: serde_json::to_vec(body).unwrap_or_default(),
        }
    }

    /// Builds a response with an empty body.
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: ResponseHeaders::new(),
            body: Vec::new(),
        }
    }

    /// Adds a header, lower-casing its name.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Parses the body as JSON; an empty body parses as `null`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Json`] when the body is not valid JSON.
    pub fn json(&self) -> Result<Value, ClientError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body)
            .map_err(|err| ClientError::Json(format!("invalid response body: {err}")))
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Generic REST client that issues verbs through a [`Transport`].
#[derive(Clone)]
pub struct RestClient {
    /// Transport used to exchange requests.
    transport: Arc<dyn Transport>,
    /// Sink receiving one event per request.
    audit: Arc<dyn RequestAuditSink>,
}

impl RestClient {
    /// Creates a REST client over the given transport and audit sink.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, audit: Arc<dyn RequestAuditSink>) -> Self {
        Self {
            transport,
            audit,
        }
    }

    /// Issues a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the exchange fails or the status is not accepted.
    pub fn get(
        &self,
        path: &str,
        params: QueryParams,
        success: SuccessCodes,
    ) -> Result<RestResponse, ClientError> {
        self.request(Method::Get, path, params, None, success)
    }

    /// Issues a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the exchange fails or the status is not accepted.
    pub fn delete(
        &self,
        path: &str,
        params: QueryParams,
        success: SuccessCodes,
    ) -> Result<RestResponse, ClientError> {
        self.request(Method::Delete, path, params, None, success)
    }

    /// Issues a POST request with an optional JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when serialization or the exchange fails, or the
    /// status is not accepted.
    pub fn post(
        &self,
        path: &str,
        params: QueryParams,
        json_data: Option<&Value>,
        success: SuccessCodes,
    ) -> Result<RestResponse, ClientError> {
        self.request(Method::Post, path, params, json_data, success)
    }

    /// Issues a PUT request with an optional JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when serialization or the exchange fails, or the
    /// status is not accepted.
    pub fn put(
        &self,
        path: &str,
        params: QueryParams,
        json_data: Option<&Value>,
        success: SuccessCodes,
    ) -> Result<RestResponse, ClientError> {
        self.request(Method::Put, path, params, json_data, success)
    }

    /// Composes, sends, audits, and checks one request.
    fn request(
        &self,
        method: Method,
        path: &str,
        params: QueryParams,
        json_data: Option<&Value>,
        success: SuccessCodes,
    ) -> Result<RestResponse, ClientError> {
        let mut headers = Vec::new();
        let mut body = None;
        if let Some(payload) = json_data.filter(|payload| json_is_set(payload)) {
            let bytes = serde_json::to_vec(payload)
                .map_err(|err| ClientError::Json(format!("request serialization failed: {err}")))?;
            headers.push(("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()));
            headers.push(("Content-Length".to_string(), bytes.len().to_string()));
            body = Some(bytes);
        }
        let request = RestRequest {
            method,
            path: path.to_string(),
            params,
            headers,
            body,
            success,
        };
        let request_bytes = request.body.as_ref().map_or(0, Vec::len);
        let started = Instant::now();
        let (result, status, outcome, response_bytes) = match self.transport.send(&request) {
            Ok(response) => {
                let status = response.status;
                let response_bytes = response.body.len();
                if request.success.contains(status) {
                    (Ok(response), Some(status), RequestOutcome::Success, response_bytes)
                } else {
                    let err = ClientError::from_status(status, &response.body);
                    (Err(err), Some(status), RequestOutcome::StatusError, response_bytes)
                }
            }
            Err(err) => (Err(err), None, RequestOutcome::TransportError, 0),
        };
        self.audit.record(&RequestAuditEvent::new(RequestAuditEventParams {
            method,
            path: request.path.clone(),
            status,
            outcome,
            error_kind: result.as_ref().err().map(ClientError::kind_label),
            request_bytes,
            response_bytes,
            elapsed_ms: started.elapsed().as_millis(),
        }));
        result
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when a JSON payload is truthy and should be sent as a body.
pub(crate) fn json_is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => {
            number.as_f64().is_some_and(|n| n.classify() != FpCategory::Zero)
        }
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Joins path parts into an absolute path, skipping empty parts.
///
/// Leading and trailing slashes on each part are trimmed, so `"/metadata"` and
/// `"metadata/key"` both compose cleanly.
pub(crate) fn join_path<S: AsRef<str>>(parts: &[S]) -> String {
    let mut path = String::new();
    for part in parts {
        let trimmed = part.as_ref().trim_matches('/');
        if trimmed.is_empty() {
            continue;
        }
        path.push('/');
        path.push_str(trimmed);
    }
    if path.is_empty() {
        path.push('/');
    }
    path
}
