// crates/nimbus-compute/src/lib.rs
// ============================================================================
// Module: Nimbus Compute
// Description: REST binding and resource client for a compute service.
// Purpose: Map compute operations onto HTTP requests and unwrap responses.
// Dependencies: reqwest, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This crate is a client library for an OpenStack-compute shaped API
//! (servers, flavors, images, floating IPs). It is layered:
//! - [`ComputeClient`] composes request envelopes and unwraps responses.
//! - [`ComputeRestClient`] builds resource paths and query parameters.
//! - [`RestClient`] issues verbs, enforces success codes, and audits requests.
//! - [`Transport`] exchanges requests; [`HttpTransport`] is the blocking
//!   `reqwest` implementation.
//!
//! Invariants:
//! - Path segments are included by presence; query parameters by truthiness.
//! - Any status outside the declared success codes is a [`ClientError`] that
//!   reaches the caller untouched.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod compute;
pub mod compute_rest;
pub mod error;
pub mod resource;
pub mod rest;
pub mod transport;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::RequestAuditEvent;
pub use audit::RequestAuditSink;
pub use audit::RequestOutcome;
pub use audit::StderrAuditSink;
pub use compute::ComputeClient;
pub use compute::JsonObject;
pub use compute::Metadata;
pub use compute_rest::ComputeRestClient;
pub use compute_rest::FlavorListParams;
pub use compute_rest::ImageListParams;
pub use compute_rest::ServerListParams;
pub use error::ClientError;
pub use reqwest::Url;
pub use resource::ResourceDescriptor;
pub use resource::ResourceId;
pub use resource::ResourceKind;
pub use rest::Method;
pub use rest::QueryParams;
pub use rest::ResponseHeaders;
pub use rest::RestClient;
pub use rest::RestRequest;
pub use rest::RestResponse;
pub use rest::SuccessCodes;
pub use transport::HttpTransport;
pub use transport::HttpTransportConfig;
pub use transport::Transport;
