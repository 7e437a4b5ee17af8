// crates/nimbus-compute/src/compute.rs
// ============================================================================
// Module: Compute Resource Client
// Description: High-level compute operations over the REST path builder.
// Purpose: Compose request envelopes and unwrap response envelopes.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`ComputeClient`] is the user-facing compute API. Each operation issues
//! one request through [`ComputeRestClient`] (two for
//! [`ComputeClient::create_server`]) and strips the JSON envelope the service
//! wraps its payload in. Client errors propagate to the caller unchanged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::audit::RequestAuditSink;
use crate::compute_rest::ComputeRestClient;
use crate::compute_rest::DETAIL_COMMAND;
use crate::compute_rest::FlavorListParams;
use crate::compute_rest::ImageListParams;
use crate::compute_rest::ServerListParams;
use crate::compute_rest::require_id;
use crate::error::ClientError;
use crate::resource::ResourceId;
use crate::resource::ResourceKind;
use crate::rest::ResponseHeaders;
use crate::rest::RestClient;
use crate::rest::RestResponse;
use crate::transport::HttpTransport;
use crate::transport::HttpTransportConfig;
use crate::transport::Transport;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Success code for reads.
const GET_SUCCESS: u16 = 200;
/// Success code for asynchronous creates and actions.
const ACCEPTED: u16 = 202;
/// Success code for updates and deletes without a body.
const NO_CONTENT: u16 = 204;
/// Success code for metadata creation and bulk updates.
const CREATED: u16 = 201;
/// Image metadata keys inherited by new servers.
const INHERITED_IMAGE_METADATA: [&str; 2] = ["os", "users"];

// ============================================================================
// SECTION: Types
// ============================================================================

/// JSON object returned for a single entity.
pub type JsonObject = Map<String, Value>;

/// String-to-string metadata supplied by callers.
pub type Metadata = BTreeMap<String, String>;

/// High-level compute client.
#[derive(Clone)]
pub struct ComputeClient {
    /// Path builder used for every request.
    rest: ComputeRestClient,
}

impl ComputeClient {
    /// Creates a compute client over a transport and audit sink.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, audit: Arc<dyn RequestAuditSink>) -> Self {
        Self {
            rest: ComputeRestClient::new(RestClient::new(transport, audit)),
        }
    }

    /// Creates a compute client backed by [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the transport cannot be built.
    pub fn from_config(
        config: HttpTransportConfig,
        audit: Arc<dyn RequestAuditSink>,
    ) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(Arc::new(transport), audit))
    }

    /// Returns the underlying path builder.
    #[must_use]
    pub const fn rest(&self) -> &ComputeRestClient {
        &self.rest
    }

    // ------------------------------------------------------------------------
    // Servers
    // ------------------------------------------------------------------------

    /// Creates a server from a flavor and an image.
    ///
    /// The image is resolved first; its `os` and `users` metadata are copied
    /// into the request metadata, overriding caller values for those keys.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] from either request unchanged.
    pub fn create_server(
        &self,
        name: &str,
        flavor_id: impl Into<ResourceId>,
        image_id: impl Into<ResourceId>,
        personality: Option<Value>,
        metadata: Option<Metadata>,
    ) -> Result<JsonObject, ClientError> {
        let image_id = image_id.into();
        let image = self.get_image_details(&image_id)?;
        let mut request_metadata: JsonObject = metadata
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        if let Some(Value::Object(image_metadata)) = image.get("metadata") {
            for key in INHERITED_IMAGE_METADATA {
                if let Some(value) = image_metadata.get(key) {
                    request_metadata.insert(key.to_string(), value.clone());
                }
            }
        }
        let mut server = JsonObject::new();
        server.insert("flavorRef".to_string(), to_json(&flavor_id.into())?);
        server.insert("name".to_string(), Value::String(name.to_string()));
        server.insert("imageRef".to_string(), to_json(&image_id)?);
        server.insert("metadata".to_string(), Value::Object(request_metadata));
        if let Some(personality) = personality {
            server.insert("personality".to_string(), personality);
        }
        let request = json!({ "server": server });
        let response = self.rest.servers_post(ResourceId::none(), "", Some(&request), ACCEPTED)?;
        unwrap_object(&response, "server")
    }

    /// Lists servers, with full details when `detail` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the envelope is missing.
    pub fn list_servers(&self, detail: bool) -> Result<Vec<Value>, ClientError> {
        let response = self.rest.servers_get(
            ResourceId::none(),
            detail_command(detail),
            &ServerListParams::default(),
            GET_SUCCESS,
        )?;
        unwrap_list(&response, "servers")
    }

    /// Returns one server.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the envelope is missing.
    pub fn get_server_details(
        &self,
        server_id: impl Into<ResourceId>,
    ) -> Result<JsonObject, ClientError> {
        let server_id = existing(ResourceKind::Servers, server_id)?;
        let response =
            self.rest.servers_get(server_id, "", &ServerListParams::default(), GET_SUCCESS)?;
        unwrap_object(&response, ResourceKind::Servers.singular())
    }

    /// Renames a server.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn update_server_name(
        &self,
        server_id: impl Into<ResourceId>,
        new_name: &str,
    ) -> Result<(), ClientError> {
        let server_id = existing(ResourceKind::Servers, server_id)?;
        let request = json!({ "server": { "name": new_name } });
        self.rest.servers_put(server_id, "", Some(&request), NO_CONTENT)?;
        Ok(())
    }

    /// Deletes a server.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn delete_server(&self, server_id: impl Into<ResourceId>) -> Result<(), ClientError> {
        self.rest.servers_delete(server_id, "", NO_CONTENT)?;
        Ok(())
    }

    /// Reboots a server, hard or soft.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn reboot_server(
        &self,
        server_id: impl Into<ResourceId>,
        hard: bool,
    ) -> Result<(), ClientError> {
        let server_id = existing(ResourceKind::Servers, server_id)?;
        let reboot_type = if hard { "HARD" } else { "SOFT" };
        let request = json!({ "reboot": { "type": reboot_type } });
        self.rest.servers_post(server_id, "action", Some(&request), ACCEPTED)?;
        Ok(())
    }

    /// Resizes a server to another flavor.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn resize_server(
        &self,
        server_id: impl Into<ResourceId>,
        flavor_id: impl Into<ResourceId>,
    ) -> Result<(), ClientError> {
        let server_id = existing(ResourceKind::Servers, server_id)?;
        let request = json!({ "resize": { "flavorRef": to_json(&flavor_id.into())? } });
        self.rest.servers_post(server_id, "action", Some(&request), ACCEPTED)?;
        Ok(())
    }

    /// Returns server addresses, for one network when `network_id` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the envelope is missing.
    pub fn get_server_addresses(
        &self,
        server_id: impl Into<ResourceId>,
        network_id: Option<&str>,
    ) -> Result<Value, ClientError> {
        let network_id = network_id.filter(|network| !network.is_empty());
        let response = self.rest.servers_ips_get(server_id, network_id, None, GET_SUCCESS)?;
        unwrap_envelope(&response, network_id.unwrap_or("addresses"))
    }

    // ------------------------------------------------------------------------
    // Server metadata
    // ------------------------------------------------------------------------

    /// Sets one metadata key on a server.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the envelope is missing.
    pub fn create_server_metadata(
        &self,
        server_id: impl Into<ResourceId>,
        key: &str,
        value: &str,
    ) -> Result<JsonObject, ClientError> {
        let request = json!({ "meta": { key: value } });
        let response = self.rest.servers_metadata_put(server_id, key, Some(&request), CREATED)?;
        unwrap_object(&response, "meta")
    }

    /// Returns one metadata key (`key` set) or all metadata of a server.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the envelope is missing.
    pub fn get_server_metadata(
        &self,
        server_id: impl Into<ResourceId>,
        key: Option<&str>,
    ) -> Result<JsonObject, ClientError> {
        let key = key.filter(|key| !key.is_empty());
        let response = self.rest.servers_metadata_get(server_id, key, GET_SUCCESS)?;
        unwrap_object(&response, metadata_envelope(key))
    }

    /// Merges metadata into a server's metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the envelope is missing.
    pub fn update_server_metadata(
        &self,
        server_id: impl Into<ResourceId>,
        metadata: &Metadata,
    ) -> Result<JsonObject, ClientError> {
        let request = json!({ "metadata": metadata });
        let response = self.rest.servers_metadata_post(server_id, Some(&request), CREATED)?;
        unwrap_object(&response, "metadata")
    }

    /// Removes one metadata key from a server.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn delete_server_metadata(
        &self,
        server_id: impl Into<ResourceId>,
        key: &str,
    ) -> Result<(), ClientError> {
        self.rest.servers_metadata_delete(server_id, key, NO_CONTENT)?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Flavors
    // ------------------------------------------------------------------------

    /// Lists flavors, with full details when `detail` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the envelope is missing.
    pub fn list_flavors(&self, detail: bool) -> Result<Vec<Value>, ClientError> {
        let response = self.rest.flavors_get(
            ResourceId::none(),
            detail_command(detail),
            &FlavorListParams::default(),
            GET_SUCCESS,
        )?;
        unwrap_list(&response, "flavors")
    }

    /// Returns one flavor.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the envelope is missing.
    pub fn get_flavor_details(
        &self,
        flavor_id: impl Into<ResourceId>,
    ) -> Result<JsonObject, ClientError> {
        let flavor_id = existing(ResourceKind::Flavors, flavor_id)?;
        let response =
            self.rest.flavors_get(flavor_id, "", &FlavorListParams::default(), GET_SUCCESS)?;
        unwrap_object(&response, ResourceKind::Flavors.singular())
    }

    // ------------------------------------------------------------------------
    // Images
    // ------------------------------------------------------------------------

    /// Lists images, with full details when `detail` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the envelope is missing.
    pub fn list_images(&self, detail: bool) -> Result<Vec<Value>, ClientError> {
        let response = self.rest.images_get(
            ResourceId::none(),
            detail_command(detail),
            &ImageListParams::default(),
            GET_SUCCESS,
        )?;
        unwrap_list(&response, "images")
    }

    /// Returns one image.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the envelope is missing.
    pub fn get_image_details(
        &self,
        image_id: impl Into<ResourceId>,
    ) -> Result<JsonObject, ClientError> {
        let image_id = existing(ResourceKind::Images, image_id)?;
        let response =
            self.rest.images_get(image_id, "", &ImageListParams::default(), GET_SUCCESS)?;
        unwrap_object(&response, ResourceKind::Images.singular())
    }

    /// Deletes an image.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn delete_image(&self, image_id: impl Into<ResourceId>) -> Result<(), ClientError> {
        self.rest.images_delete(image_id, "", NO_CONTENT)?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Image metadata
    // ------------------------------------------------------------------------

    /// Sets one metadata key on an image.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the envelope is missing.
    pub fn create_image_metadata(
        &self,
        image_id: impl Into<ResourceId>,
        key: &str,
        value: &str,
    ) -> Result<JsonObject, ClientError> {
        let request = json!({ "meta": { key: value } });
        let response = self.rest.images_metadata_put(image_id, key, Some(&request), CREATED)?;
        unwrap_object(&response, "meta")
    }

    /// Returns one metadata key (`key` set) or all metadata of an image.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the envelope is missing.
    pub fn get_image_metadata(
        &self,
        image_id: impl Into<ResourceId>,
        key: Option<&str>,
    ) -> Result<JsonObject, ClientError> {
        let key = key.filter(|key| !key.is_empty());
        let response = self.rest.images_metadata_get(image_id, key, GET_SUCCESS)?;
        unwrap_object(&response, metadata_envelope(key))
    }

    /// Merges metadata into an image's metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the envelope is missing.
    pub fn update_image_metadata(
        &self,
        image_id: impl Into<ResourceId>,
        metadata: &Metadata,
    ) -> Result<JsonObject, ClientError> {
        let request = json!({ "metadata": metadata });
        let response = self.rest.images_metadata_post(image_id, Some(&request), CREATED)?;
        unwrap_object(&response, "metadata")
    }

    /// Removes one metadata key from an image.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn delete_image_metadata(
        &self,
        image_id: impl Into<ResourceId>,
        key: &str,
    ) -> Result<(), ClientError> {
        self.rest.images_metadata_delete(image_id, key, NO_CONTENT)?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Floating IPs
    // ------------------------------------------------------------------------

    /// Returns the raw floating IP pools document of a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn get_floating_ip_pools(&self, tenant_id: &str) -> Result<Value, ClientError> {
        self.rest.floating_ip_pools_get(tenant_id, GET_SUCCESS)?.json()
    }

    /// Returns the raw floating IPs document of a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn get_floating_ips(&self, tenant_id: &str) -> Result<Value, ClientError> {
        self.rest.floating_ips_get(tenant_id, None, GET_SUCCESS)?.json()
    }

    /// Allocates a floating IP, from `pool` when given.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the envelope is missing.
    pub fn alloc_floating_ip(
        &self,
        tenant_id: &str,
        pool: Option<&str>,
    ) -> Result<JsonObject, ClientError> {
        let request = pool
            .filter(|pool| !pool.is_empty())
            .map_or_else(|| json!({}), |pool| json!({ "pool": pool }));
        let response =
            self.rest.floating_ips_post(tenant_id, Some(&request), None, [GET_SUCCESS, ACCEPTED])?;
        unwrap_object(&response, "floating_ip")
    }

    /// Returns the tenant's `floating_ips` list.
    ///
    /// The request addresses `ip` when given, but the full list from the
    /// response is returned without filtering.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the envelope is missing.
    pub fn get_floating_ip(
        &self,
        tenant_id: &str,
        ip: Option<&str>,
    ) -> Result<Vec<Value>, ClientError> {
        let response = self.rest.floating_ips_get(tenant_id, ip, GET_SUCCESS)?;
        unwrap_list(&response, "floating_ips")
    }

    /// Releases a floating IP and returns the response headers.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn delete_floating_ip(
        &self,
        tenant_id: &str,
        ip: Option<&str>,
    ) -> Result<ResponseHeaders, ClientError> {
        let response = self.rest.floating_ips_delete(tenant_id, ip, [ACCEPTED, NO_CONTENT])?;
        Ok(response.headers)
    }

    // ------------------------------------------------------------------------
    // Limits
    // ------------------------------------------------------------------------

    /// Returns the absolute and rate limits of the account.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the envelope is missing.
    pub fn get_limits(&self) -> Result<JsonObject, ClientError> {
        let response = self.rest.limits_get(GET_SUCCESS)?;
        unwrap_object(&response, "limits")
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps the detail flag to a listing command.
const fn detail_command(detail: bool) -> &'static str {
    if detail { DETAIL_COMMAND } else { "" }
}

/// Single-key metadata uses `meta`, full metadata uses `metadata`.
const fn metadata_envelope(key: Option<&str>) -> &'static str {
    if key.is_some() { "meta" } else { "metadata" }
}

/// Converts an id that must address an existing entity.
fn existing(kind: ResourceKind, id: impl Into<ResourceId>) -> Result<ResourceId, ClientError> {
    let id = id.into();
    require_id(kind, &id)?;
    Ok(id)
}

/// Serializes an identifier for a request body.
fn to_json(id: &ResourceId) -> Result<Value, ClientError> {
    serde_json::to_value(id).map_err(|err| ClientError::Json(format!("invalid identifier: {err}")))
}

/// Removes and returns the value stored under `key` in a response body.
fn unwrap_envelope(response: &RestResponse, key: &str) -> Result<Value, ClientError> {
    match response.json()? {
        Value::Object(mut map) => map.remove(key).ok_or_else(|| {
            ClientError::Protocol(format!("response is missing the {key} envelope"))
        }),
        _ => Err(ClientError::Protocol(format!("expected a {key} envelope object"))),
    }
}

/// Unwraps an envelope holding a JSON object.
fn unwrap_object(response: &RestResponse, key: &str) -> Result<JsonObject, ClientError> {
    match unwrap_envelope(response, key)? {
        Value::Object(map) => Ok(map),
        _ => Err(ClientError::Protocol(format!("{key} envelope is not an object"))),
    }
}

/// Unwraps an envelope holding a JSON array.
fn unwrap_list(response: &RestResponse, key: &str) -> Result<Vec<Value>, ClientError> {
    match unwrap_envelope(response, key)? {
        Value::Array(items) => Ok(items),
        _ => Err(ClientError::Protocol(format!("{key} envelope is not a list"))),
    }
}
