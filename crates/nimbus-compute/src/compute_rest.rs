// crates/nimbus-compute/src/compute_rest.rs
// ============================================================================
// Module: Compute REST Path Builder
// Description: URL path and parameter construction for compute resources.
// Purpose: Map resource + id + command + filters onto one REST verb call.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`ComputeRestClient`] translates resource-oriented calls into concrete
//! requests issued through [`RestClient`]. Generic builders take a
//! [`ResourceKind`]; the per-family methods (`servers_get`,
//! `images_metadata_delete`, ...) are thin wrappers over them. Floating IPs
//! are tenant-scoped and have their own builders.
//!
//! Invariants:
//! - Path segments are included by presence: empty text is omitted, numeric
//!   `0` is rendered.
//! - A present id, key, ip, or tenant renders as exactly one path segment;
//!   values containing `/` or equal to `.` or `..` are rejected before I/O.
//! - Query parameters are included by truthiness.
//! - Collection filters are only sent when no resource id is addressed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::error::ClientError;
use crate::resource::ResourceId;
use crate::resource::ResourceKind;
use crate::rest::QueryParams;
use crate::rest::RestClient;
use crate::rest::RestResponse;
use crate::rest::SuccessCodes;
use crate::rest::join_path;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Command selecting the detailed collection listing.
pub const DETAIL_COMMAND: &str = "detail";
/// Path segment of floating IP pools under a tenant.
const FLOATING_IP_POOLS_SEGMENT: &str = "os-floating-ip-pools";
/// Path segment of floating IPs under a tenant.
const FLOATING_IPS_SEGMENT: &str = "os-floating-ips";
/// Query parameter shared by all change-tracking listings.
const CHANGES_SINCE: &str = "changes-since";

// ============================================================================
// SECTION: Collection Filters
// ============================================================================

/// Filters accepted by `GET /servers[/detail]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerListParams {
    /// Only servers changed since this timestamp.
    pub changes_since: Option<String>,
    /// Image reference.
    pub image: Option<String>,
    /// Flavor reference.
    pub flavor: Option<String>,
    /// Server name.
    pub name: Option<String>,
    /// Pagination marker.
    pub marker: Option<String>,
    /// Page size.
    pub limit: Option<u32>,
    /// Server status.
    pub status: Option<String>,
    /// Host identifier.
    pub host: Option<String>,
}

impl ServerListParams {
    /// Renders the filters as query parameters.
    #[must_use]
    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .set_param(CHANGES_SINCE, self.changes_since.as_deref())
            .set_param("image", self.image.as_deref())
            .set_param("flavor", self.flavor.as_deref())
            .set_param("name", self.name.as_deref())
            .set_param("marker", self.marker.as_deref())
            .set_param("limit", self.limit)
            .set_param("status", self.status.as_deref())
            .set_param("host", self.host.as_deref());
        params
    }
}

/// Filters accepted by `GET /flavors[/detail]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlavorListParams {
    /// Only flavors changed since this timestamp.
    pub changes_since: Option<String>,
    /// Minimum disk size in GiB.
    pub min_disk: Option<u32>,
    /// Minimum RAM in MiB.
    pub min_ram: Option<u32>,
    /// Pagination marker.
    pub marker: Option<String>,
    /// Page size.
    pub limit: Option<u32>,
}

impl FlavorListParams {
    /// Renders the filters as query parameters.
    #[must_use]
    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .set_param(CHANGES_SINCE, self.changes_since.as_deref())
            .set_param("minDisk", self.min_disk)
            .set_param("minRam", self.min_ram)
            .set_param("marker", self.marker.as_deref())
            .set_param("limit", self.limit);
        params
    }
}

/// Filters accepted by `GET /images[/detail]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageListParams {
    /// Only images changed since this timestamp.
    pub changes_since: Option<String>,
    /// Server the image was taken from; sent as `server`.
    pub server_name: Option<String>,
    /// Image name.
    pub name: Option<String>,
    /// Image status.
    pub status: Option<String>,
    /// Pagination marker.
    pub marker: Option<String>,
    /// Page size.
    pub limit: Option<u32>,
    /// Image type; sent as `type`.
    pub image_type: Option<String>,
}

impl ImageListParams {
    /// Renders the filters as query parameters.
    #[must_use]
    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .set_param(CHANGES_SINCE, self.changes_since.as_deref())
            .set_param("server", self.server_name.as_deref())
            .set_param("name", self.name.as_deref())
            .set_param("status", self.status.as_deref())
            .set_param("marker", self.marker.as_deref())
            .set_param("limit", self.limit)
            .set_param("type", self.image_type.as_deref());
        params
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// REST path builder for the compute service.
#[derive(Clone)]
pub struct ComputeRestClient {
    /// Verb layer used for every request.
    rest: RestClient,
}

impl ComputeRestClient {
    /// Creates a path builder over the given REST client.
    #[must_use]
    pub const fn new(rest: RestClient) -> Self {
        Self {
            rest,
        }
    }

    // ------------------------------------------------------------------------
    // Generic builders
    // ------------------------------------------------------------------------

    /// Issues `GET /<kind>[/<id>[/<command>]|/<command>]`.
    ///
    /// With an id present, `detail` is dropped in favor of the id. Filters are
    /// only forwarded when no id is addressed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] when a present id is not a
    /// single path segment, or any error from the request.
    pub fn resource_get(
        &self,
        kind: ResourceKind,
        resource_id: &ResourceId,
        command: &str,
        filters: QueryParams,
        success: SuccessCodes,
    ) -> Result<RestResponse, ClientError> {
        let (path, params) = match render_id(kind, resource_id)? {
            Some(id) => {
                let command = if command == DETAIL_COMMAND { "" } else { command };
                (join_path(&[kind.segment(), id.as_str(), command]), QueryParams::new())
            }
            None => (join_path(&[kind.segment(), command]), filters),
        };
        self.rest.get(&path, params, success)
    }

    /// Issues `GET /<kind>/<id>/<subresource>[/<extra_id>]`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] when the id is absent or the
    /// family has no such sub-resource, or any error from the request.
    pub fn subresource_get(
        &self,
        kind: ResourceKind,
        resource_id: &ResourceId,
        subresource: &str,
        extra_id: Option<&str>,
        params: QueryParams,
        success: SuccessCodes,
    ) -> Result<RestResponse, ClientError> {
        let path = subresource_path(kind, resource_id, subresource, extra_id)?;
        self.rest.get(&path, params, success)
    }

    /// Issues `DELETE /<kind>/<id>[/<command>]`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] when the family is read-only or
    /// the id is absent, or any error from the request.
    pub fn resource_delete(
        &self,
        kind: ResourceKind,
        resource_id: &ResourceId,
        command: &str,
        success: SuccessCodes,
    ) -> Result<RestResponse, ClientError> {
        require_writable(kind)?;
        let id = require_id(kind, resource_id)?;
        let path = join_path(&[kind.segment(), id.as_str(), command]);
        self.rest.delete(&path, QueryParams::new(), success)
    }

    /// Issues `DELETE /<kind>/<id>/<subresource>/<value>`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] when the target is not fully
    /// addressed, or any error from the request.
    pub fn subresource_delete(
        &self,
        kind: ResourceKind,
        resource_id: &ResourceId,
        subresource: &str,
        value: &str,
        success: SuccessCodes,
    ) -> Result<RestResponse, ClientError> {
        require_writable(kind)?;
        let path = subresource_path(kind, resource_id, subresource, Some(require_value(value)?))?;
        self.rest.delete(&path, QueryParams::new(), success)
    }

    /// Issues `POST /<kind>[/<id>][/<command>]` with an optional JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] when the family is read-only or
    /// a present id is not a single path segment, or any error from the
    /// request.
    pub fn resource_post(
        &self,
        kind: ResourceKind,
        resource_id: &ResourceId,
        command: &str,
        json_data: Option<&Value>,
        success: SuccessCodes,
    ) -> Result<RestResponse, ClientError> {
        require_writable(kind)?;
        let id = render_id(kind, resource_id)?.unwrap_or_default();
        let path = join_path(&[kind.segment(), id.as_str(), command]);
        self.rest.post(&path, QueryParams::new(), json_data, success)
    }

    /// Issues `PUT /<kind>[/<id>][/<command>]` with an optional JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] when the family is read-only or
    /// a present id is not a single path segment, or any error from the
    /// request.
    pub fn resource_put(
        &self,
        kind: ResourceKind,
        resource_id: &ResourceId,
        command: &str,
        json_data: Option<&Value>,
        success: SuccessCodes,
    ) -> Result<RestResponse, ClientError> {
        require_writable(kind)?;
        let id = render_id(kind, resource_id)?.unwrap_or_default();
        let path = join_path(&[kind.segment(), id.as_str(), command]);
        self.rest.put(&path, QueryParams::new(), json_data, success)
    }

    /// Issues `POST /<kind>/<id>/<subresource>` with an optional JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] when the family is read-only or
    /// the target is not fully addressed, or any error from the request.
    pub fn subresource_post(
        &self,
        kind: ResourceKind,
        resource_id: &ResourceId,
        subresource: &str,
        json_data: Option<&Value>,
        success: SuccessCodes,
    ) -> Result<RestResponse, ClientError> {
        require_writable(kind)?;
        let path = subresource_path(kind, resource_id, subresource, None)?;
        self.rest.post(&path, QueryParams::new(), json_data, success)
    }

    /// Issues `PUT /<kind>/<id>/<subresource>/<value>` with an optional JSON
    /// payload.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] when the family is read-only or
    /// the target is not fully addressed, or any error from the request.
    pub fn subresource_put(
        &self,
        kind: ResourceKind,
        resource_id: &ResourceId,
        subresource: &str,
        value: &str,
        json_data: Option<&Value>,
        success: SuccessCodes,
    ) -> Result<RestResponse, ClientError> {
        require_writable(kind)?;
        let path = subresource_path(kind, resource_id, subresource, Some(require_value(value)?))?;
        self.rest.put(&path, QueryParams::new(), json_data, success)
    }

    // ------------------------------------------------------------------------
    // Servers
    // ------------------------------------------------------------------------

    /// `GET /servers[/<server_id>|/detail]`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn servers_get(
        &self,
        server_id: impl Into<ResourceId>,
        command: &str,
        params: &ServerListParams,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = server_id.into();
        self.resource_get(ResourceKind::Servers, &id, command, params.to_query(), success.into())
    }

    /// `GET /servers/<server_id>/metadata[/<key>]`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn servers_metadata_get(
        &self,
        server_id: impl Into<ResourceId>,
        key: Option<&str>,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = server_id.into();
        self.subresource_get(
            ResourceKind::Servers,
            &id,
            "metadata",
            key,
            QueryParams::new(),
            success.into(),
        )
    }

    /// `GET /servers/<server_id>/ips[/<network_id>]`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn servers_ips_get(
        &self,
        server_id: impl Into<ResourceId>,
        network_id: Option<&str>,
        changes_since: Option<&str>,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = server_id.into();
        let mut params = QueryParams::new();
        params.set_param(CHANGES_SINCE, changes_since);
        self.subresource_get(ResourceKind::Servers, &id, "ips", network_id, params, success.into())
    }

    /// `DELETE /servers/<server_id>[/<command>]`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn servers_delete(
        &self,
        server_id: impl Into<ResourceId>,
        command: &str,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = server_id.into();
        self.resource_delete(ResourceKind::Servers, &id, command, success.into())
    }

    /// `DELETE /servers/<server_id>/metadata/<key>`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn servers_metadata_delete(
        &self,
        server_id: impl Into<ResourceId>,
        key: &str,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = server_id.into();
        self.subresource_delete(ResourceKind::Servers, &id, "metadata", key, success.into())
    }

    /// `POST /servers[/<server_id>][/<command>]`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn servers_post(
        &self,
        server_id: impl Into<ResourceId>,
        command: &str,
        json_data: Option<&Value>,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = server_id.into();
        self.resource_post(ResourceKind::Servers, &id, command, json_data, success.into())
    }

    /// `POST /servers/<server_id>/metadata`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the server is not addressed or the request
    /// fails.
    pub fn servers_metadata_post(
        &self,
        server_id: impl Into<ResourceId>,
        json_data: Option<&Value>,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = server_id.into();
        self.subresource_post(ResourceKind::Servers, &id, "metadata", json_data, success.into())
    }

    /// `PUT /servers/<server_id>/metadata/<key>`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the server or key is not addressed or the
    /// request fails.
    pub fn servers_metadata_put(
        &self,
        server_id: impl Into<ResourceId>,
        key: &str,
        json_data: Option<&Value>,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = server_id.into();
        self.subresource_put(ResourceKind::Servers, &id, "metadata", key, json_data, success.into())
    }

    /// `PUT /servers[/<server_id>][/<command>]`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn servers_put(
        &self,
        server_id: impl Into<ResourceId>,
        command: &str,
        json_data: Option<&Value>,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = server_id.into();
        self.resource_put(ResourceKind::Servers, &id, command, json_data, success.into())
    }

    // ------------------------------------------------------------------------
    // Flavors
    // ------------------------------------------------------------------------

    /// `GET /flavors[/<flavor_id>|/detail]`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn flavors_get(
        &self,
        flavor_id: impl Into<ResourceId>,
        command: &str,
        params: &FlavorListParams,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = flavor_id.into();
        self.resource_get(ResourceKind::Flavors, &id, command, params.to_query(), success.into())
    }

    // ------------------------------------------------------------------------
    // Images
    // ------------------------------------------------------------------------

    /// `GET /images[/<image_id>|/detail]`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn images_get(
        &self,
        image_id: impl Into<ResourceId>,
        command: &str,
        params: &ImageListParams,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = image_id.into();
        self.resource_get(ResourceKind::Images, &id, command, params.to_query(), success.into())
    }

    /// `GET /images/<image_id>/metadata[/<key>]`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn images_metadata_get(
        &self,
        image_id: impl Into<ResourceId>,
        key: Option<&str>,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = image_id.into();
        self.subresource_get(
            ResourceKind::Images,
            &id,
            "metadata",
            key,
            QueryParams::new(),
            success.into(),
        )
    }

    /// `DELETE /images/<image_id>[/<command>]`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn images_delete(
        &self,
        image_id: impl Into<ResourceId>,
        command: &str,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = image_id.into();
        self.resource_delete(ResourceKind::Images, &id, command, success.into())
    }

    /// `DELETE /images/<image_id>/metadata/<key>`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn images_metadata_delete(
        &self,
        image_id: impl Into<ResourceId>,
        key: &str,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = image_id.into();
        self.subresource_delete(ResourceKind::Images, &id, "metadata", key, success.into())
    }

    /// `POST /images[/<image_id>][/<command>]`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn images_post(
        &self,
        image_id: impl Into<ResourceId>,
        command: &str,
        json_data: Option<&Value>,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = image_id.into();
        self.resource_post(ResourceKind::Images, &id, command, json_data, success.into())
    }

    /// `POST /images/<image_id>/metadata`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the image is not addressed or the request
    /// fails.
    pub fn images_metadata_post(
        &self,
        image_id: impl Into<ResourceId>,
        json_data: Option<&Value>,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = image_id.into();
        self.subresource_post(ResourceKind::Images, &id, "metadata", json_data, success.into())
    }

    /// `PUT /images/<image_id>/metadata/<key>`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the image or key is not addressed or the
    /// request fails.
    pub fn images_metadata_put(
        &self,
        image_id: impl Into<ResourceId>,
        key: &str,
        json_data: Option<&Value>,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = image_id.into();
        self.subresource_put(ResourceKind::Images, &id, "metadata", key, json_data, success.into())
    }

    /// `PUT /images[/<image_id>][/<command>]`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn images_put(
        &self,
        image_id: impl Into<ResourceId>,
        command: &str,
        json_data: Option<&Value>,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let id = image_id.into();
        self.resource_put(ResourceKind::Images, &id, command, json_data, success.into())
    }

    // ------------------------------------------------------------------------
    // Floating IPs
    // ------------------------------------------------------------------------

    /// `GET /<tenant_id>/os-floating-ip-pools`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the tenant is empty or the request fails.
    pub fn floating_ip_pools_get(
        &self,
        tenant_id: &str,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let path = join_path(&[require_tenant(tenant_id)?, FLOATING_IP_POOLS_SEGMENT]);
        self.rest.get(&path, QueryParams::new(), success.into())
    }

    /// `GET /<tenant_id>/os-floating-ips[/<ip>]`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the tenant is empty or the request fails.
    pub fn floating_ips_get(
        &self,
        tenant_id: &str,
        ip: Option<&str>,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let path = floating_ips_path(tenant_id, ip)?;
        self.rest.get(&path, QueryParams::new(), success.into())
    }

    /// `POST /<tenant_id>/os-floating-ips[/<ip>]`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the tenant is empty or the request fails.
    pub fn floating_ips_post(
        &self,
        tenant_id: &str,
        json_data: Option<&Value>,
        ip: Option<&str>,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let path = floating_ips_path(tenant_id, ip)?;
        self.rest.post(&path, QueryParams::new(), json_data, success.into())
    }

    /// `DELETE /<tenant_id>/os-floating-ips[/<ip>]`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the tenant is empty or the request fails.
    pub fn floating_ips_delete(
        &self,
        tenant_id: &str,
        ip: Option<&str>,
        success: impl Into<SuccessCodes>,
    ) -> Result<RestResponse, ClientError> {
        let path = floating_ips_path(tenant_id, ip)?;
        self.rest.delete(&path, QueryParams::new(), success.into())
    }

    // ------------------------------------------------------------------------
    // Limits
    // ------------------------------------------------------------------------

    /// `GET /limits`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    pub fn limits_get(&self, success: impl Into<SuccessCodes>) -> Result<RestResponse, ClientError> {
        self.rest.get("/limits", QueryParams::new(), success.into())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Fails unless `value` renders as exactly one non-empty path segment.
fn require_segment<'a>(what: &str, value: &'a str) -> Result<&'a str, ClientError> {
    if value.is_empty() {
        Err(ClientError::InvalidRequest(format!("{what} is required")))
    } else if value.contains('/') || value == "." || value == ".." {
        Err(ClientError::InvalidRequest(format!("{what} is not a single path segment: {value:?}")))
    } else {
        Ok(value)
    }
}

/// Renders a present id, or `None` when the id is absent.
fn render_id(kind: ResourceKind, resource_id: &ResourceId) -> Result<Option<String>, ClientError> {
    if !resource_id.is_present() {
        return Ok(None);
    }
    let id = resource_id.to_string();
    require_segment(&format!("{} id", kind.singular()), &id)?;
    Ok(Some(id))
}

/// Returns the rendered id, failing when it is absent.
pub(crate) fn require_id(
    kind: ResourceKind,
    resource_id: &ResourceId,
) -> Result<String, ClientError> {
    render_id(kind, resource_id)?
        .ok_or_else(|| ClientError::InvalidRequest(format!("{kind} request requires an id")))
}

/// Fails unless a sub-resource value (metadata key) is a single segment.
fn require_value(value: &str) -> Result<&str, ClientError> {
    require_segment("sub-resource key", value)
}

/// Builds `/<kind>/<id>/<subresource>[/<value>]`; an empty value is omitted.
fn subresource_path(
    kind: ResourceKind,
    resource_id: &ResourceId,
    subresource: &str,
    value: Option<&str>,
) -> Result<String, ClientError> {
    require_subresource(kind, subresource)?;
    let id = require_id(kind, resource_id)?;
    let value = value
        .filter(|value| !value.is_empty())
        .map(|value| require_segment(subresource, value))
        .transpose()?
        .unwrap_or_default();
    Ok(join_path(&[kind.segment(), id.as_str(), subresource, value]))
}

/// Fails when `kind` does not accept writes.
fn require_writable(kind: ResourceKind) -> Result<(), ClientError> {
    if kind.descriptor().writable {
        Ok(())
    } else {
        Err(ClientError::InvalidRequest(format!("{kind} are read-only")))
    }
}

/// Fails when `kind` has no `subresource`.
fn require_subresource(kind: ResourceKind, subresource: &str) -> Result<(), ClientError> {
    if kind.has_subresource(subresource) {
        Ok(())
    } else {
        Err(ClientError::InvalidRequest(format!("{kind} have no {subresource} sub-resource")))
    }
}

/// Fails when the tenant id is not a single path segment.
fn require_tenant(tenant_id: &str) -> Result<&str, ClientError> {
    require_segment("floating ip tenant id", tenant_id)
}

/// Builds `/<tenant_id>/os-floating-ips[/<ip>]`.
fn floating_ips_path(tenant_id: &str, ip: Option<&str>) -> Result<String, ClientError> {
    let tenant_id = require_tenant(tenant_id)?;
    let ip = ip
        .filter(|ip| !ip.is_empty())
        .map(|ip| require_segment("floating ip", ip))
        .transpose()?
        .unwrap_or_default();
    Ok(join_path(&[tenant_id, FLOATING_IPS_SEGMENT, ip]))
}
