//! Compute client tests for nimbus-compute.
// crates/nimbus-compute/tests/compute_client.rs
// ============================================================================
// Module: Compute Client Tests
// Description: Envelope composition and unwrapping for compute operations.
// Purpose: Validate request payloads, response unwrapping, and error flow.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::sync::Arc;

use nimbus_compute::ClientError;
use nimbus_compute::ComputeClient;
use nimbus_compute::Metadata;
use nimbus_compute::Method;
use nimbus_compute::RequestOutcome;
use nimbus_compute::RestResponse;
use serde_json::Value;
use serde_json::json;

use crate::common::FLAVOR_ID;
use crate::common::IMAGE_REF;
use crate::common::RecordingAuditSink;
use crate::common::RecordingTransport;
use crate::common::SERVER_ID;
use crate::common::VM_NAME;
use crate::common::body_json;
use crate::common::client_over;
use crate::common::flavor_list;
use crate::common::floating_ip;
use crate::common::img_list;
use crate::common::img_recv;
use crate::common::vm_list;
use crate::common::vm_recv;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a transport answering image lookup then server creation.
fn create_server_transport() -> Arc<RecordingTransport> {
    RecordingTransport::new(vec![
        RestResponse::from_json(200, &img_recv()),
        RestResponse::from_json(202, &vm_recv()),
    ])
}

/// Returns the `server` object posted by `create_server`.
fn posted_server(transport: &RecordingTransport) -> Value {
    let request = transport.last();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.path, "/servers");
    body_json(&request).unwrap()["server"].clone()
}

// ============================================================================
// SECTION: Servers
// ============================================================================

#[test]
fn create_server_inherits_image_os_and_users() {
    let transport = create_server_transport();
    let client = client_over(&transport);

    let server = client.create_server(VM_NAME, FLAVOR_ID, IMAGE_REF, None, None).unwrap();
    assert_eq!(Value::Object(server), vm_recv()["server"]);

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].path, format!("/images/{IMAGE_REF}"));
    assert_eq!(
        posted_server(&transport),
        json!({
            "flavorRef": FLAVOR_ID,
            "name": VM_NAME,
            "imageRef": IMAGE_REF,
            "metadata": {"os": "debian", "users": "root"}
        })
    );
}

#[test]
fn create_server_merges_caller_metadata_and_personality() {
    let transport = create_server_transport();
    let client = client_over(&transport);
    let personality = json!([{"path": "/etc/motd", "contents": "aGVsbG8="}]);
    let metadata = Metadata::from([
        ("owner".to_string(), "ops".to_string()),
        ("os".to_string(), "windows".to_string()),
    ]);

    client
        .create_server(VM_NAME, FLAVOR_ID, IMAGE_REF, Some(personality.clone()), Some(metadata))
        .unwrap();

    let server = posted_server(&transport);
    assert_eq!(server["metadata"], json!({"owner": "ops", "os": "debian", "users": "root"}));
    assert_eq!(server["personality"], personality);
}

#[test]
fn create_server_propagates_image_lookup_failure() {
    let transport = RecordingTransport::replying(
        403,
        &json!({"forbidden": {"message": "Access denied", "code": 403}}),
    );
    let client = client_over(&transport);

    let err = client.create_server(VM_NAME, FLAVOR_ID, IMAGE_REF, None, None).unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn create_server_propagates_creation_failure() {
    let fault = json!({"forbidden": {"message": "Quota exceeded", "code": 403}});
    let transport = RecordingTransport::new(vec![
        RestResponse::from_json(200, &img_recv()),
        RestResponse::from_json(403, &fault),
    ]);
    let client = client_over(&transport);

    let err = client.create_server(VM_NAME, FLAVOR_ID, IMAGE_REF, None, None).unwrap_err();
    assert_eq!(
        err,
        ClientError::Status {
            status: 403,
            message: "Quota exceeded".to_string(),
            details: None,
        }
    );
    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].method, Method::Post);
    assert_eq!(requests[1].path, "/servers");
}

#[test]
fn list_servers_selects_detail_command() {
    let transport = RecordingTransport::replying(200, &vm_list());
    let client = client_over(&transport);

    let servers = client.list_servers(false).unwrap();
    assert_eq!(servers.len(), 2);
    assert_eq!(transport.last().path, "/servers");

    client.list_servers(true).unwrap();
    assert_eq!(transport.last().path, "/servers/detail");
}

#[test]
fn server_details_unwrap_server_envelope() {
    let transport = RecordingTransport::replying(200, &vm_recv());
    let client = client_over(&transport);

    let server = client.get_server_details(SERVER_ID).unwrap();
    assert_eq!(server["name"], json!(VM_NAME));
    assert_eq!(transport.last().path, format!("/servers/{SERVER_ID}"));
}

#[test]
fn server_writes_send_expected_envelopes() {
    let transport = RecordingTransport::new(vec![
        RestResponse::empty(204),
        RestResponse::empty(202),
        RestResponse::empty(202),
        RestResponse::empty(202),
        RestResponse::empty(204),
    ]);
    let client = client_over(&transport);

    client.update_server_name(SERVER_ID, "renamed").unwrap();
    let request = transport.last();
    assert_eq!(request.method, Method::Put);
    assert_eq!(body_json(&request), Some(json!({"server": {"name": "renamed"}})));

    client.reboot_server(SERVER_ID, true).unwrap();
    let request = transport.last();
    assert_eq!(request.path, format!("/servers/{SERVER_ID}/action"));
    assert_eq!(body_json(&request), Some(json!({"reboot": {"type": "HARD"}})));

    client.reboot_server(SERVER_ID, false).unwrap();
    assert_eq!(body_json(&transport.last()), Some(json!({"reboot": {"type": "SOFT"}})));

    client.resize_server(SERVER_ID, 43_u64).unwrap();
    assert_eq!(body_json(&transport.last()), Some(json!({"resize": {"flavorRef": 43}})));

    client.delete_server(SERVER_ID).unwrap();
    let request = transport.last();
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.path, format!("/servers/{SERVER_ID}"));
    assert!(request.body.is_none());
}

#[test]
fn delete_server_rejects_unexpected_success_code() {
    let transport = RecordingTransport::new(vec![RestResponse::empty(200)]);
    let client = client_over(&transport);
    let err = client.delete_server(SERVER_ID).unwrap_err();
    assert_eq!(err.status(), Some(200));
}

#[test]
fn server_addresses_unwrap_network_or_addresses() {
    let addresses = json!({"addresses": {"public": [{"addr": "10.0.0.1", "version": 4}]}});
    let transport = RecordingTransport::replying(200, &addresses);
    let client = client_over(&transport);

    let all = client.get_server_addresses(SERVER_ID, None).unwrap();
    assert_eq!(all, addresses["addresses"]);
    assert_eq!(transport.last().path, format!("/servers/{SERVER_ID}/ips"));

    let network = json!({"public": [{"addr": "10.0.0.1", "version": 4}]});
    let transport = RecordingTransport::replying(200, &network);
    let client = client_over(&transport);
    let public = client.get_server_addresses(SERVER_ID, Some("public")).unwrap();
    assert_eq!(public, network["public"]);
    assert_eq!(transport.last().path, format!("/servers/{SERVER_ID}/ips/public"));
}

// ============================================================================
// SECTION: Metadata
// ============================================================================

#[test]
fn server_metadata_uses_meta_for_single_keys() {
    let transport = RecordingTransport::new(vec![
        RestResponse::from_json(201, &json!({"meta": {"k": "v"}})),
        RestResponse::from_json(200, &json!({"meta": {"k": "v"}})),
        RestResponse::from_json(200, &json!({"metadata": {"role": "db", "os": "debian"}})),
    ]);
    let client = client_over(&transport);

    let created = client.create_server_metadata(SERVER_ID, "k", "v").unwrap();
    assert_eq!(Value::Object(created), json!({"k": "v"}));
    let request = transport.last();
    assert_eq!(request.method, Method::Put);
    assert_eq!(request.path, format!("/servers/{SERVER_ID}/metadata/k"));
    assert_eq!(body_json(&request), Some(json!({"meta": {"k": "v"}})));

    let one = client.get_server_metadata(SERVER_ID, Some("k")).unwrap();
    assert_eq!(Value::Object(one), json!({"k": "v"}));
    assert_eq!(transport.last().path, format!("/servers/{SERVER_ID}/metadata/k"));

    let all = client.get_server_metadata(SERVER_ID, None).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(transport.last().path, format!("/servers/{SERVER_ID}/metadata"));
}

#[test]
fn image_metadata_create_and_get_use_meta() {
    let transport = RecordingTransport::new(vec![
        RestResponse::from_json(201, &json!({"meta": {"k": "v"}})),
        RestResponse::from_json(200, &json!({"meta": {"k": "v"}})),
        RestResponse::from_json(200, &json!({"metadata": {"k": "v", "os": "debian"}})),
    ]);
    let client = client_over(&transport);

    let created = client.create_image_metadata(IMAGE_REF, "k", "v").unwrap();
    assert_eq!(Value::Object(created), json!({"k": "v"}));
    let request = transport.last();
    assert_eq!(request.method, Method::Put);
    assert_eq!(request.path, format!("/images/{IMAGE_REF}/metadata/k"));
    assert_eq!(body_json(&request), Some(json!({"meta": {"k": "v"}})));

    let one = client.get_image_metadata(IMAGE_REF, Some("k")).unwrap();
    assert_eq!(Value::Object(one), json!({"k": "v"}));
    let request = transport.last();
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.path, format!("/images/{IMAGE_REF}/metadata/k"));

    let all = client.get_image_metadata(IMAGE_REF, None).unwrap();
    assert_eq!(Value::Object(all), json!({"k": "v", "os": "debian"}));
    assert_eq!(transport.last().path, format!("/images/{IMAGE_REF}/metadata"));
}

#[test]
fn image_metadata_update_and_delete() {
    let transport = RecordingTransport::new(vec![
        RestResponse::from_json(201, &json!({"metadata": {"gui": "KDE", "os": "debian"}})),
        RestResponse::empty(204),
    ]);
    let client = client_over(&transport);
    let update = Metadata::from([("gui".to_string(), "KDE".to_string())]);

    let merged = client.update_image_metadata(IMAGE_REF, &update).unwrap();
    assert_eq!(merged["gui"], json!("KDE"));
    let request = transport.last();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.path, format!("/images/{IMAGE_REF}/metadata"));
    assert_eq!(body_json(&request), Some(json!({"metadata": {"gui": "KDE"}})));

    client.delete_image_metadata(IMAGE_REF, "gui").unwrap();
    let request = transport.last();
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.path, format!("/images/{IMAGE_REF}/metadata/gui"));
}

#[test]
fn missing_envelope_is_a_protocol_error() {
    let transport = RecordingTransport::replying(200, &json!({"unexpected": {}}));
    let client = client_over(&transport);
    let err = client.get_image_metadata(IMAGE_REF, None).unwrap_err();
    assert!(matches!(err, ClientError::Protocol(_)));
}

// ============================================================================
// SECTION: Addressing
// ============================================================================

/// Asserts that `result` is an addressing error.
fn assert_invalid<T: std::fmt::Debug>(result: Result<T, ClientError>, operation: &str) {
    assert!(matches!(result, Err(ClientError::InvalidRequest(_))), "{operation}: {result:?}");
}

#[test]
fn operations_on_existing_entities_require_an_id() {
    let transport = RecordingTransport::replying(200, &json!({}));
    let client = client_over(&transport);
    let update = Metadata::from([("k".to_string(), "v".to_string())]);

    for id in ["", "/", "a/b", ".."] {
        assert_invalid(client.get_server_details(id), "get_server_details");
        assert_invalid(client.update_server_name(id, "renamed"), "update_server_name");
        assert_invalid(client.delete_server(id), "delete_server");
        assert_invalid(client.reboot_server(id, true), "reboot_server");
        assert_invalid(client.resize_server(id, 43_u64), "resize_server");
        assert_invalid(client.get_server_addresses(id, None), "get_server_addresses");
        assert_invalid(client.create_server_metadata(id, "k", "v"), "create_server_metadata");
        assert_invalid(client.get_server_metadata(id, None), "get_server_metadata");
        assert_invalid(client.update_server_metadata(id, &update), "update_server_metadata");
        assert_invalid(client.delete_server_metadata(id, "k"), "delete_server_metadata");
        assert_invalid(client.get_flavor_details(id), "get_flavor_details");
        assert_invalid(client.get_image_details(id), "get_image_details");
        assert_invalid(client.delete_image(id), "delete_image");
        assert_invalid(client.create_image_metadata(id, "k", "v"), "create_image_metadata");
        assert_invalid(client.get_image_metadata(id, None), "get_image_metadata");
        assert_invalid(client.update_image_metadata(id, &update), "update_image_metadata");
        assert_invalid(client.delete_image_metadata(id, "k"), "delete_image_metadata");
        assert_invalid(
            client.create_server(VM_NAME, FLAVOR_ID, id, None, None),
            "create_server",
        );
    }
    assert!(transport.requests().is_empty());
}

#[test]
fn metadata_key_operations_require_a_key() {
    let transport = RecordingTransport::replying(201, &json!({"meta": {}}));
    let client = client_over(&transport);

    for key in ["", "/", "a/b", "."] {
        assert_invalid(client.create_server_metadata(SERVER_ID, key, "v"), "create_server_metadata");
        assert_invalid(client.delete_server_metadata(SERVER_ID, key), "delete_server_metadata");
        assert_invalid(client.create_image_metadata(IMAGE_REF, key, "v"), "create_image_metadata");
        assert_invalid(client.delete_image_metadata(IMAGE_REF, key), "delete_image_metadata");
    }
    assert!(transport.requests().is_empty());
}

#[test]
fn numeric_zero_still_addresses_an_entity() {
    let transport = RecordingTransport::replying(202, &json!({}));
    let client = client_over(&transport);
    client.reboot_server(0_u64, false).unwrap();
    assert_eq!(transport.last().path, "/servers/0/action");
}

// ============================================================================
// SECTION: Flavors and Images
// ============================================================================

#[test]
fn flavors_list_and_details() {
    let transport = RecordingTransport::new(vec![
        RestResponse::from_json(200, &flavor_list()),
        RestResponse::from_json(200, &json!({"flavor": {"id": 41, "ram": 1024}})),
    ]);
    let client = client_over(&transport);

    let flavors = client.list_flavors(true).unwrap();
    assert_eq!(flavors.len(), 3);
    assert_eq!(transport.last().path, "/flavors/detail");

    let flavor = client.get_flavor_details(41_u64).unwrap();
    assert_eq!(flavor["ram"], json!(1024));
    assert_eq!(transport.last().path, "/flavors/41");
}

#[test]
fn images_list_details_and_delete() {
    let transport = RecordingTransport::new(vec![
        RestResponse::from_json(200, &img_list()),
        RestResponse::from_json(200, &img_recv()),
        RestResponse::empty(204),
    ]);
    let client = client_over(&transport);

    assert_eq!(client.list_images(false).unwrap().len(), 5);
    assert_eq!(transport.last().path, "/images");

    let image = client.get_image_details(IMAGE_REF).unwrap();
    assert_eq!(image["metadata"]["os"], json!("debian"));

    client.delete_image(IMAGE_REF).unwrap();
    assert_eq!(transport.last().method, Method::Delete);
    assert_eq!(transport.last().path, format!("/images/{IMAGE_REF}"));
}

// ============================================================================
// SECTION: Floating IPs
// ============================================================================

#[test]
fn alloc_floating_ip_sends_pool_only_when_named() {
    let reply = json!({"floating_ip": floating_ip()});
    let transport = RecordingTransport::replying(200, &reply);
    let client = client_over(&transport);

    let allocated = client.alloc_floating_ip("tenant1", Some("pisine")).unwrap();
    assert_eq!(Value::Object(allocated), floating_ip());
    let request = transport.last();
    assert_eq!(request.path, "/tenant1/os-floating-ips");
    assert_eq!(body_json(&request), Some(json!({"pool": "pisine"})));

    client.alloc_floating_ip("tenant1", None).unwrap();
    let request = transport.last();
    assert!(request.body.is_none());
    assert!(request.header("Content-Type").is_none());

    client.alloc_floating_ip("tenant1", Some("")).unwrap();
    assert!(transport.last().body.is_none());
}

#[test]
fn alloc_floating_ip_accepts_202() {
    let transport = RecordingTransport::replying(202, &json!({"floating_ip": floating_ip()}));
    let client = client_over(&transport);
    assert!(client.alloc_floating_ip("tenant1", None).is_ok());
}

#[test]
fn get_floating_ip_returns_unfiltered_list() {
    let other = json!({"id": 2, "ip": "102.0.0.2", "pool": "pisine"});
    let reply = json!({"floating_ips": [floating_ip(), other]});
    let transport = RecordingTransport::replying(200, &reply);
    let client = client_over(&transport);

    let ips = client.get_floating_ip("tenant1", Some("102.0.0.1")).unwrap();
    assert_eq!(ips.len(), 2);
    assert_eq!(transport.last().path, "/tenant1/os-floating-ips/102.0.0.1");
}

#[test]
fn floating_ip_documents_are_returned_raw() {
    let pools = json!({"floating_ip_pools": [{"name": "pisine"}]});
    let transport = RecordingTransport::replying(200, &pools);
    let client = client_over(&transport);

    assert_eq!(client.get_floating_ip_pools("tenant1").unwrap(), pools);
    assert_eq!(transport.last().path, "/tenant1/os-floating-ip-pools");

    assert_eq!(client.get_floating_ips("tenant1").unwrap(), pools);
    assert_eq!(transport.last().path, "/tenant1/os-floating-ips");
}

#[test]
fn delete_floating_ip_returns_headers() {
    let transport = RecordingTransport::new(vec![
        RestResponse::empty(202).with_header("x-request-id", "req-1"),
    ]);
    let client = client_over(&transport);

    let headers = client.delete_floating_ip("t1", None).unwrap();
    assert_eq!(headers.get("x-request-id").map(String::as_str), Some("req-1"));
    let request = transport.last();
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.path, "/t1/os-floating-ips");

    client.delete_floating_ip("t1", Some("102.0.0.1")).unwrap();
    assert_eq!(transport.last().path, "/t1/os-floating-ips/102.0.0.1");
}

#[test]
fn floating_ip_calls_need_a_tenant() {
    let transport = RecordingTransport::replying(200, &json!({}));
    let client = client_over(&transport);
    assert!(matches!(client.get_floating_ips(""), Err(ClientError::InvalidRequest(_))));
    assert!(transport.requests().is_empty());
}

// ============================================================================
// SECTION: Limits
// ============================================================================

#[test]
fn limits_unwrap_limits_envelope() {
    let reply = json!({"limits": {"absolute": {"maxTotalInstances": 10}, "rate": []}});
    let transport = RecordingTransport::replying(200, &reply);
    let client = client_over(&transport);
    let limits = client.get_limits().unwrap();
    assert_eq!(limits["absolute"]["maxTotalInstances"], json!(10));
}

// ============================================================================
// SECTION: Error Flow and Audit
// ============================================================================

#[test]
fn transport_errors_propagate_unchanged() {
    let transport = RecordingTransport::scripted(vec![Err(ClientError::Transport(
        "connection refused".to_string(),
    ))]);
    let client = client_over(&transport);
    let err = client.list_flavors(false).unwrap_err();
    assert_eq!(err, ClientError::Transport("connection refused".to_string()));
}

#[test]
fn every_request_emits_one_audit_event() {
    let transport = RecordingTransport::scripted(vec![
        Ok(RestResponse::from_json(200, &vm_list())),
        Ok(RestResponse::from_json(
            404,
            &json!({"itemNotFound": {"message": "missing", "code": 404}}),
        )),
        Err(ClientError::Transport("reset".to_string())),
    ]);
    let audit = Arc::new(RecordingAuditSink::default());
    let client = ComputeClient::new(transport.clone(), audit.clone());

    client.list_servers(true).unwrap();
    assert!(client.get_server_details(9_u64).is_err());
    assert!(client.delete_server(9_u64).is_err());

    let events = audit.events();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|event| event.event == "compute_request"));

    assert_eq!(events[0].method, Method::Get);
    assert_eq!(events[0].path, "/servers/detail");
    assert_eq!(events[0].status, Some(200));
    assert_eq!(events[0].outcome, RequestOutcome::Success);
    assert!(events[0].response_bytes > 0);

    assert_eq!(events[1].status, Some(404));
    assert_eq!(events[1].outcome, RequestOutcome::StatusError);
    assert_eq!(events[1].error_kind, Some("status"));
    let fault = json!({"itemNotFound": {"message": "missing", "code": 404}});
    assert_eq!(events[1].response_bytes, serde_json::to_vec(&fault).unwrap().len());

    assert_eq!(events[2].method, Method::Delete);
    assert_eq!(events[2].status, None);
    assert_eq!(events[2].outcome, RequestOutcome::TransportError);
    assert_eq!(events[2].error_kind, Some("transport"));
}
