// crates/nimbus-compute/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Recording transport and canned compute payloads.
// Purpose: Give each test a fresh, immutable response script.
// Dependencies: nimbus-compute
// ============================================================================

//! ## Overview
//! [`RecordingTransport`] captures every composed request and answers from a
//! script of canned responses. Each test builds its own fixture, so no
//! response state leaks between test cases.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use nimbus_compute::ClientError;
use nimbus_compute::ComputeClient;
use nimbus_compute::RequestAuditEvent;
use nimbus_compute::RequestAuditSink;
use nimbus_compute::RestRequest;
use nimbus_compute::RestResponse;
use nimbus_compute::Transport;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Recording Transport
// ============================================================================

/// Transport that records requests and replays scripted responses.
///
/// Responses are consumed in order; the last one repeats once the script is
/// exhausted.
pub struct RecordingTransport {
    /// Remaining scripted responses.
    script: Mutex<VecDeque<Result<RestResponse, ClientError>>>,
    /// Requests seen so far.
    requests: Mutex<Vec<RestRequest>>,
}

impl RecordingTransport {
    /// Creates a transport answering with `responses` in order.
    pub fn new(responses: Vec<RestResponse>) -> Arc<Self> {
        Self::scripted(responses.into_iter().map(Ok).collect())
    }

    /// Creates a transport answering with the given results in order.
    pub fn scripted(script: Vec<Result<RestResponse, ClientError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Creates a transport answering every request with one JSON body.
    pub fn replying(status: u16, body: &Value) -> Arc<Self> {
        Self::new(vec![RestResponse::from_json(status, body)])
    }

    /// Returns all recorded requests.
    pub fn requests(&self) -> Vec<RestRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Returns the most recent request.
    pub fn last(&self) -> RestRequest {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }
}

impl Transport for RecordingTransport {
    fn send(&self, request: &RestRequest) -> Result<RestResponse, ClientError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            return script.pop_front().expect("script entry");
        }
        script.front().cloned().unwrap_or_else(|| Ok(RestResponse::empty(200)))
    }
}

// ============================================================================
// SECTION: Recording Audit Sink
// ============================================================================

/// Audit sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    /// Events recorded so far.
    events: Mutex<Vec<RequestAuditEvent>>,
}

impl RecordingAuditSink {
    /// Returns all recorded events.
    pub fn events(&self) -> Vec<RequestAuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl RequestAuditSink for RecordingAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ============================================================================
// SECTION: Client Builders
// ============================================================================

/// Builds a compute client over `transport` with a no-op audit sink.
pub fn client_over(transport: &Arc<RecordingTransport>) -> ComputeClient {
    ComputeClient::new(transport.clone(), Arc::new(nimbus_compute::NoopAuditSink))
}

/// Returns the request body parsed as JSON.
pub fn body_json(request: &RestRequest) -> Option<Value> {
    request.json_body().unwrap()
}

// ============================================================================
// SECTION: Canned Payloads
// ============================================================================

/// Image reference used by server fixtures.
pub const IMAGE_REF: &str = "1m4g3-r3f3r3nc3";
/// Server name used by server fixtures.
pub const VM_NAME: &str = "my new VM";
/// Flavor id used by server fixtures.
pub const FLAVOR_ID: u64 = 42;
/// Server id used by server fixtures.
pub const SERVER_ID: u64 = 31173;

/// Server creation response.
pub fn vm_recv() -> Value {
    json!({"server": {
        "status": "BUILD",
        "updated": "2013-03-01T10:04:00.637152+00:00",
        "hostId": "",
        "name": VM_NAME,
        "imageRef": IMAGE_REF,
        "created": "2013-03-01T10:04:00.087324+00:00",
        "flavorRef": FLAVOR_ID,
        "adminPass": "n0n3sh@11p@55",
        "suspended": false,
        "progress": 0,
        "id": SERVER_ID,
        "metadata": {"os": "debian", "users": "root"}
    }})
}

/// Image details response.
pub fn img_recv() -> Value {
    json!({"image": {
        "status": "ACTIVE",
        "updated": "2013-02-26T11:10:14+00:00",
        "name": "Debian Base",
        "created": "2013-02-26T11:03:29+00:00",
        "progress": 100,
        "id": IMAGE_REF,
        "metadata": {
            "partition_table": "msdos",
            "kernel": "2.6.32",
            "osfamily": "linux",
            "users": "root",
            "gui": "No GUI",
            "sortorder": "1",
            "os": "debian",
            "root_partition": "1",
            "description": "Debian 6.0.7 (Squeeze) Base System"
        }
    }})
}

/// Server listing response.
pub fn vm_list() -> Value {
    json!({"servers": [{"name": "n1", "id": 1}, {"name": "n2", "id": 2}]})
}

/// Flavor listing response.
pub fn flavor_list() -> Value {
    json!({"flavors": [
        {"id": 41, "name": "C1R1024D20"},
        {"id": 42, "name": "C1R1024D40"},
        {"id": 43, "name": "C1R1028D20"}
    ]})
}

/// Image listing response.
pub fn img_list() -> Value {
    json!({"images": [
        {"name": "maelstrom", "id": "0fb03e45-7d5a-4515-bd4e-e6bbf6457f06"},
        {"name": "edx_saas", "id": "1357163d-5fd8-488e-a117-48734c526206"},
        {"name": "Debian_Wheezy_Base", "id": "1f8454f0-8e3e-4b6c-ab8e-5236b728dffe"},
        {"name": "CentOS", "id": "21894b48-c805-4568-ac8b-7d4bb8eb533d"},
        {"name": "Ubuntu Desktop", "id": "37bc522c-c479-4085-bfb9-464f9b9e2e31"}
    ]})
}

/// Floating IP entry shared by floating IP fixtures.
pub fn floating_ip() -> Value {
    json!({
        "fixed_ip": "fip",
        "id": 1,
        "instance_id": "lala",
        "ip": "102.0.0.1",
        "pool": "pisine"
    })
}
