//! End-to-end tests of the downstream transport: `/health` and the SSE
//! streaming RPC, grounded on the teacher's `tests/api_tests.rs`
//! bind-an-ephemeral-port-and-spawn pattern.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use stellar_invocation_stream::api;
use stellar_invocation_stream::codec::xdr::XdrCodec;
use stellar_invocation_stream::metrics::MetricsRegistry;
use stellar_invocation_stream::model::RawLedger;
use stellar_invocation_stream::processor::LedgerProcessor;
use stellar_invocation_stream::protocol23::FeatureGate;
use stellar_invocation_stream::upstream::{InMemoryUpstream, UpstreamFactory, UpstreamSource};
use stellar_invocation_stream::AppState;

/// Hands out the same fixed set of ledgers to every session; enough to
/// drive one pass through the streaming RPC in a test.
struct FixedUpstreamFactory {
    ledgers: Mutex<Vec<RawLedger>>,
}

impl UpstreamFactory for FixedUpstreamFactory {
    fn open(&self, _start_ledger: u32) -> Box<dyn UpstreamSource> {
        let ledgers = self.ledgers.lock().unwrap().clone();
        Box::new(InMemoryUpstream::new(ledgers))
    }
}

async fn start_test_server(ledgers: Vec<RawLedger>) -> String {
    let metrics = Arc::new(MetricsRegistry::new());
    let processor = Arc::new(LedgerProcessor::new(FeatureGate::new(23), Arc::clone(&metrics)));
    let state = Arc::new(AppState {
        codec: Arc::new(XdrCodec::new()),
        processor,
        metrics,
        upstream_factory: Arc::new(FixedUpstreamFactory {
            ledgers: Mutex::new(ledgers),
        }),
    });

    let app = api::router(state.clone()).merge(api::health_router(state, None));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().expect("failed to get addr");
    let base_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    base_url
}

#[tokio::test]
async fn health_endpoint_reports_ok_status() {
    let base_url = start_test_server(Vec::new()).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/health", base_url))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.expect("invalid json body");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn contract_invocation_stream_emits_one_sse_frame() {
    let contract_hash = [5u8; 32];
    let bytes = common::build_contract_call_ledger(500, contract_hash, "swap");
    let base_url = start_test_server(vec![RawLedger {
        sequence: 500,
        bytes,
    }])
    .await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/v1/contract-invocations", base_url))
        .json(&serde_json::json!({}))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), 200);
    let body = resp.text().await.expect("failed to read body");
    assert!(body.contains("contract-invocation"));
    assert!(body.contains("\"swap\""));
}
