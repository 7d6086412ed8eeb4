//! Gas Simulator Integration Tests
//!
//! Runs `eth_estimateGas` against a fake JSON-RPC node served by axum on
//! an ephemeral local port.

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use wallet_guard::models::config::SimulatorConfig;
use wallet_guard::models::types::TransactionRequest;
use wallet_guard::{
    Action, ErrorCode, GasEstimator, GuardAnalyzer, GuardSettings, GuardState, Request,
    RpcGasSimulator, StaticSettings,
};

async fn fake_node() -> SocketAddr {
    async fn ok(Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(body["method"], "eth_estimateGas");
        Json(json!({ "jsonrpc": "2.0", "id": body["id"], "result": "0x5208" }))
    }
    async fn high(Json(body): Json<Value>) -> Json<Value> {
        Json(json!({ "jsonrpc": "2.0", "id": body["id"], "result": "0x2dc6c0" }))
    }
    async fn rpc_error(Json(body): Json<Value>) -> Json<Value> {
        Json(json!({
            "jsonrpc": "2.0",
            "id": body["id"],
            "error": { "code": -32000, "message": "execution reverted" }
        }))
    }
    async fn server_error() -> (StatusCode, &'static str) {
        (StatusCode::INTERNAL_SERVER_ERROR, "boom")
    }
    async fn no_result(Json(body): Json<Value>) -> Json<Value> {
        Json(json!({ "jsonrpc": "2.0", "id": body["id"] }))
    }
    async fn slow(Json(body): Json<Value>) -> Json<Value> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Json(json!({ "jsonrpc": "2.0", "id": body["id"], "result": "0x1" }))
    }

    let app = Router::new()
        .route("/ok", post(ok))
        .route("/high", post(high))
        .route("/error", post(rpc_error))
        .route("/status", post(server_error))
        .route("/empty", post(no_result))
        .route("/slow", post(slow));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn simulator() -> RpcGasSimulator {
    RpcGasSimulator::new(SimulatorConfig {
        rpc_timeout: Duration::from_millis(300),
        high_gas_threshold: 1_000_000,
    })
    .unwrap()
}

fn tx() -> TransactionRequest {
    TransactionRequest {
        to: Some("0x1111111111111111111111111111111111111111".into()),
        data: Some("0x".into()),
        value: Some("0x0".into()),
        from: None,
    }
}

#[tokio::test]
async fn test_estimate_success() {
    let addr = fake_node().await;
    let sim = simulator();

    let gas = sim.estimate_gas(&tx(), &format!("http://{}/ok", addr)).await.unwrap();
    assert_eq!(gas, 21_000);

    let outcome = sim.simulate(&tx(), &format!("http://{}/ok", addr)).await;
    assert!(outcome.ok);
    assert_eq!(outcome.gas, Some(21_000));
    assert!(!outcome.is_high_gas());
}

#[tokio::test]
async fn test_high_gas() {
    let addr = fake_node().await;
    let outcome = simulator().simulate(&tx(), &format!("http://{}/high", addr)).await;
    assert!(!outcome.ok);
    assert!(outcome.is_high_gas());
    assert_eq!(outcome.gas, Some(3_000_000));
}

#[tokio::test]
async fn test_failures_map_to_codes() {
    let addr = fake_node().await;
    let sim = simulator();

    let err = sim.estimate_gas(&tx(), &format!("http://{}/error", addr)).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::RpcError);
    assert!(err.message.contains("execution reverted"));

    let err = sim.estimate_gas(&tx(), &format!("http://{}/status", addr)).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::RpcHttpStatus);

    let err = sim.estimate_gas(&tx(), &format!("http://{}/empty", addr)).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::RpcInvalidResponse);

    let err = sim.estimate_gas(&tx(), &format!("http://{}/slow", addr)).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::RpcTimeout);

    for path in ["error", "status", "empty", "slow"] {
        let outcome = sim.simulate(&tx(), &format!("http://{}/{}", addr, path)).await;
        assert!(!outcome.ok, "{} should fail", path);
        assert!(!outcome.is_high_gas());
    }
}

#[tokio::test]
async fn test_reverting_simulation_raises_score() {
    let addr = fake_node().await;
    let analyzer = GuardAnalyzer::new(
        Arc::new(StaticSettings::new(GuardSettings {
            rpc_url: Some(format!("http://{}/error", addr)),
            ..GuardSettings::default()
        })),
        Arc::new(GuardState::default()),
    )
    .with_simulator(Arc::new(simulator()), Duration::from_secs(1));

    let request = Request::from_call("eth_sendTransaction", &[json!(tx())]).unwrap();
    let analysis = analyzer.analyze(&request).await.unwrap();

    assert!(analysis.features.sim_failed);
    assert!(!analysis.features.sim_high_gas);
    let assessment = analysis.assessment.unwrap();
    assert_eq!(assessment.score, 30);
    assert!(assessment
        .reasons
        .contains(&"simulation failure (possible revert)".to_string()));
    // 30 is low under default sensitivity
    assert_eq!(analysis.verdict.action, Action::Allow);
}
