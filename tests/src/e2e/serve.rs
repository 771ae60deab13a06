//! The HTTP handler, called directly without binding a socket.

use axum::Json;
use axum::body::to_bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use murk_cli::commands::serve::{AppState, ObfuscateRequest, obfuscate_handler};
use murk_tests::{init_tracing, run_lua};
use murk_transform::layers::LayerKind;
use serde_json::Value;

async fn call(code: &str, layers: Option<Vec<LayerKind>>) -> (StatusCode, Value) {
    let state = AppState::new("all", vec![LayerKind::Hex]);
    let request = ObfuscateRequest {
        code: code.to_string(),
        layers,
        seed: None,
    };
    let response: Response = obfuscate_handler(State(state), Json(request)).await;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_obfuscate_endpoint_success() {
    init_tracing();
    let (status, body) = call("local x = 5 print(x + 1)", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], Value::Bool(true));

    let code = body["obfuscated_code"].as_str().unwrap();
    assert_eq!(run_lua(code).unwrap(), vec!["6"]);
}

#[tokio::test]
async fn test_obfuscate_endpoint_request_layers() {
    let (status, body) = call(
        "print('layered')",
        Some(vec![LayerKind::Base64, LayerKind::Symbol]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let code = body["obfuscated_code"].as_str().unwrap();
    assert_eq!(run_lua(code).unwrap(), vec!["layered"]);
}

#[tokio::test]
async fn test_obfuscate_endpoint_parse_error() {
    let (status, body) = call("local = = 5", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "parse error");
    assert!(body["details"].as_str().is_some());
}

#[tokio::test]
async fn test_obfuscate_endpoint_empty_code() {
    let (status, body) = call("   ", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no code provided");
    assert!(body.get("details").is_none());
}
