// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MCP sessions over the test harness, through both transports.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use diagrammer_core::{DiagrammerError, RenderOutcome};
use diagrammer_mcp_server::{McpServer, http, stdio};
use diagrammer_test_utils::mock_renderer::MOCK_SVG;
use diagrammer_test_utils::{McpTestClient, MockRenderer, TestHarness};
use futures::StreamExt;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const INVALID_PARAMS: i64 = -32602;
const RESOURCE_NOT_FOUND: i64 = -32002;

struct Session {
    client: McpTestClient,
    cancel: CancellationToken,
    task: JoinHandle<Result<(), DiagrammerError>>,
}

/// Starts a stdio-style session over an in-memory pipe and initializes it.
async fn session(harness: &TestHarness) -> (Session, Value) {
    let (client_end, server_end) = tokio::io::duplex(1 << 16);
    let server = McpServer::new(harness.registry.clone(), harness.store.clone());
    let cancel = CancellationToken::new();
    let task = tokio::spawn(stdio::serve_transport(
        server,
        tokio::io::split(server_end),
        cancel.clone(),
    ));

    let mut client = McpTestClient::new(client_end);
    let init = tokio::time::timeout(Duration::from_secs(5), client.initialize())
        .await
        .unwrap()
        .unwrap();
    (Session { client, cancel, task }, init)
}

async fn call(session: &mut Session, id: u64, method: &str, params: Value) -> Value {
    tokio::time::timeout(Duration::from_secs(5), session.client.request(id, method, params))
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn initialize_advertises_tools_resources_and_prompts() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (mut session, init) = session(&harness).await;

    let result = &init["result"];
    assert_eq!(result["serverInfo"]["name"], "diagrammer");
    assert!(result["capabilities"]["tools"].is_object());
    assert!(result["capabilities"]["resources"].is_object());
    assert!(result["capabilities"]["prompts"].is_object());

    let pong = call(&mut session, 1, "ping", json!({})).await;
    assert_eq!(pong["result"], json!({}));
}

#[tokio::test]
async fn tools_list_exposes_three_tools() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (mut session, _) = session(&harness).await;

    let resp = call(&mut session, 1, "tools/list", json!({})).await;
    let tools = resp["result"]["tools"].as_array().unwrap().clone();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["generate_diagram", "list_diagram_types", "validate_syntax"]);
    assert!(tools.iter().all(|t| t["inputSchema"].is_object()));
}

#[tokio::test]
async fn tools_call_generate_then_read_resource() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (mut session, _) = session(&harness).await;

    let args = json!({ "description": "graph TD; A-->B" });
    let resp = call(
        &mut session,
        1,
        "tools/call",
        json!({ "name": "generate_diagram", "arguments": args }),
    )
    .await;
    let result = &resp["result"];
    assert_ne!(result["isError"], true);
    assert_eq!(result["content"][0]["type"], "text");
    let file_name = result["structuredContent"]["file_name"].as_str().unwrap().to_string();
    let uri = format!("diagram://{file_name}");

    let resp = call(&mut session, 2, "resources/list", json!({})).await;
    let resources = resp["result"]["resources"].as_array().unwrap().clone();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0]["uri"], uri);
    assert_eq!(resources[0]["mimeType"], "image/svg+xml");

    let resp = call(&mut session, 3, "resources/read", json!({ "uri": uri })).await;
    let contents = &resp["result"]["contents"][0];
    assert_eq!(contents["mimeType"], "image/svg+xml");
    let bytes = BASE64.decode(contents["blob"].as_str().unwrap()).unwrap();
    assert_eq!(bytes, MOCK_SVG);
}

#[tokio::test]
async fn syntax_failure_is_tool_error_not_rpc_error() {
    let harness = TestHarness::builder()
        .with_outcomes(vec![RenderOutcome::SyntaxFailure {
            message: "Parse error on line 1".into(),
            attempt: 1,
        }])
        .with_max_attempts(1)
        .build()
        .await
        .unwrap();
    let (mut session, _) = session(&harness).await;

    let args = json!({ "description": "graph TD; A-->" });
    let resp = call(
        &mut session,
        1,
        "tools/call",
        json!({ "name": "generate_diagram", "arguments": args }),
    )
    .await;
    assert!(resp.get("error").is_none(), "{resp}");
    assert_eq!(resp["result"]["isError"], true);
    assert_eq!(resp["result"]["structuredContent"]["code"], "syntax_error");
}

#[tokio::test]
async fn unknown_tool_is_invalid_params() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (mut session, _) = session(&harness).await;

    let resp = call(&mut session, 1, "tools/call", json!({ "name": "nope" })).await;
    assert_eq!(resp["error"]["code"], INVALID_PARAMS);
}

#[tokio::test]
async fn reading_unknown_or_traversal_resource_fails() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (mut session, _) = session(&harness).await;

    let missing = [
        "diagram://../../etc/passwd",
        "diagram://diagram_1_00000000000000000000000000000000.svg",
    ];
    for (id, uri) in (1..).zip(missing) {
        let resp = call(&mut session, id, "resources/read", json!({ "uri": uri })).await;
        assert_eq!(resp["error"]["code"], RESOURCE_NOT_FOUND, "{uri}");
        assert_eq!(resp["error"]["data"]["uri"], uri);
    }

    let params = json!({ "uri": "file:///etc/passwd" });
    let resp = call(&mut session, 9, "resources/read", params).await;
    assert_eq!(resp["error"]["code"], INVALID_PARAMS);
}

#[tokio::test]
async fn selection_guide_prompt_is_listed_and_served() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (mut session, _) = session(&harness).await;

    let resp = call(&mut session, 1, "prompts/list", json!({})).await;
    let prompts = resp["result"]["prompts"].as_array().unwrap().clone();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0]["name"], "diagram_selection_guide");

    let resp = call(
        &mut session,
        2,
        "prompts/get",
        json!({ "name": "diagram_selection_guide" }),
    )
    .await;
    let message = &resp["result"]["messages"][0];
    assert_eq!(message["role"], "user");
    assert_eq!(message["content"]["type"], "text");
    assert!(message["content"]["text"].as_str().unwrap().contains("sequenceDiagram"));

    let resp = call(&mut session, 3, "prompts/get", json!({ "name": "nope" })).await;
    assert_eq!(resp["error"]["code"], INVALID_PARAMS);
}

#[tokio::test]
async fn slow_render_does_not_block_later_requests() {
    let harness = TestHarness::builder()
        .with_renderer(MockRenderer::new().with_delay(Duration::from_millis(500)))
        .build()
        .await
        .unwrap();
    let (mut session, _) = session(&harness).await;

    let args = json!({ "description": "graph TD; A-->B" });
    session
        .client
        .send(10, "tools/call", json!({ "name": "generate_diagram", "arguments": args }))
        .await
        .unwrap();
    session.client.send(11, "ping", json!({})).await.unwrap();

    let first = tokio::time::timeout(Duration::from_secs(5), session.client.next_message())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first["id"], 11, "ping should be answered while the render sleeps");
    assert_eq!(first["result"], json!({}));

    let second = tokio::time::timeout(Duration::from_secs(5), session.client.next_message())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second["id"], 10);
    assert_eq!(second["result"]["structuredContent"]["success"], true);
}

#[tokio::test]
async fn transport_stops_on_cancel() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (session, _) = session(&harness).await;

    session.cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), session.task)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn transport_stops_on_cancel_before_initialize() {
    let harness = TestHarness::builder().build().await.unwrap();
    let (_client_end, server_end) = tokio::io::duplex(1024);
    let server = McpServer::new(harness.registry.clone(), harness.store.clone());
    let cancel = CancellationToken::new();
    let task = tokio::spawn(stdio::serve_transport(
        server,
        tokio::io::split(server_end),
        cancel.clone(),
    ));

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    assert!(result.is_ok());
}

fn initialize_request(token: Option<&str>) -> Request<Body> {
    let body = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-03-26",
            "capabilities": {},
            "clientInfo": { "name": "diagrammer-tests", "version": "0.0.0" }
        }
    });
    let mut req = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::HOST, "localhost")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/json, text/event-stream");
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    req.body(Body::from(body.to_string())).unwrap()
}

/// Reads streamed body frames until `needle` shows up.
async fn read_until(body: Body, needle: &str) -> String {
    let mut frames = body.into_data_stream();
    let mut text = String::new();
    let read = async {
        while let Some(frame) = frames.next().await {
            text.push_str(&String::from_utf8_lossy(&frame.unwrap()));
            if text.contains(needle) {
                break;
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), read).await.unwrap();
    text
}

#[tokio::test]
async fn http_transport_initializes_a_session() {
    let harness = TestHarness::builder().build().await.unwrap();
    let server = McpServer::new(harness.registry.clone(), harness.store.clone());
    let app = http::router(server, harness.token.clone());

    let resp = app.oneshot(initialize_request(None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let text = read_until(resp.into_body(), "serverInfo").await;
    assert!(text.contains("\"diagrammer\""), "{text}");
    assert!(text.contains("\"prompts\""), "{text}");
}

#[tokio::test]
async fn http_transport_requires_token_when_enabled() {
    let harness = TestHarness::builder().with_token("s3cret").build().await.unwrap();
    let server = McpServer::new(harness.registry.clone(), harness.store.clone());
    let app = http::router(server, harness.token.clone());

    let resp = app.clone().oneshot(initialize_request(None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.clone().oneshot(initialize_request(Some("wrong"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.oneshot(initialize_request(Some("s3cret"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let text = read_until(resp.into_body(), "serverInfo").await;
    assert!(text.contains("serverInfo"), "{text}");
}
