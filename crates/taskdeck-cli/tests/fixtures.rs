//! Shared fixtures for integration tests: canned REST bodies and SSE
//! stream responses served through wiremock.

#![allow(dead_code)]

use serde_json::{Value, json};
use wiremock::ResponseTemplate;

// SSE bodies loaded at compile time
pub const CHAT_SSE: &str = include_str!("fixtures/chat_response.sse");
pub const EXECUTION_SSE: &str = include_str!("fixtures/execution_response.sse");
pub const SUMMARIZE_SSE: &str = include_str!("fixtures/summarize_response.sse");
pub const PAUSED_SSE: &str = include_str!("fixtures/paused_response.sse");

/// Wraps an SSE body in a streaming response.
pub fn sse_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body.to_string())
}

/// A session row as the list/create endpoints return it.
pub fn session_json(id: &str, title: &str, status: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "status": status,
        "createdAt": "2025-01-01T00:00:00Z",
        "updatedAt": "2025-01-01T00:05:00Z"
    })
}

/// A task row in REST (camelCase) spelling.
pub fn task_json(id: &str, title: &str, status: &str, order: u32) -> Value {
    json!({
        "id": id,
        "sessionId": "s-1",
        "title": title,
        "description": null,
        "status": status,
        "result": null,
        "order": order,
        "createdAt": "2025-01-01T00:01:00Z",
        "updatedAt": "2025-01-01T00:01:00Z"
    })
}

/// A full session detail body.
pub fn detail_json(
    id: &str,
    title: &str,
    status: &str,
    tasks: Vec<Value>,
    messages: Vec<Value>,
) -> Value {
    let mut detail = session_json(id, title, status);
    detail["tasks"] = json!(tasks);
    detail["messages"] = json!(messages);
    detail["artifacts"] = json!([]);
    detail
}

pub fn message_json(role: &str, content: &str) -> Value {
    json!({ "role": role, "content": content })
}

pub fn execution_log_json(id: &str, task_id: Option<&str>, event_type: &str, data: Value) -> Value {
    json!({
        "id": id,
        "sessionId": "s-1",
        "taskId": task_id,
        "eventType": event_type,
        "eventData": data,
        "createdAt": "2025-01-01T00:02:00Z"
    })
}

pub fn artifact_json(id: &str, name: &str, artifact_type: &str) -> Value {
    json!({
        "id": id,
        "sessionId": "s-1",
        "taskId": "t-1",
        "name": name,
        "type": artifact_type,
        "createdAt": "2025-01-01T00:03:00Z"
    })
}

/// `{"detail": ...}` error body with the given status.
pub fn error_response(status: u16, detail: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "detail": detail }))
}

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}
