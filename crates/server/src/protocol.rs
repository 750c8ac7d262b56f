//! JSON-RPC 2.0 envelope and the A2A task shapes carried inside it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use verse_core::PipelineError;

pub const JSONRPC_VERSION: &str = "2.0";
pub const JSONRPC_PARSE_ERROR: i64 = -32700;

pub const METHOD_MESSAGE_SEND: &str = "message/send";
pub const METHOD_EXECUTE: &str = "execute";

/// Loose envelope so that a missing `jsonrpc` or `id` can still be answered
/// with a proper error object.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Value,
}

impl RpcRequest {
    pub fn is_well_formed(&self) -> bool {
        self.jsonrpc.as_deref() == Some(JSONRPC_VERSION)
            && self.id.as_ref().is_some_and(|id| !id.is_null())
    }
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: Value, result: TaskResult) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, result: Some(result), error: None }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, result: None, error: Some(error) }
    }
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSendParams {
    pub message: A2aMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteParams {
    pub messages: Vec<A2aMessage>,
    #[serde(default)]
    pub context_id: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct A2aMessage {
    pub role: String,
    pub parts: Vec<MessagePart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl A2aMessage {
    pub fn agent(text: impl Into<String>, message_id: String, task_id: &str) -> Self {
        Self {
            role: "agent".to_string(),
            parts: vec![MessagePart::text(text)],
            message_id: Some(message_id),
            task_id: Some(task_id.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessagePart {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl MessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        Self { kind: "text".to_string(), text: Some(text.into()), data: None }
    }

    pub fn data(data: Value) -> Self {
        Self { kind: "data".to_string(), text: None, data: Some(data) }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub id: String,
    pub context_id: String,
    pub status: TaskStatus,
    pub artifacts: Vec<Artifact>,
    pub history: Vec<A2aMessage>,
    pub kind: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskStatus {
    pub state: &'static str,
    pub timestamp: String,
    pub message: A2aMessage,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub artifact_id: String,
    pub name: &'static str,
    pub parts: Vec<MessagePart>,
}

/// Text of the newest user message: its first text part that is not blank.
pub fn latest_user_query(messages: &[A2aMessage]) -> Result<String, PipelineError> {
    let message = messages
        .iter()
        .rev()
        .find(|message| message.role == "user")
        .ok_or_else(|| PipelineError::InvalidInput("no user message provided".to_string()))?;

    message
        .parts
        .iter()
        .filter(|part| part.kind == "text")
        .filter_map(|part| part.text.as_deref())
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or_else(|| PipelineError::InvalidInput("no text query found in message".to_string()))
}
