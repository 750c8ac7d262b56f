use std::sync::Arc;

use axum::{
    body::Bytes, extract::State, http::StatusCode, response::IntoResponse, routing::post, Json,
    Router,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;
use verse_agent::AgentRuntime;
use verse_core::errors::{
    JSONRPC_INVALID_PARAMS, JSONRPC_INVALID_REQUEST, JSONRPC_METHOD_NOT_FOUND,
};
use verse_core::{InterfaceError, PipelineResult, ResponseClass, VerseRecord};

use crate::protocol::{
    latest_user_query, A2aMessage, Artifact, ExecuteParams, MessagePart, MessageSendParams,
    RpcError, RpcRequest, RpcResponse, TaskResult, TaskStatus, JSONRPC_PARSE_ERROR,
    METHOD_EXECUTE, METHOD_MESSAGE_SEND,
};

#[derive(Clone)]
pub struct A2aState {
    runtime: Arc<AgentRuntime>,
}

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new().route("/a2a", post(handle_rpc)).with_state(A2aState { runtime })
}

/// Identifiers for one request. Created when the request arrives and dropped
/// with the response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationContext {
    pub correlation_id: String,
    pub context_id: String,
    pub task_id: String,
}

impl InvocationContext {
    pub fn new(context_id: Option<String>, task_id: Option<String>) -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            context_id: non_blank(context_id).unwrap_or_else(|| Uuid::new_v4().to_string()),
            task_id: non_blank(task_id).unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

type RpcReply = (StatusCode, Json<RpcResponse>);

pub async fn handle_rpc(State(state): State<A2aState>, body: Bytes) -> impl IntoResponse {
    let request = match serde_json::from_slice::<RpcRequest>(&body) {
        Ok(request) => request,
        Err(error) => {
            warn!(
                event_name = "ingress.a2a.parse_failed",
                error = %error,
                "unreadable request body"
            );
            return rpc_failure(
                StatusCode::BAD_REQUEST,
                Value::Null,
                RpcError::new(JSONRPC_PARSE_ERROR, "Parse error: body is not valid JSON"),
            );
        }
    };

    if !request.is_well_formed() {
        return rpc_failure(
            StatusCode::BAD_REQUEST,
            request.id.unwrap_or(Value::Null),
            RpcError::new(
                JSONRPC_INVALID_REQUEST,
                "Invalid Request: jsonrpc must be '2.0' and id is required",
            ),
        );
    }

    let id = request.id.clone().unwrap_or(Value::Null);
    let method = request.method.as_deref().unwrap_or_default();
    let decoded = match method {
        METHOD_MESSAGE_SEND => serde_json::from_value::<MessageSendParams>(request.params)
            .map(|params| (vec![params.message], InvocationContext::new(None, None))),
        METHOD_EXECUTE => serde_json::from_value::<ExecuteParams>(request.params)
            .map(|params| {
                (params.messages, InvocationContext::new(params.context_id, params.task_id))
            }),
        other => {
            return rpc_failure(
                StatusCode::BAD_REQUEST,
                id,
                RpcError::new(
                    JSONRPC_METHOD_NOT_FOUND,
                    format!(
                        "Method not found: '{other}'; only '{METHOD_MESSAGE_SEND}' and \
                         '{METHOD_EXECUTE}' are supported"
                    ),
                ),
            );
        }
    };

    let (messages, context) = match decoded {
        Ok(decoded) => decoded,
        Err(error) => {
            return rpc_failure(
                StatusCode::BAD_REQUEST,
                id,
                RpcError::new(JSONRPC_INVALID_PARAMS, "Invalid params")
                    .with_data(json!({ "details": error.to_string() })),
            );
        }
    };

    info!(
        event_name = "ingress.a2a.request_received",
        correlation_id = %context.correlation_id,
        context_id = %context.context_id,
        task_id = %context.task_id,
        method,
        message_count = messages.len(),
        "a2a request received"
    );

    match run_pipeline(&state.runtime, messages, &context).await {
        Ok(result) => {
            info!(
                event_name = "ingress.a2a.request_completed",
                correlation_id = %context.correlation_id,
                task_id = %context.task_id,
                "a2a request completed"
            );
            (StatusCode::OK, Json(RpcResponse::success(id, result)))
        }
        Err(failure) => {
            error!(
                event_name = "ingress.a2a.request_failed",
                correlation_id = %failure.correlation_id,
                task_id = %context.task_id,
                rpc_code = failure.rpc_code,
                error = %failure.message,
                "a2a request failed"
            );
            rpc_failure(status_for(failure.class), id, interface_rpc_error(&failure))
        }
    }
}

async fn run_pipeline(
    runtime: &AgentRuntime,
    messages: Vec<A2aMessage>,
    context: &InvocationContext,
) -> Result<TaskResult, InterfaceError> {
    let into_interface = |error: verse_core::PipelineError| {
        error.into_interface(context.correlation_id.clone())
    };

    let query = latest_user_query(&messages).map_err(into_interface)?;
    let outcome = runtime.handle_query(&query).await.map_err(into_interface)?;
    Ok(build_task(outcome, messages, context))
}

pub fn build_task(
    outcome: PipelineResult,
    mut history: Vec<A2aMessage>,
    context: &InvocationContext,
) -> TaskResult {
    let (reply_text, artifact) = match outcome {
        PipelineResult::Verse { record } => (verse_reply_text(&record), verse_artifact(&record)),
        PipelineResult::Chat { reply } => {
            let artifact = Artifact {
                artifact_id: Uuid::new_v4().to_string(),
                name: "chat_response",
                parts: vec![MessagePart::text(reply.clone())],
            };
            (reply, artifact)
        }
    };

    let reply = A2aMessage::agent(reply_text, Uuid::new_v4().to_string(), &context.task_id);
    history.push(reply.clone());

    TaskResult {
        id: context.task_id.clone(),
        context_id: context.context_id.clone(),
        status: TaskStatus {
            state: "completed",
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            message: reply,
        },
        artifacts: vec![artifact],
        history,
        kind: "task",
    }
}

pub fn verse_reply_text(record: &VerseRecord) -> String {
    format!(
        "Here's a verse on '{}':\n\n{}\n{}\n\nReflection: {}",
        record.topic,
        record.reference,
        record.text,
        record.reflection_text()
    )
}

fn verse_artifact(record: &VerseRecord) -> Artifact {
    Artifact {
        artifact_id: Uuid::new_v4().to_string(),
        name: "verse",
        parts: vec![
            MessagePart::text(record.text.clone()),
            MessagePart::data(json!({
                "reference": record.reference,
                "topic": record.topic,
                "reflection": record.reflection_text(),
                "timestamp": record.fetched_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            })),
        ],
    }
}

fn interface_rpc_error(failure: &InterfaceError) -> RpcError {
    RpcError::new(failure.rpc_code, failure.user_message()).with_data(json!({
        "details": failure.message,
        "correlationId": failure.correlation_id,
    }))
}

pub fn status_for(class: ResponseClass) -> StatusCode {
    match class {
        ResponseClass::BadRequest => StatusCode::BAD_REQUEST,
        ResponseClass::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ResponseClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn rpc_failure(status: StatusCode, id: Value, error: RpcError) -> RpcReply {
    (status, Json(RpcResponse::failure(id, error)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use verse_agent::{AgentRuntime, Passage};
    use verse_core::{ResponseClass, VerseRecord};

    use super::{router, status_for, verse_reply_text, InvocationContext};
    use crate::test_support::{FixedSource, ScriptedLlm};

    fn runtime(replies: Vec<Result<&str, &str>>, source: FixedSource) -> Arc<AgentRuntime> {
        Arc::new(AgentRuntime::new(
            Arc::new(ScriptedLlm::with_replies(replies)),
            Arc::new(source),
            10,
        ))
    }

    async fn post_rpc(runtime: Arc<AgentRuntime>, body: String) -> (StatusCode, Value) {
        let response = router(runtime)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/a2a")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .expect("request"),
            )
            .await
            .expect("router responds");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    fn message_send(text: &str) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": "123",
            "method": "message/send",
            "params": {
                "message": {"role": "user", "parts": [{"kind": "text", "text": text}]}
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn message_send_returns_completed_verse_task() {
        let runtime = runtime(
            vec![Ok("love"), Ok("Love is where faith becomes visible.")],
            FixedSource::search_hit(Passage::new("1 John 4:8", "<p>God is love.</p>")),
        );

        let (status, body) = post_rpc(runtime, message_send("Get a verse on love")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], "123");
        let result = &body["result"];
        assert_eq!(result["kind"], "task");
        assert_eq!(result["status"]["state"], "completed");
        assert_eq!(
            result["status"]["message"]["parts"][0]["text"],
            "Here's a verse on 'love':\n\n1 John 4:8\nGod is love.\n\n\
             Reflection: Love is where faith becomes visible."
        );
        assert_eq!(result["artifacts"][0]["name"], "verse");
        assert_eq!(result["artifacts"][0]["parts"][0]["text"], "God is love.");
        assert_eq!(result["artifacts"][0]["parts"][1]["data"]["reference"], "1 John 4:8");
        assert_eq!(result["artifacts"][0]["parts"][1]["data"]["topic"], "love");
        assert_eq!(result["history"].as_array().map(Vec::len), Some(2));
        assert_eq!(result["history"][1]["role"], "agent");
        assert!(result["contextId"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn execute_keeps_caller_ids_and_answers_small_talk() {
        let runtime =
            runtime(vec![Ok("NO_VERSE"), Ok("Good morning to you too!")], FixedSource::failing());
        let body = json!({
            "jsonrpc": "2.0",
            "id": "456",
            "method": "execute",
            "params": {
                "messages": [{"role": "user", "parts": [{"kind": "text", "text": "Good morning"}]}],
                "contextId": "ctx-123",
                "taskId": "task-456"
            }
        });

        let (status, body) = post_rpc(runtime, body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["contextId"], "ctx-123");
        assert_eq!(body["result"]["id"], "task-456");
        assert_eq!(body["result"]["artifacts"][0]["name"], "chat_response");
        let reply = body["result"]["artifacts"][0]["parts"][0]["text"].as_str().unwrap_or_default();
        assert!(reply.starts_with("Good morning to you too!\n\nWould you like me to share"));
        assert_eq!(body["result"]["history"][1]["taskId"], "task-456");
    }

    #[tokio::test]
    async fn wrong_version_is_an_invalid_request() {
        let runtime = runtime(Vec::new(), FixedSource::failing());
        let body = json!({"jsonrpc": "1.0", "id": "1", "method": "message/send"});

        let (status, body) = post_rpc(runtime, body.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], -32600);
        assert_eq!(body["id"], "1");
    }

    #[tokio::test]
    async fn unreadable_body_is_a_parse_error() {
        let (status, body) =
            post_rpc(runtime(Vec::new(), FixedSource::failing()), "{not json".to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], -32700);
        assert_eq!(body["id"], Value::Null);
    }

    #[tokio::test]
    async fn unknown_method_is_reported() {
        let body = json!({"jsonrpc": "2.0", "id": 7, "method": "tasks/cancel", "params": {}});

        let (status, body) =
            post_rpc(runtime(Vec::new(), FixedSource::failing()), body.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], -32601);
        assert_eq!(body["id"], 7);
    }

    #[tokio::test]
    async fn undecodable_params_are_invalid_params() {
        let body = json!({"jsonrpc": "2.0", "id": "1", "method": "message/send", "params": {}});

        let (status, body) =
            post_rpc(runtime(Vec::new(), FixedSource::failing()), body.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], -32602);
        assert!(body["error"]["data"]["details"].is_string());
    }

    #[tokio::test]
    async fn blank_user_text_is_an_input_failure() {
        let (status, body) =
            post_rpc(runtime(Vec::new(), FixedSource::failing()), message_send("   ")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], -32602);
        assert!(body.get("result").is_none());
    }

    #[tokio::test]
    async fn exhausted_fallback_is_service_unavailable() {
        let runtime = runtime(vec![Ok("grace")], FixedSource::failing());

        let (status, body) = post_rpc(runtime, message_send("grace")).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], -32001);
        assert!(body["error"]["data"]["details"]
            .as_str()
            .is_some_and(|details| details.contains("exhausted")));
        assert!(body["error"]["data"]["correlationId"].is_string());
    }

    #[tokio::test]
    async fn classification_outage_is_service_unavailable() {
        let runtime = runtime(vec![Err("model overloaded")], FixedSource::failing());

        let (status, body) = post_rpc(runtime, message_send("love")).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], -32000);
    }

    #[test]
    fn invocation_context_generates_missing_ids() {
        let generated = InvocationContext::new(None, Some(" ".to_string()));
        assert!(!generated.context_id.is_empty());
        assert!(!generated.task_id.trim().is_empty());
        assert_ne!(generated.context_id, generated.task_id);

        let supplied = InvocationContext::new(Some("ctx".to_string()), Some("task".to_string()));
        assert_eq!((supplied.context_id.as_str(), supplied.task_id.as_str()), ("ctx", "task"));
    }

    #[test]
    fn response_classes_map_to_http_status() {
        assert_eq!(status_for(ResponseClass::BadRequest), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ResponseClass::ServiceUnavailable), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(ResponseClass::Internal), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn reply_text_layout() {
        let record = VerseRecord::new("peace", "John 14:27", "Peace I leave with you")
            .with_reflection("Peace is a gift.");
        assert_eq!(
            verse_reply_text(&record),
            "Here's a verse on 'peace':\n\nJohn 14:27\nPeace I leave with you\n\n\
             Reflection: Peace is a gift."
        );
    }
}
