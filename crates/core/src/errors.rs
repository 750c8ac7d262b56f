use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Classification,
    Conversation,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Classification => "classification",
            Self::Conversation => "conversation",
        })
    }
}

/// Every way a pipeline invocation can fail. Reflection failures never show up
/// here because they are absorbed into a templated sentence.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("text generation failed during {stage}: {message}")]
    Generation { stage: PipelineStage, message: String },
    #[error("verse lookup exhausted every fallback: {}", .attempts.join("; "))]
    FallbackExhausted { attempts: Vec<String> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    InvalidInput,
    UpstreamUnavailable,
    FallbackExhausted,
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidInput(_) => FailureKind::InvalidInput,
            Self::Generation { .. } => FailureKind::UpstreamUnavailable,
            Self::FallbackExhausted { .. } => FailureKind::FallbackExhausted,
        }
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let route = FailureRoute::for_kind(self.kind());
        InterfaceError {
            class: route.class,
            rpc_code: route.rpc_code,
            message: self.to_string(),
            correlation_id: correlation_id.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseClass {
    BadRequest,
    ServiceUnavailable,
    Internal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FailureRoute {
    pub kind: FailureKind,
    pub class: ResponseClass,
    pub rpc_code: i64,
}

pub const JSONRPC_INVALID_REQUEST: i64 = -32600;
pub const JSONRPC_METHOD_NOT_FOUND: i64 = -32601;
pub const JSONRPC_INVALID_PARAMS: i64 = -32602;
pub const JSONRPC_INTERNAL_ERROR: i64 = -32603;
pub const JSONRPC_UPSTREAM_UNAVAILABLE: i64 = -32000;
pub const JSONRPC_FALLBACK_EXHAUSTED: i64 = -32001;

/// Boundary mapping for each failure kind.
pub const FAILURE_ROUTES: [FailureRoute; 3] = [
    FailureRoute {
        kind: FailureKind::InvalidInput,
        class: ResponseClass::BadRequest,
        rpc_code: JSONRPC_INVALID_PARAMS,
    },
    FailureRoute {
        kind: FailureKind::UpstreamUnavailable,
        class: ResponseClass::ServiceUnavailable,
        rpc_code: JSONRPC_UPSTREAM_UNAVAILABLE,
    },
    FailureRoute {
        kind: FailureKind::FallbackExhausted,
        class: ResponseClass::ServiceUnavailable,
        rpc_code: JSONRPC_FALLBACK_EXHAUSTED,
    },
];

impl FailureRoute {
    pub fn for_kind(kind: FailureKind) -> Self {
        FAILURE_ROUTES.iter().copied().find(|route| route.kind == kind).unwrap_or(FailureRoute {
            kind,
            class: ResponseClass::Internal,
            rpc_code: JSONRPC_INTERNAL_ERROR,
        })
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct InterfaceError {
    pub class: ResponseClass,
    pub rpc_code: i64,
    pub message: String,
    pub correlation_id: String,
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self.class {
            ResponseClass::BadRequest => {
                "The request could not be processed. Send a text message and try again."
            }
            ResponseClass::ServiceUnavailable => {
                "Scripture lookup is temporarily unavailable. Please retry shortly."
            }
            ResponseClass::Internal => "An unexpected internal error occurred.",
        }
    }
}
