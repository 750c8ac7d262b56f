use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

#[derive(Clone, Debug)]
pub struct HealthState {
    pub daily_post_time: Option<String>,
    pub delivery_channel: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub agent: &'static str,
    pub scheduler: HealthCheck,
    pub delivery: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Always 200: a disabled scheduler or log-only delivery is a configuration
/// choice, not an outage.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let scheduler = match &state.daily_post_time {
        Some(time) => {
            HealthCheck { status: "scheduled", detail: format!("daily verse posts at {time} UTC") }
        }
        None => HealthCheck {
            status: "disabled",
            detail: "schedule.daily_post_time is not set".to_string(),
        },
    };

    let delivery = match state.delivery_channel {
        "log_only" => HealthCheck {
            status: "log_only",
            detail: "telex.webhook_hook_id is not set; daily verses are logged".to_string(),
        },
        channel => HealthCheck { status: "ready", detail: format!("{channel} channel configured") },
    };

    let payload = HealthResponse {
        status: "healthy",
        agent: "bible-verse",
        scheduler,
        delivery,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}
