use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;
use verse_agent::AgentRuntime;
use verse_core::config::AppConfig;
use verse_telex::{channel_from_config, DeliveryChannel, DeliveryError};

use crate::{a2a, agent_card, health};

pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<AgentRuntime>,
    pub channel: Arc<dyn DeliveryChannel>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("agent runtime initialization failed: {0}")]
    Runtime(String),
    #[error("delivery channel initialization failed: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Builds the runtime and delivery channel from an already validated config.
pub fn bootstrap(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let runtime = AgentRuntime::from_config(&config)
        .map_err(|error| BootstrapError::Runtime(format!("{error:#}")))?;
    let channel = channel_from_config(&config.telex)?;

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        llm_model = %config.llm.model,
        bible_id = %config.bible.bible_id,
        delivery_channel = channel.name(),
        "agent runtime and delivery channel initialized"
    );

    Ok(Application { config, runtime: Arc::new(runtime), channel })
}

impl Application {
    pub fn router(&self) -> Router {
        let health_state = health::HealthState {
            daily_post_time: self.config.schedule.daily_post_time.clone(),
            delivery_channel: self.channel.name(),
        };

        Router::new()
            .merge(a2a::router(self.runtime.clone()))
            .merge(agent_card::router())
            .merge(health::router(health_state))
            .layer(TraceLayer::new_for_http())
    }
}
