use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};
use verse_agent::AgentRuntime;
use verse_core::{PipelineError, VerseRecord};
use verse_telex::{format_daily_message, DeliveryChannel, DeliveryError};

#[derive(Debug, Error)]
pub enum DailyJobError {
    #[error("daily verse lookup failed: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("daily verse delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Next moment strictly after `now` whose UTC wall clock reads `at`.
pub fn next_run_after(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

pub struct DailyVerseJob {
    runtime: Arc<AgentRuntime>,
    channel: Arc<dyn DeliveryChannel>,
}

impl DailyVerseJob {
    pub fn new(runtime: Arc<AgentRuntime>, channel: Arc<dyn DeliveryChannel>) -> Self {
        Self { runtime, channel }
    }

    pub async fn run_once(&self) -> Result<VerseRecord, DailyJobError> {
        let record = self.runtime.daily_verse().await?;
        self.channel.post(&format_daily_message(&record)).await?;
        Ok(record)
    }
}

/// Runs the job every day at `at` (UTC) until the returned handle is aborted.
/// A failed run is logged and the loop carries on.
pub fn spawn(job: DailyVerseJob, at: NaiveTime) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = next_run_after(now, at);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!(
                event_name = "schedule.daily_verse.waiting",
                next_run = %next.to_rfc3339(),
                wait_secs = wait.as_secs(),
                "daily verse scheduled"
            );
            tokio::time::sleep(wait).await;

            match job.run_once().await {
                Ok(record) => info!(
                    event_name = "schedule.daily_verse.posted",
                    reference = %record.reference,
                    channel = job.channel.name(),
                    "daily verse delivered"
                ),
                Err(err) => error!(
                    event_name = "schedule.daily_verse.failed",
                    error = %err,
                    "daily verse run failed"
                ),
            }
        }
    })
}
