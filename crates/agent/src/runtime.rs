use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use verse_core::config::AppConfig;
use verse_core::{Intent, PipelineError, PipelineResult, Query, VerseRecord};

use crate::content::{ApiBibleSource, ContentSource};
use crate::conversation::ConversationResponder;
use crate::fulfillment::VerseFulfillment;
use crate::llm::{GeminiClient, LlmClient};
use crate::reflection::ReflectionWriter;
use crate::resolver::IntentResolver;

/// Topic recorded on scheduled daily verses.
pub const DAILY_TOPIC: &str = "daily";

/// One query in, one `PipelineResult` out. Holds no per-invocation state, so a
/// single runtime is shared across concurrent requests.
pub struct AgentRuntime {
    resolver: IntentResolver,
    fulfillment: VerseFulfillment,
    reflection: ReflectionWriter,
    conversation: ConversationResponder,
}

impl AgentRuntime {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        source: Arc<dyn ContentSource>,
        search_limit: u32,
    ) -> Self {
        Self {
            resolver: IntentResolver::new(llm.clone()),
            fulfillment: VerseFulfillment::new(source, search_limit),
            reflection: ReflectionWriter::new(llm.clone()),
            conversation: ConversationResponder::new(llm),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let llm = GeminiClient::from_config(&config.llm).context("building generation client")?;
        let source =
            ApiBibleSource::from_config(&config.bible).context("building scripture client")?;
        Ok(Self::new(Arc::new(llm), Arc::new(source), config.bible.search_limit))
    }

    pub async fn handle_query(&self, raw: &str) -> Result<PipelineResult, PipelineError> {
        let query = Query::parse(raw)?;

        let result = match self.resolver.resolve(&query).await? {
            Intent::VerseRequest { topic } => {
                let record = self.fulfillment.fulfill_topic(&topic).await?;
                PipelineResult::Verse { record: self.reflection.attach(record).await }
            }
            Intent::Conversation => {
                PipelineResult::Chat { reply: self.conversation.reply(&query).await? }
            }
        };

        info!(
            event_name = "pipeline.invocation.completed",
            outcome = result.outcome_name(),
            "query handled"
        );
        Ok(result)
    }

    /// Random verse with reflection for the scheduled post. Skips
    /// classification and topic search.
    pub async fn daily_verse(&self) -> Result<VerseRecord, PipelineError> {
        let record = self.fulfillment.random_verse(DAILY_TOPIC).await?;
        let record = self.reflection.attach(record).await;
        info!(
            event_name = "pipeline.daily_verse.ready",
            reference = %record.reference,
            "daily verse prepared"
        );
        Ok(record)
    }
}
