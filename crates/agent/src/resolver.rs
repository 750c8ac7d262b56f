use std::sync::Arc;

use tracing::info;
use verse_core::{Intent, PipelineError, PipelineStage, Query};

use crate::llm::LlmClient;
use crate::prompts::{classification_prompt, NO_VERSE_SENTINEL};

pub struct IntentResolver {
    llm: Arc<dyn LlmClient>,
}

impl IntentResolver {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// One classification call, no retries. A failed call fails the
    /// invocation.
    pub async fn resolve(&self, query: &Query) -> Result<Intent, PipelineError> {
        let generated = self
            .llm
            .complete(&classification_prompt(query.as_str()))
            .await
            .map_err(|error| PipelineError::Generation {
                stage: PipelineStage::Classification,
                message: format!("{error:#}"),
            })?;

        let intent = interpret_classification(&generated)?;
        let kind = match &intent {
            Intent::VerseRequest { .. } => "verse_request",
            Intent::Conversation => "conversation",
        };
        info!(
            event_name = "pipeline.intent.resolved",
            intent = kind,
            topic = intent.topic().unwrap_or("none"),
            "classified query"
        );
        Ok(intent)
    }
}

pub(crate) fn interpret_classification(generated: &str) -> Result<Intent, PipelineError> {
    let cleaned =
        generated.trim().trim_matches(|c: char| c == '"' || c == '\'' || c == '`').trim();
    if cleaned == NO_VERSE_SENTINEL {
        return Ok(Intent::Conversation);
    }
    Intent::verse_request(cleaned)
}
