use std::sync::Arc;

use verse_core::{PipelineError, PipelineStage, Query};

use crate::llm::LlmClient;
use crate::prompts::{conversation_prompt, VERSE_INVITATION};

pub struct ConversationResponder {
    llm: Arc<dyn LlmClient>,
}

impl ConversationResponder {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Short warm reply followed by the verse invitation. Generation failures
    /// propagate.
    pub async fn reply(&self, query: &Query) -> Result<String, PipelineError> {
        let generation_error = |message: String| PipelineError::Generation {
            stage: PipelineStage::Conversation,
            message,
        };

        let generated = self
            .llm
            .complete(&conversation_prompt(query.as_str()))
            .await
            .map_err(|error| generation_error(format!("{error:#}")))?;

        let greeting = generated.trim();
        if greeting.is_empty() {
            return Err(generation_error("conversation reply was blank".to_string()));
        }

        Ok(format!("{greeting}\n\n{VERSE_INVITATION}"))
    }
}
