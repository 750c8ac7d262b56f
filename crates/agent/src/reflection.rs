use std::sync::Arc;

use tracing::warn;
use verse_core::VerseRecord;

use crate::llm::LlmClient;
use crate::prompts::reflection_prompt;

pub fn fallback_reflection(topic: &str) -> String {
    format!("This verse speaks to the importance of {topic} in our spiritual journey.")
}

pub struct ReflectionWriter {
    llm: Arc<dyn LlmClient>,
}

impl ReflectionWriter {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Never fails: a generation error or blank answer becomes the templated
    /// sentence so an already-fetched verse is always delivered.
    pub async fn attach(&self, record: VerseRecord) -> VerseRecord {
        let generated = self.llm.complete(&reflection_prompt(&record.text, &record.topic)).await;

        let reflection = match generated {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!(
                    event_name = "pipeline.reflection.degraded",
                    reference = %record.reference,
                    reason = "blank generation",
                    "using templated reflection"
                );
                fallback_reflection(&record.topic)
            }
            Err(error) => {
                warn!(
                    event_name = "pipeline.reflection.degraded",
                    reference = %record.reference,
                    reason = "generation failed",
                    error = %error,
                    "using templated reflection"
                );
                fallback_reflection(&record.topic)
            }
        };

        record.with_reflection(reflection)
    }
}
