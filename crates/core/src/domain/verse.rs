use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRecord {
    pub topic: String,
    pub reference: String,
    pub text: String,
    pub reflection: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl VerseRecord {
    pub fn new(
        topic: impl Into<String>,
        reference: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            reference: reference.into(),
            text: text.into(),
            reflection: None,
            fetched_at: Utc::now(),
        }
    }

    /// Fills the reflection slot. A record that already carries a reflection
    /// keeps it.
    pub fn with_reflection(mut self, reflection: impl Into<String>) -> Self {
        if self.reflection.is_none() {
            self.reflection = Some(reflection.into());
        }
        self
    }

    pub fn reflection_text(&self) -> &str {
        self.reflection.as_deref().unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineResult {
    Verse { record: VerseRecord },
    Chat { reply: String },
}

impl PipelineResult {
    pub fn outcome_name(&self) -> &'static str {
        match self {
            Self::Verse { .. } => "verse",
            Self::Chat { .. } => "chat",
        }
    }
}
