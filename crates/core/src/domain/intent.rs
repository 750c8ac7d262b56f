use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;

/// User text that survived trimming. Construction is the only validation the
/// pipeline performs on raw input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query(String);

impl Query {
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::InvalidInput("query text is empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    VerseRequest { topic: String },
    Conversation,
}

impl Intent {
    /// Builds a verse request, rejecting blank topics.
    pub fn verse_request(topic: &str) -> Result<Self, PipelineError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(PipelineError::InvalidInput(
                "classification produced neither a topic nor the conversation marker".to_string(),
            ));
        }
        Ok(Self::VerseRequest { topic: topic.to_string() })
    }

    pub fn topic(&self) -> Option<&str> {
        match self {
            Self::VerseRequest { topic } => Some(topic),
            Self::Conversation => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Intent, Query};
    use crate::errors::PipelineError;

    #[test]
    fn query_is_trimmed() {
        let query = Query::parse("  Get a verse on love \n").expect("query");
        assert_eq!(query.as_str(), "Get a verse on love");
    }

    #[test]
    fn blank_query_is_an_input_error() {
        let error = Query::parse(" \t ").expect_err("blank query should fail");
        assert!(matches!(error, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn verse_request_rejects_blank_topic() {
        assert!(Intent::verse_request("   ").is_err());
        assert_eq!(
            Intent::verse_request(" hope ").expect("topic").topic(),
            Some("hope"),
            "topic should be stored trimmed"
        );
    }

    #[test]
    fn conversation_has_no_topic() {
        assert_eq!(Intent::Conversation.topic(), None);
    }
}
