//! Scripted stand-ins for the generation, scripture and delivery seams.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use verse_agent::content::{BookSummary, ChapterSummary, VerseSummary};
use verse_agent::{ContentError, ContentSource, LlmClient, Passage};
use verse_telex::{ChannelMessage, DeliveryChannel, DeliveryError};

pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedLlm {
    pub fn with_replies(replies: Vec<Result<&str, &str>>) -> Self {
        let replies = replies
            .into_iter()
            .map(|reply| reply.map(str::to_owned).map_err(str::to_owned))
            .collect();
        Self { replies: Mutex::new(replies) }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        let next =
            self.replies.lock().map_err(|_| anyhow::anyhow!("reply lock poisoned"))?.pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("no scripted reply left")),
        }
    }
}

/// Answers search and the direct random verse from fixed values; the
/// book/chapter/verse walk always fails.
pub struct FixedSource {
    search: Result<Vec<Passage>, ContentError>,
    random: Result<Passage, ContentError>,
}

impl FixedSource {
    pub fn failing() -> Self {
        Self {
            search: Err(ContentError::Status { endpoint: "search", status: 503 }),
            random: Err(ContentError::Status { endpoint: "random verse", status: 503 }),
        }
    }

    pub fn search_hit(passage: Passage) -> Self {
        Self { search: Ok(vec![passage]), ..Self::failing() }
    }

    pub fn random(passage: Passage) -> Self {
        Self { random: Ok(passage), ..Self::failing() }
    }
}

#[async_trait]
impl ContentSource for FixedSource {
    async fn search(&self, _query: &str, _limit: u32) -> Result<Vec<Passage>, ContentError> {
        self.search.clone()
    }

    async fn random_verse(&self) -> Result<Passage, ContentError> {
        self.random.clone()
    }

    async fn list_books(&self) -> Result<Vec<BookSummary>, ContentError> {
        Err(ContentError::Status { endpoint: "books", status: 503 })
    }

    async fn list_chapters(&self, _book_id: &str) -> Result<Vec<ChapterSummary>, ContentError> {
        Err(ContentError::Status { endpoint: "chapters", status: 503 })
    }

    async fn list_verses(&self, _chapter_id: &str) -> Result<Vec<VerseSummary>, ContentError> {
        Err(ContentError::Status { endpoint: "verses", status: 503 })
    }

    async fn fetch_verse(&self, _verse_id: &str) -> Result<Passage, ContentError> {
        Err(ContentError::Status { endpoint: "verse", status: 503 })
    }
}

#[derive(Default)]
pub struct RecordingChannel {
    posted: Mutex<Vec<ChannelMessage>>,
    reject_with: Option<u16>,
}

impl RecordingChannel {
    pub fn rejecting(status: u16) -> Self {
        Self { posted: Mutex::new(Vec::new()), reject_with: Some(status) }
    }

    pub fn posted(&self) -> Vec<ChannelMessage> {
        self.posted.lock().map(|posted| posted.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn post(&self, message: &ChannelMessage) -> Result<(), DeliveryError> {
        if let Some(status) = self.reject_with {
            return Err(DeliveryError::Rejected { status });
        }
        if let Ok(mut posted) = self.posted.lock() {
            posted.push(message.clone());
        }
        Ok(())
    }
}
