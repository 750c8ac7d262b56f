use serde::Serialize;
use verse_core::VerseRecord;

pub const DAILY_VERSE_EVENT: &str = "daily_verse";
pub const AGENT_USERNAME: &str = "Bible Verse Agent";

/// Channel-ready text plus the reference it was built from, kept for logging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelMessage {
    pub reference: String,
    pub text: String,
}

impl ChannelMessage {
    pub fn new(reference: impl Into<String>, text: impl Into<String>) -> Self {
        Self { reference: reference.into(), text: text.into() }
    }
}

pub fn format_daily_message(record: &VerseRecord) -> ChannelMessage {
    let text = format!(
        "📖 Verse of the Day: {}\n\n{}\n\nReflection: {}",
        record.reference,
        record.text,
        record.reflection_text()
    );
    ChannelMessage::new(record.reference.clone(), text)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WebhookPayload<'a> {
    pub event_name: &'static str,
    pub message: &'a str,
    pub status: &'static str,
    pub username: &'static str,
}

impl<'a> WebhookPayload<'a> {
    pub fn daily_verse(message: &'a ChannelMessage) -> Self {
        Self {
            event_name: DAILY_VERSE_EVENT,
            message: &message.text,
            status: "success",
            username: AGENT_USERNAME,
        }
    }
}
