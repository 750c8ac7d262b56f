//! Prompt text sent to the text-generation capability.

/// Returned by the classifier when the user is not asking for scripture.
pub const NO_VERSE_SENTINEL: &str = "NO_VERSE";

pub const VERSE_INVITATION: &str =
    "Would you like me to share a Bible verse? You can say something like: \"I need a verse on love.\"";

pub fn classification_prompt(query: &str) -> String {
    format!(
        "You route messages for a Bible verse assistant.\n\
         If the message below is a greeting, small talk, or anything that is not asking for \
         scripture, reply with exactly {NO_VERSE_SENTINEL} and nothing else.\n\
         Otherwise reply with the main topic or keywords of the request as a short \
         comma-separated list of words (for example: love, forgiveness). No other text.\n\n\
         Message: '{query}'"
    )
}

pub fn reflection_prompt(verse_text: &str, topic: &str) -> String {
    format!(
        "Provide a one-sentence, encouraging reflection on this Bible verse related to {topic}: \
         '{verse_text}'. Reply with the sentence only."
    )
}

pub fn conversation_prompt(query: &str) -> String {
    format!(
        "You are a warm, friendly Bible verse assistant. Reply briefly (one or two sentences) \
         to the user's message below. Do not quote scripture.\n\nMessage: '{query}'"
    )
}
