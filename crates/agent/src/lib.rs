//! Agent Runtime - intent resolution and verse fulfillment
//!
//! This crate is the "brain" of the verse agent. For every user message it:
//! - Classifies the text as verse-seeking or conversational (`resolver`)
//! - Turns a topic into a verse, walking the fallback chain when lookups fail (`fulfillment`)
//! - Attaches a one-sentence reflection that never blocks delivery (`reflection`)
//! - Answers small talk with an invitation to ask for a verse (`conversation`)
//!
//! # Architecture
//!
//! ```text
//! query → IntentResolver ─┬─ VerseRequest → VerseFulfillment → ReflectionWriter → Verse
//!                         └─ Conversation → ConversationResponder → Chat
//! ```
//!
//! Both external capabilities sit behind traits so they can be scripted in
//! tests: `LlmClient` (prompt in, text out) and `ContentSource` (scripture
//! search, random verse, book/chapter/verse walk).

pub mod content;
pub mod conversation;
pub mod fulfillment;
pub mod llm;
pub mod prompts;
pub mod reflection;
pub mod resolver;
pub mod runtime;

pub use content::{ApiBibleSource, ContentError, ContentSource, Passage};
pub use llm::{GeminiClient, LlmClient};
pub use runtime::AgentRuntime;
