use std::sync::Arc;

use rand::seq::SliceRandom;
use tracing::{info, warn};
use verse_core::{strip_markup, PipelineError, VerseRecord};

use crate::content::{ContentError, ContentSource, Passage};

/// Topic search first, then the random-verse fallback. The fallback tries the
/// source's direct random verse and then walks book → chapter → verse.
pub struct VerseFulfillment {
    source: Arc<dyn ContentSource>,
    search_limit: u32,
}

impl VerseFulfillment {
    pub fn new(source: Arc<dyn ContentSource>, search_limit: u32) -> Self {
        Self { source, search_limit: search_limit.max(1) }
    }

    pub async fn fulfill_topic(&self, topic: &str) -> Result<VerseRecord, PipelineError> {
        match self.source.search(topic, self.search_limit).await {
            Ok(passages) => {
                let candidates = passages.len();
                match pick_usable(passages) {
                    Some((reference, text)) => {
                        info!(
                            event_name = "pipeline.fulfillment.search_hit",
                            topic,
                            candidates,
                            reference = %reference,
                            "selected passage from topic search"
                        );
                        return Ok(VerseRecord::new(topic, reference, text));
                    }
                    None => info!(
                        event_name = "pipeline.fulfillment.fallback",
                        topic,
                        candidates,
                        reason = "no usable passages",
                        "topic search found nothing usable; falling back to random verse"
                    ),
                }
            }
            Err(error) => warn!(
                event_name = "pipeline.fulfillment.fallback",
                topic,
                reason = "search failed",
                error = %error,
                "topic search failed; falling back to random verse"
            ),
        }

        self.random_verse(topic).await
    }

    /// Fails with `FallbackExhausted` only when both the direct primitive and
    /// the four-step walk fail.
    pub async fn random_verse(&self, topic: &str) -> Result<VerseRecord, PipelineError> {
        let mut attempts = Vec::new();

        match self.source.random_verse().await.and_then(clean_passage) {
            Ok((reference, text)) => return Ok(VerseRecord::new(topic, reference, text)),
            Err(error) => {
                warn!(
                    event_name = "pipeline.fulfillment.random_direct_failed",
                    error = %error,
                    "direct random verse failed; walking book, chapter and verse"
                );
                attempts.push(format!("direct random verse: {error}"));
            }
        }

        match self.walk_to_random_verse().await.and_then(clean_passage) {
            Ok((reference, text)) => Ok(VerseRecord::new(topic, reference, text)),
            Err(error) => {
                attempts.push(format!("random walk: {error}"));
                warn!(
                    event_name = "pipeline.fulfillment.exhausted",
                    topic,
                    attempts = attempts.len(),
                    "every random verse strategy failed"
                );
                Err(PipelineError::FallbackExhausted { attempts })
            }
        }
    }

    async fn walk_to_random_verse(&self) -> Result<Passage, ContentError> {
        let books = self.source.list_books().await?;
        let book = choose(&books).ok_or(ContentError::Empty("books"))?;

        let chapters = self.source.list_chapters(&book.id).await?;
        let chapter = choose(&chapters).ok_or(ContentError::Empty("chapters"))?;

        let verses = self.source.list_verses(&chapter.id).await?;
        let verse = choose(&verses).ok_or(ContentError::Empty("verses"))?;

        self.source.fetch_verse(&verse.id).await
    }
}

fn choose<T: Clone>(items: &[T]) -> Option<T> {
    items.choose(&mut rand::thread_rng()).cloned()
}

fn clean_passage(passage: Passage) -> Result<(String, String), ContentError> {
    let text = strip_markup(&passage.content);
    let reference = passage.reference.trim().to_string();
    if text.is_empty() || reference.is_empty() {
        return Err(ContentError::Empty("verse content"));
    }
    Ok((reference, text))
}

/// Uniform pick among passages that still have a reference and text once
/// markup is gone.
fn pick_usable(passages: Vec<Passage>) -> Option<(String, String)> {
    let usable =
        passages.into_iter().filter_map(|passage| clean_passage(passage).ok()).collect::<Vec<_>>();
    choose(&usable)
}

#[cfg(test)]
mod tests {
    use super::{clean_passage, pick_usable};
    use crate::content::{ContentError, Passage};

    #[test]
    fn clean_passage_strips_markup() {
        let cleaned =
            clean_passage(Passage::new(" John 11:35 ", "<span class=\"v\">Jesus wept.</span>"))
                .expect("usable passage");
        assert_eq!(cleaned, ("John 11:35".to_string(), "Jesus wept.".to_string()));
    }

    #[test]
    fn markup_only_passage_is_unusable() {
        assert_eq!(
            clean_passage(Passage::new("Psalm 1:1", "<p></p>")),
            Err(ContentError::Empty("verse content"))
        );
    }

    #[test]
    fn pick_is_a_member_of_the_usable_candidates() {
        let passages = vec![
            Passage::new("1 John 4:8", "God is love."),
            Passage::new("John 3:16", "<p>For God so loved the world</p>"),
            Passage::new("Empty 1:1", "<p> </p>"),
        ];

        for _ in 0..50 {
            let (reference, _) = pick_usable(passages.clone()).expect("a usable passage");
            assert!(["1 John 4:8", "John 3:16"].contains(&reference.as_str()));
        }
    }

    #[test]
    fn nothing_usable_yields_none() {
        assert!(pick_usable(Vec::new()).is_none());
        assert!(pick_usable(vec![Passage::new("X 1:1", "<br/>")]).is_none());
    }
}
