use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use verse_core::config::BibleConfig;

/// A scripture passage as the source returned it. `content` may still carry
/// markup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Passage {
    pub reference: String,
    pub content: String,
}

impl Passage {
    pub fn new(reference: impl Into<String>, content: impl Into<String>) -> Self {
        Self { reference: reference.into(), content: content.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BookSummary {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChapterSummary {
    pub id: String,
    pub reference: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerseSummary {
    pub id: String,
    pub reference: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("{endpoint} request failed: {message}")]
    Transport { endpoint: &'static str, message: String },
    #[error("{endpoint} returned status {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("could not decode {endpoint} response: {message}")]
    Decode { endpoint: &'static str, message: String },
    #[error("{0} returned no entries")]
    Empty(&'static str),
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Keyword/topic search. Zero passages is a valid answer.
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Passage>, ContentError>;
    /// Direct random-verse primitive.
    async fn random_verse(&self) -> Result<Passage, ContentError>;
    async fn list_books(&self) -> Result<Vec<BookSummary>, ContentError>;
    async fn list_chapters(&self, book_id: &str) -> Result<Vec<ChapterSummary>, ContentError>;
    async fn list_verses(&self, chapter_id: &str) -> Result<Vec<VerseSummary>, ContentError>;
    async fn fetch_verse(&self, verse_id: &str) -> Result<Passage, ContentError>;
}

/// api.bible for search and the book/chapter/verse walk, plus a
/// labs.bible.org-style endpoint for the direct random verse.
pub struct ApiBibleSource {
    http: reqwest::Client,
    bible_url: String,
    api_key: SecretString,
    random_verse_url: String,
}

impl ApiBibleSource {
    pub fn from_config(config: &BibleConfig) -> anyhow::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| anyhow::anyhow!("bible.api_key is not set"))?;
        let http =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;

        Ok(Self {
            http,
            bible_url: format!(
                "{}/bibles/{}",
                config.base_url.trim_end_matches('/'),
                config.bible_id
            ),
            api_key,
            random_verse_url: config.random_verse_url.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &str,
        query: &[(&str, String)],
        authenticated: bool,
    ) -> Result<T, ContentError> {
        let mut request = self.http.get(url).query(query);
        if authenticated {
            request = request.header("api-key", self.api_key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|error| ContentError::Transport { endpoint, message: error.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Status { endpoint, status: status.as_u16() });
        }

        response
            .json::<T>()
            .await
            .map_err(|error| ContentError::Decode { endpoint, message: error.to_string() })
    }
}

#[async_trait]
impl ContentSource for ApiBibleSource {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Passage>, ContentError> {
        let url = format!("{}/search", self.bible_url);
        let params = [
            ("query", query.to_string()),
            ("limit", limit.to_string()),
            ("sort", "relevance".to_string()),
        ];
        let envelope: DataEnvelope<SearchData> =
            self.get_json("search", &url, &params, true).await?;
        Ok(envelope.data.into_passages())
    }

    async fn random_verse(&self) -> Result<Passage, ContentError> {
        let payload: LabsPayload =
            self.get_json("random verse", &self.random_verse_url, &[], false).await?;
        payload.into_passage()
    }

    async fn list_books(&self) -> Result<Vec<BookSummary>, ContentError> {
        let url = format!("{}/books", self.bible_url);
        let envelope: DataEnvelope<Vec<BookSummary>> =
            self.get_json("books", &url, &[], true).await?;
        Ok(envelope.data)
    }

    async fn list_chapters(&self, book_id: &str) -> Result<Vec<ChapterSummary>, ContentError> {
        let url = format!("{}/books/{book_id}/chapters", self.bible_url);
        let envelope: DataEnvelope<Vec<ChapterEntry>> =
            self.get_json("chapters", &url, &[], true).await?;
        Ok(readable_chapters(envelope.data))
    }

    async fn list_verses(&self, chapter_id: &str) -> Result<Vec<VerseSummary>, ContentError> {
        let url = format!("{}/chapters/{chapter_id}/verses", self.bible_url);
        let envelope: DataEnvelope<Vec<VerseEntry>> =
            self.get_json("verses", &url, &[], true).await?;
        Ok(envelope.data.into_iter().map(VerseSummary::from).collect())
    }

    async fn fetch_verse(&self, verse_id: &str) -> Result<Passage, ContentError> {
        let url = format!("{}/verses/{verse_id}", self.bible_url);
        let params = [
            ("include-chapter-numbers", "false".to_string()),
            ("include-verse-numbers", "false".to_string()),
        ];
        let envelope: DataEnvelope<VerseContent> =
            self.get_json("verse", &url, &params, true).await?;
        Ok(Passage::new(envelope.data.reference, envelope.data.content))
    }
}

/// api.bible wraps every payload in `{ "data": ... }`.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Keyword queries answer with `verses`, reference-like queries with
/// `passages`; either list may be absent.
#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(default)]
    passages: Vec<SearchPassage>,
    #[serde(default)]
    verses: Vec<SearchVerse>,
}

#[derive(Debug, Deserialize)]
struct SearchPassage {
    reference: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchVerse {
    reference: Option<String>,
    text: Option<String>,
}

impl SearchData {
    /// Entries missing a reference or text are dropped.
    fn into_passages(self) -> Vec<Passage> {
        let passages = self
            .passages
            .into_iter()
            .filter_map(|entry| {
                Some(Passage::new(present(entry.reference)?, present(entry.content)?))
            });
        let verses = self
            .verses
            .into_iter()
            .filter_map(|entry| {
                Some(Passage::new(present(entry.reference)?, present(entry.text)?))
            });
        passages.chain(verses).collect()
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|text| text.trim().to_string()).filter(|text| !text.is_empty())
}

#[derive(Debug, Deserialize)]
struct ChapterEntry {
    id: String,
    #[serde(default)]
    number: Option<String>,
    #[serde(default)]
    reference: Option<String>,
}

/// Introduction pseudo-chapters carry no verses and are skipped.
fn readable_chapters(entries: Vec<ChapterEntry>) -> Vec<ChapterSummary> {
    entries
        .into_iter()
        .filter(|entry| entry.number.as_deref() != Some("intro") && !entry.id.ends_with(".intro"))
        .map(|entry| {
            let reference = entry.reference.unwrap_or_else(|| entry.id.clone());
            ChapterSummary { id: entry.id, reference }
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct VerseEntry {
    id: String,
    #[serde(default)]
    reference: Option<String>,
}

impl From<VerseEntry> for VerseSummary {
    fn from(entry: VerseEntry) -> Self {
        let reference = entry.reference.unwrap_or_else(|| entry.id.clone());
        Self { id: entry.id, reference }
    }
}

#[derive(Debug, Deserialize)]
struct VerseContent {
    reference: String,
    content: String,
}

/// labs.bible.org answers with a one-element array; a bare object is
/// accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LabsPayload {
    Many(Vec<LabsVerse>),
    One(LabsVerse),
}

#[derive(Debug, Deserialize)]
struct LabsVerse {
    bookname: String,
    chapter: VerseNumber,
    verse: VerseNumber,
    text: String,
}

/// Chapter and verse arrive as numbers or numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VerseNumber {
    Number(u64),
    Text(String),
}

impl fmt::Display for VerseNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text.trim()),
        }
    }
}

impl LabsPayload {
    fn into_passage(self) -> Result<Passage, ContentError> {
        let verse = match self {
            Self::Many(verses) => verses.into_iter().next(),
            Self::One(verse) => Some(verse),
        }
        .ok_or(ContentError::Empty("random verse"))?;

        Ok(Passage::new(
            format!("{} {}:{}", verse.bookname.trim(), verse.chapter, verse.verse),
            verse.text,
        ))
    }
}
