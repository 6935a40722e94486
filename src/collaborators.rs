//! Seams towards the components this crate consumes but does not implement:
//! search engines, article retrieval, mention recognition and sentence
//! splitting.

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

use crate::article::{Article, Language};
use crate::entity::{DateWindow, MentionSet};

/// Typed failures of the article retrieval collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    #[error("{0} is a list of articles, not an article")]
    NotAnArticle(String),
    #[error("could not retrieve {url}: {reason}")]
    Unavailable { url: String, reason: String },
}

/// Turns a URL into a cleaned article.
pub trait ArticleRetriever {
    fn retrieve(&self, url: &str) -> Result<Article, RetrievalError>;
}

/// Detects typed mentions in an article's raw text.
pub trait Recognizer {
    fn recognize(&self, article: &Article) -> Result<MentionSet>;
}

/// One hit of a web search engine. `rank` is kept as text since some
/// engines report `page-position` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebHit {
    pub url: String,
    pub rank: String,
}

pub trait WebSearchEngine {
    fn name(&self) -> &str;

    /// Ordered hits for the keywords, best first.
    fn search(&self, keywords: &str, window: &DateWindow) -> Result<Vec<WebHit>>;
}

/// A social media post with its engagement counters and comments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    pub id: String,
    pub source: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub content: String,
    /// Whether the post was authored by the tracked person.
    #[serde(default)]
    pub original: bool,
    #[serde(default)]
    pub likes: Option<u32>,
    #[serde(default)]
    pub shares: Option<u32>,
    #[serde(default)]
    pub comments: Vec<SocialPost>,
    #[serde(default)]
    pub url: Option<String>,
}

impl SocialPost {
    pub fn key(&self) -> String {
        format!("{}@{}", self.id, self.source)
    }

    /// Builds the article view of this post. Comments are appended as
    /// separate paragraphs when requested.
    pub fn build_article(&self, include_comments: bool) -> Article {
        let mut text = self.content.clone();
        if include_comments {
            for comment in &self.comments {
                text.push_str("\n\n");
                text.push_str(&comment.content);
            }
        }

        let mut article = Article::new(&self.id, self.url.as_deref().unwrap_or(""), &text);
        if !self.author.is_empty() {
            article.authors = vec![self.author.clone()];
        }
        article.publication_date = self.date;
        article.language = Language::detect(&text);
        article
    }
}

pub trait SocialSearchEngine {
    fn name(&self) -> &str;

    /// Ordered posts for the keywords, best first.
    fn search(&self, keywords: &str, window: &DateWindow) -> Result<Vec<SocialPost>>;
}

/// Splits text into sentences, returned as byte ranges `start..end`.
pub trait SentenceSplitter {
    fn split(&self, text: &str) -> Vec<(usize, usize)>;
}

/// Sentence boundaries from the Unicode segmentation rules (UAX #29).
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSentenceSplitter;

impl SentenceSplitter for UnicodeSentenceSplitter {
    fn split(&self, text: &str) -> Vec<(usize, usize)> {
        text.split_sentence_bound_indices()
            .filter(|(_, s)| !s.trim().is_empty())
            .map(|(start, s)| (start, start + s.len()))
            .collect()
    }
}
