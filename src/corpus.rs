//! Offline collaborators backed by a recorded JSON corpus: engine outputs,
//! retrieved articles and detected mentions.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::article::Article;
use crate::collaborators::{
    ArticleRetriever, Recognizer, RetrievalError, SocialPost, SocialSearchEngine, WebHit,
    WebSearchEngine,
};
use crate::entity::{DateWindow, MentionSet};

pub const TARGET_CORPUS: &str = "corpus";

/// Recorded outcome of a failed retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotAnArticle,
    Unavailable,
}

/// Everything the pipeline would otherwise ask the network for.
///
/// Mentions are keyed by article URL, or by article title (the post id) for
/// social posts without a URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonCorpus {
    pub web: BTreeMap<String, Vec<WebHit>>,
    pub social: BTreeMap<String, Vec<SocialPost>>,
    pub articles: BTreeMap<String, Article>,
    pub failures: BTreeMap<String, FailureKind>,
    pub mentions: BTreeMap<String, MentionSet>,
}

impl JsonCorpus {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse corpus")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read corpus {}", path.display()))?;
        let corpus = Self::from_json(&text)
            .with_context(|| format!("Invalid corpus {}", path.display()))?;
        info!(
            target: TARGET_CORPUS,
            "Loaded corpus {}: {} web engines, {} social engines, {} articles",
            path.display(),
            corpus.web.len(),
            corpus.social.len(),
            corpus.articles.len()
        );
        Ok(corpus)
    }

    pub fn web_engines(&self) -> Vec<CorpusEngine<'_>> {
        self.web
            .keys()
            .map(|name| CorpusEngine { corpus: self, name })
            .collect()
    }

    pub fn social_engines(&self) -> Vec<CorpusEngine<'_>> {
        self.social
            .keys()
            .map(|name| CorpusEngine { corpus: self, name })
            .collect()
    }
}

/// One engine replayed from the corpus.
#[derive(Debug, Clone, Copy)]
pub struct CorpusEngine<'a> {
    corpus: &'a JsonCorpus,
    name: &'a str,
}

impl WebSearchEngine for CorpusEngine<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn search(&self, keywords: &str, _window: &DateWindow) -> Result<Vec<WebHit>> {
        debug!(target: TARGET_CORPUS, "{}: replaying hits for '{}'", self.name, keywords);
        Ok(self.corpus.web.get(self.name).cloned().unwrap_or_default())
    }
}

impl SocialSearchEngine for CorpusEngine<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn search(&self, keywords: &str, _window: &DateWindow) -> Result<Vec<SocialPost>> {
        debug!(target: TARGET_CORPUS, "{}: replaying posts for '{}'", self.name, keywords);
        Ok(self.corpus.social.get(self.name).cloned().unwrap_or_default())
    }
}

impl ArticleRetriever for JsonCorpus {
    fn retrieve(&self, url: &str) -> Result<Article, RetrievalError> {
        if let Some(article) = self.articles.get(url) {
            return Ok(article.clone());
        }
        match self.failures.get(url) {
            Some(FailureKind::NotAnArticle) => Err(RetrievalError::NotAnArticle(url.to_string())),
            Some(FailureKind::Unavailable) => Err(RetrievalError::Unavailable {
                url: url.to_string(),
                reason: "recorded as unavailable".to_string(),
            }),
            None => Err(RetrievalError::Unavailable {
                url: url.to_string(),
                reason: "not in corpus".to_string(),
            }),
        }
    }
}

impl Recognizer for JsonCorpus {
    fn recognize(&self, article: &Article) -> Result<MentionSet> {
        let mentions = self
            .mentions
            .get(&article.url)
            .or_else(|| self.mentions.get(&article.title))
            .cloned()
            .unwrap_or_default();
        Ok(mentions)
    }
}
