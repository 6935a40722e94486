use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::article::Article;
use crate::collaborators::SocialPost;
use crate::entity::MentionSet;
use crate::events::Event;

/// First rejection reason recorded on a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultStatus {
    NoMention,
    NoEvent,
    MissingDate,
    InvalidDate,
    MissingKeyword,
    IncorrectLanguage,
    UnsupportedFormat,
    List,
    Unavailable,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultStatus::NoMention => write!(f, "No mention found"),
            ResultStatus::NoEvent => write!(f, "No event found"),
            ResultStatus::MissingDate => write!(f, "Missing targeted date"),
            ResultStatus::InvalidDate => write!(f, "Invalid publication date"),
            ResultStatus::MissingKeyword => write!(f, "Missing keyword"),
            ResultStatus::IncorrectLanguage => write!(f, "Incorrect language"),
            ResultStatus::UnsupportedFormat => write!(f, "Unsupported format"),
            ResultStatus::List => write!(f, "List of articles"),
            ResultStatus::Unavailable => write!(f, "Server unavailable"),
        }
    }
}

/// Source-specific part of a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResultSource {
    Web {
        url: String,
        /// Best rank per engine name.
        ranks: BTreeMap<String, String>,
    },
    Social {
        post: SocialPost,
        /// Position of the post in each engine's output.
        ranks: BTreeMap<String, String>,
    },
}

/// One retrieved item and everything the pipeline learns about it.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub key: String,
    pub status: Option<ResultStatus>,
    pub cluster: Option<String>,
    pub article: Option<Article>,
    pub mentions: MentionSet,
    pub events: Vec<Event>,
    pub source: ResultSource,
}

impl SearchResult {
    pub fn web(url: &str) -> Self {
        SearchResult {
            key: url.to_string(),
            status: None,
            cluster: None,
            article: None,
            mentions: MentionSet::new(),
            events: Vec::new(),
            source: ResultSource::Web {
                url: url.to_string(),
                ranks: BTreeMap::new(),
            },
        }
    }

    pub fn social(post: SocialPost) -> Self {
        SearchResult {
            key: post.key(),
            status: None,
            cluster: None,
            article: None,
            mentions: MentionSet::new(),
            events: Vec::new(),
            source: ResultSource::Social {
                post,
                ranks: BTreeMap::new(),
            },
        }
    }

    pub fn with_article(mut self, article: Article) -> Self {
        self.article = Some(article);
        self
    }

    pub fn with_mentions(mut self, mentions: MentionSet) -> Self {
        self.mentions = mentions;
        self
    }

    /// Still eligible for processing by later stages.
    pub fn is_alive(&self) -> bool {
        self.status.is_none()
    }

    /// Records a rejection. The first status wins and is never replaced.
    pub fn reject(&mut self, status: ResultStatus) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    pub fn url(&self) -> Option<&str> {
        match &self.source {
            ResultSource::Web { url, .. } => Some(url),
            ResultSource::Social { post, .. } => post.url.as_deref(),
        }
    }

    pub fn ranks(&self) -> &BTreeMap<String, String> {
        match &self.source {
            ResultSource::Web { ranks, .. } | ResultSource::Social { ranks, .. } => ranks,
        }
    }

    /// Records a rank for `engine`, keeping the best one seen so far.
    pub fn add_rank(&mut self, engine: &str, rank: &str) {
        let ranks = match &mut self.source {
            ResultSource::Web { ranks, .. } | ResultSource::Social { ranks, .. } => ranks,
        };
        match ranks.get(engine) {
            Some(current) if rank_value(current) <= rank_value(rank) => {}
            _ => {
                ranks.insert(engine.to_string(), rank.to_string());
            }
        }
    }

    pub fn is_social(&self) -> bool {
        matches!(self.source, ResultSource::Social { .. })
    }

    /// Social post authored by the tracked person.
    pub fn is_original_post(&self) -> bool {
        matches!(&self.source, ResultSource::Social { post, .. } if post.original)
    }
}

/// Numeric value of a rank; `page-position` ranks compare on the position.
fn rank_value(rank: &str) -> u64 {
    let position = rank.rsplit('-').next().unwrap_or(rank);
    position.trim().parse().unwrap_or(u64::MAX)
}
