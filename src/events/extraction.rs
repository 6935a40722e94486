use tracing::{debug, warn};

use super::types::Event;
use super::TARGET_EVENT;
use crate::article::Article;
use crate::collaborators::SentenceSplitter;
use crate::entity::{EntityType, MentionSet, Period};

/// Granularity of event extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    ByArticle,
    BySentence,
}

impl ExtractionMode {
    pub fn label(self) -> &'static str {
        match self {
            ExtractionMode::ByArticle => "byarticle",
            ExtractionMode::BySentence => "bysentence",
        }
    }
}

/// Builds events from an article's mentions.
pub struct EventExtractor<'a> {
    splitter: &'a dyn SentenceSplitter,
    use_publication_date: bool,
}

impl<'a> EventExtractor<'a> {
    pub fn new(splitter: &'a dyn SentenceSplitter) -> Self {
        EventExtractor {
            splitter,
            use_publication_date: true,
        }
    }

    pub fn with_publication_date_fallback(mut self, enabled: bool) -> Self {
        self.use_publication_date = enabled;
        self
    }

    /// Extracts the events of one article.
    ///
    /// # Arguments
    /// * `key` - Key of the owning result, for logging
    /// * `article` - The retrieved article
    /// * `mentions` - Mentions detected in the article
    /// * `mode` - Whole-article or per-sentence extraction
    ///
    /// # Returns
    /// * Zero or more events, in text order
    pub fn extract(
        &self,
        key: &str,
        article: &Article,
        mentions: &MentionSet,
        mode: ExtractionMode,
    ) -> Vec<Event> {
        match mode {
            ExtractionMode::ByArticle => self.extract_by_article(key, article, mentions),
            ExtractionMode::BySentence => self.extract_by_sentence(key, article, mentions),
        }
    }

    fn fallback_period(&self, article: &Article) -> Option<Period> {
        if self.use_publication_date {
            article.publication_date.map(Period::single)
        } else {
            None
        }
    }

    fn extract_by_article(&self, key: &str, article: &Article, mentions: &MentionSet) -> Vec<Event> {
        let mut dates = mentions.of_type(EntityType::Date).iter().filter_map(|m| m.period());
        let period = match dates.next() {
            Some(first) => {
                let mut period = *first;
                for other in dates {
                    period.merge(other);
                }
                period
            }
            None => match self.fallback_period(article) {
                Some(period) => {
                    debug!(target: TARGET_EVENT, "{}: no date mention, using publication date {}", key, period);
                    period
                }
                None => {
                    debug!(target: TARGET_EVENT, "{}: no date available, no event", key);
                    return Vec::new();
                }
            },
        };

        if mentions.of_type(EntityType::Person).is_empty() {
            warn!(target: TARGET_EVENT, "{}: date found but no person mention, event discarded", key);
            return Vec::new();
        }

        let event = Event::new(period, 0, article.raw_text.len(), &article.raw_text)
            .with_named_mentions(mentions);
        vec![event]
    }

    fn extract_by_sentence(&self, key: &str, article: &Article, mentions: &MentionSet) -> Vec<Event> {
        let text = &article.raw_text;
        let mut events = Vec::new();

        for (start, end) in self.splitter.split(text) {
            let local = mentions.within(start, end);
            let dates = local.of_type(EntityType::Date);

            let period = match dates.first().and_then(|m| m.period()) {
                Some(period) => {
                    if dates.len() > 1 {
                        warn!(
                            target: TARGET_EVENT,
                            "{}: {} dates in sentence at {}, keeping the first ({})",
                            key,
                            dates.len(),
                            start,
                            period
                        );
                    }
                    *period
                }
                None => match self.fallback_period(article) {
                    Some(period) => period,
                    None => continue,
                },
            };

            if local.of_type(EntityType::Person).is_empty() {
                if !dates.is_empty() {
                    warn!(target: TARGET_EVENT, "{}: sentence at {} has a date but no person", key, start);
                }
                continue;
            }

            let sentence = text.get(start..end).unwrap_or_default().trim();
            events.push(Event::new(period, start, end, sentence).with_named_mentions(&local));
        }

        debug!(target: TARGET_EVENT, "{}: {} sentence events", key, events.len());
        events
    }
}
