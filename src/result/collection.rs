use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::filter::{
    filter_by_entity_date, filter_by_keyword, filter_by_language, filter_by_publication_date,
    filter_by_url, FilterSettings,
};
use super::types::{ResultStatus, SearchResult};
use super::TARGET_FILTER;
use crate::article::Language;
use crate::clustering::{
    PartitionOutcome, Partitioner, MIN_ARTICLES_FOR_CLUSTERING, MIN_EVENTS_FOR_CLUSTERING,
    TARGET_CLUSTER, UNCLUSTERED_ID,
};
use crate::collaborators::{
    ArticleRetriever, Recognizer, RetrievalError, SocialPost, WebHit,
};
use crate::entity::{MentionSet, TARGET_ENTITY};
use crate::events::{Event, EventCluster, EventExtractor, EventRef, ExtractionMode, ReferenceClusters, TARGET_EVENT};
use crate::similarity::{event_distance_matrix, TfIdfModel};

/// Outcome of event clustering, handed to the exports and the evaluator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventClustering {
    pub clusters: Vec<EventCluster>,
    /// `None` when there were too few events to cluster.
    pub silhouette: Option<f64>,
}

/// Every search result of one pass, keyed by result key, plus the engine
/// names that contributed and the manual reference mapping.
#[derive(Debug, Clone, Default)]
pub struct ResultCollection {
    results: BTreeMap<String, SearchResult>,
    engines: Vec<String>,
    references: ReferenceClusters,
}

impl ResultCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results in key order.
    pub fn iter(&self) -> impl Iterator<Item = &SearchResult> {
        self.results.values()
    }

    pub fn get(&self, key: &str) -> Option<&SearchResult> {
        self.results.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut SearchResult> {
        self.results.get_mut(key)
    }

    pub fn alive_count(&self) -> usize {
        self.results.values().filter(|r| r.is_alive()).count()
    }

    pub fn engines(&self) -> &[String] {
        &self.engines
    }

    pub fn references(&self) -> &ReferenceClusters {
        &self.references
    }

    pub fn set_references(&mut self, references: ReferenceClusters) {
        self.references = references;
    }

    /// Inserts a prepared result, replacing any result with the same key.
    pub fn insert(&mut self, result: SearchResult) {
        self.results.insert(result.key.clone(), result);
    }

    fn register_engine(&mut self, engine: &str) {
        if !self.engines.iter().any(|e| e == engine) {
            self.engines.push(engine.to_string());
        }
    }

    /// Records the hits of one web engine, merging results that share a
    /// (cleaned) URL.
    pub fn add_web_hits(&mut self, engine: &str, hits: &[WebHit]) {
        self.register_engine(engine);
        for hit in hits {
            let url = clean_url(&hit.url);
            self.results
                .entry(url.clone())
                .or_insert_with(|| SearchResult::web(&url))
                .add_rank(engine, &hit.rank);
        }
        info!(target: TARGET_FILTER, "{}: {} hits, {} distinct results so far", engine, hits.len(), self.len());
    }

    /// Records the posts of one social engine and builds their articles.
    pub fn add_social_posts(&mut self, engine: &str, posts: &[SocialPost], include_comments: bool) {
        self.register_engine(engine);
        for (position, post) in posts.iter().enumerate() {
            let result = self.results.entry(post.key()).or_insert_with(|| {
                let article = post.build_article(include_comments);
                SearchResult::social(post.clone()).with_article(article)
            });
            result.add_rank(engine, &(position + 1).to_string());
        }
        info!(target: TARGET_FILTER, "{}: {} posts, {} distinct results so far", engine, posts.len(), self.len());
    }

    fn log_survivors(&self, stage: &str) {
        info!(
            target: TARGET_FILTER,
            "{}: {}/{} results remaining",
            stage,
            self.alive_count(),
            self.len()
        );
    }

    /// Rejects documents whose URL points to an unsupported format.
    pub fn filter_by_url(&mut self) {
        let mut removed = 0;
        for result in self.results.values_mut() {
            if filter_by_url(result) {
                removed += 1;
            }
        }
        debug!(target: TARGET_FILTER, "URL filter removed {}", removed);
        self.log_survivors("URL filter");
    }

    /// Retrieves the article of every surviving web result. Typed failures
    /// become statuses; social results already carry their article.
    pub fn retrieve_articles(&mut self, retriever: &dyn ArticleRetriever) {
        for result in self.results.values_mut() {
            if !result.is_alive() || result.article.is_some() {
                continue;
            }
            let Some(url) = result.url().map(str::to_string) else {
                continue;
            };
            match retriever.retrieve(&url) {
                Ok(mut article) => {
                    article.detect_language_if_missing();
                    result.article = Some(article);
                }
                Err(e @ RetrievalError::NotAnArticle(_)) => {
                    warn!(target: TARGET_FILTER, "{}", e);
                    result.reject(ResultStatus::List);
                }
                Err(e @ RetrievalError::Unavailable { .. }) => {
                    warn!(target: TARGET_FILTER, "{}", e);
                    result.reject(ResultStatus::Unavailable);
                }
            }
        }
        self.log_survivors("Article retrieval");
    }

    /// Language, then compulsory expression, then publication date (when
    /// enabled).
    pub fn filter_by_content(&mut self, settings: &FilterSettings) {
        if let Some(language) = settings.language {
            for result in self.results.values_mut() {
                filter_by_language(result, language);
            }
            self.log_survivors("Language filter");
        }
        if let Some(pattern) = &settings.compulsory {
            for result in self.results.values_mut() {
                filter_by_keyword(result, pattern);
            }
            self.log_survivors("Keyword filter");
        }
        if settings.by_publication_date {
            for result in self.results.values_mut() {
                filter_by_publication_date(result, &settings.window);
            }
            self.log_survivors("Publication date filter");
        }
    }

    /// Runs the recognizer on every surviving article. Results without any
    /// mention are rejected; a recognizer failure counts as no mention.
    pub fn detect_mentions(&mut self, recognizer: &dyn Recognizer) {
        for result in self.results.values_mut() {
            if !result.is_alive() {
                continue;
            }
            let Some(article) = &result.article else {
                continue;
            };
            let mentions = match recognizer.recognize(article) {
                Ok(mentions) => mentions,
                Err(e) => {
                    warn!(target: TARGET_ENTITY, "{}: mention detection failed: {:#}", result.key, e);
                    MentionSet::new()
                }
            };
            debug!(target: TARGET_ENTITY, "{}: {} mentions", result.key, mentions.len());
            if mentions.is_empty() {
                result.reject(ResultStatus::NoMention);
            }
            result.mentions = mentions;
        }
        self.log_survivors("Mention detection");
    }

    /// Rejects results lacking a date mention matching the window (when
    /// enabled).
    pub fn filter_by_entity(&mut self, settings: &FilterSettings) {
        if !settings.by_entity_date {
            return;
        }
        if settings.window.is_unbounded() {
            warn!(target: TARGET_FILTER, "Entity date filter enabled without any date bound");
        }
        for result in self.results.values_mut() {
            filter_by_entity_date(result, &settings.window);
        }
        self.log_survivors("Entity date filter");
    }

    /// Clears article cluster ids before a new clustering pass.
    pub fn reset_clusters(&mut self) {
        for result in self.results.values_mut() {
            result.cluster = None;
        }
    }

    /// Clusters the surviving articles by TF-IDF cosine distance.
    ///
    /// # Returns
    /// * The partition outcome, or `None` when too few articles survive, in
    ///   which case they all get the `N/A` cluster id
    pub fn cluster_articles(
        &mut self,
        partitioner: &dyn Partitioner,
        language: Option<Language>,
        use_sqrt_dot: bool,
    ) -> Option<PartitionOutcome> {
        let alive: Vec<String> = self
            .results
            .values()
            .filter(|r| r.is_alive() && r.article.is_some())
            .map(|r| r.key.clone())
            .collect();

        if alive.len() < MIN_ARTICLES_FOR_CLUSTERING {
            info!(
                target: TARGET_CLUSTER,
                "Only {} articles, clustering skipped",
                alive.len()
            );
            for key in &alive {
                if let Some(result) = self.results.get_mut(key) {
                    result.cluster = Some(UNCLUSTERED_ID.to_string());
                }
            }
            return None;
        }

        let texts: Vec<&str> = alive
            .iter()
            .filter_map(|k| self.results.get(k))
            .filter_map(|r| r.article.as_ref())
            .map(|a| a.raw_text.as_str())
            .collect();
        let matrix = TfIdfModel::build(&texts, language).distance_matrix(use_sqrt_dot);
        let outcome = partitioner.partition(&matrix);

        for (key, cluster) in alive.iter().zip(&outcome.assignments) {
            if let Some(result) = self.results.get_mut(key) {
                result.cluster = Some(cluster.to_string());
            }
        }
        info!(
            target: TARGET_CLUSTER,
            "{} articles in {} clusters ({}), silhouette={:.4}",
            alive.len(),
            outcome.cluster_count(),
            partitioner.name(),
            outcome.silhouette
        );
        Some(outcome)
    }

    /// Rebuilds the events of every result. Rejected results end up with no
    /// events.
    ///
    /// # Returns
    /// * Total number of extracted events
    pub fn extract_events(&mut self, extractor: &EventExtractor, mode: ExtractionMode) -> usize {
        let mut total = 0;
        for result in self.results.values_mut() {
            result.events.clear();
            if !result.is_alive() {
                continue;
            }
            if let Some(article) = &result.article {
                result.events = extractor.extract(&result.key, article, &result.mentions, mode);
                total += result.events.len();
            }
        }
        info!(target: TARGET_EVENT, "Extracted {} events ({})", total, mode.label());
        total
    }

    /// Rejects surviving results that yielded no event.
    pub fn filter_by_event(&mut self) {
        for result in self.results.values_mut() {
            if result.is_alive() && result.events.is_empty() {
                result.reject(ResultStatus::NoEvent);
            }
        }
        self.log_survivors("Event filter");
    }

    /// References to the events of surviving results, sorted by result key
    /// then position.
    pub fn event_refs(&self) -> Vec<EventRef> {
        self.results
            .values()
            .filter(|r| r.is_alive())
            .flat_map(|r| {
                (0..r.events.len()).map(move |index| EventRef {
                    key: r.key.clone(),
                    index,
                })
            })
            .collect()
    }

    pub fn event(&self, event_ref: &EventRef) -> Option<&Event> {
        self.results
            .get(&event_ref.key)
            .and_then(|r| r.events.get(event_ref.index))
    }

    /// Groups the extracted events by Jaccard distance over their mention
    /// values and records the cluster id on each event.
    pub fn cluster_events(&mut self, partitioner: &dyn Partitioner) -> EventClustering {
        let refs = self.event_refs();
        if refs.len() < MIN_EVENTS_FOR_CLUSTERING {
            info!(target: TARGET_CLUSTER, "Only {} events, event clustering skipped", refs.len());
            return EventClustering::default();
        }

        let outcome = {
            let events: Vec<&Event> = refs.iter().filter_map(|r| self.event(r)).collect();
            partitioner.partition(&event_distance_matrix(&events))
        };

        let mut grouped: BTreeMap<u32, Vec<EventRef>> = BTreeMap::new();
        for (event_ref, cluster) in refs.into_iter().zip(&outcome.assignments) {
            if let Some(event) = self
                .results
                .get_mut(&event_ref.key)
                .and_then(|r| r.events.get_mut(event_ref.index))
            {
                event.cluster = Some(cluster.to_string());
            }
            grouped.entry(*cluster).or_default().push(event_ref);
        }

        info!(
            target: TARGET_CLUSTER,
            "{} event clusters, silhouette={:.4}",
            grouped.len(),
            outcome.silhouette
        );
        EventClustering {
            clusters: grouped
                .into_iter()
                .map(|(id, members)| EventCluster {
                    id: id.to_string(),
                    members,
                })
                .collect(),
            silhouette: Some(outcome.silhouette),
        }
    }

    /// Merges two collections for the combined pass.
    pub fn combine(first: &ResultCollection, second: &ResultCollection) -> ResultCollection {
        let mut combined = first.clone();
        for result in second.results.values() {
            if combined.results.contains_key(&result.key) {
                warn!(target: TARGET_FILTER, "Duplicate key {} while combining, keeping the first", result.key);
                continue;
            }
            combined.insert(result.clone());
        }
        for engine in &second.engines {
            combined.register_engine(engine);
        }
        combined.references.extend(&second.references);
        info!(target: TARGET_FILTER, "Combined collection: {} results", combined.len());
        combined
    }
}

/// Undoes the cookie-check redirect wrapper some engines put around URLs.
pub fn clean_url(url: &str) -> String {
    const WRAPPER: &str = "check_cookies?url=%2F";
    match url.find(WRAPPER) {
        Some(idx) => {
            let cleaned = format!("{}{}", &url[..idx], &url[idx + WRAPPER.len()..]).replace("%2F", "/");
            debug!(target: TARGET_FILTER, "Corrected URL: {}", cleaned);
            cleaned
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Article;
    use crate::clustering::HierarchicalPartitioner;
    use crate::collaborators::UnicodeSentenceSplitter;
    use crate::entity::{DateWindow, EntityType, Mention, Period};
    use anyhow::anyhow;
    use chrono::NaiveDate;

    struct StubRetriever;

    impl ArticleRetriever for StubRetriever {
        fn retrieve(&self, url: &str) -> Result<Article, RetrievalError> {
            if url.contains("list") {
                Err(RetrievalError::NotAnArticle(url.to_string()))
            } else if url.contains("down") {
                Err(RetrievalError::Unavailable {
                    url: url.to_string(),
                    reason: "503".to_string(),
                })
            } else {
                Ok(Article::new(url, url, "François Hollande parle le 6 mai 2012.")
                    .with_language(Language::Fr))
            }
        }
    }

    struct StubRecognizer;

    impl Recognizer for StubRecognizer {
        fn recognize(&self, article: &Article) -> anyhow::Result<MentionSet> {
            if article.url.contains("broken") {
                return Err(anyhow!("service down"));
            }
            if article.url.contains("empty") {
                return Ok(MentionSet::new());
            }
            let date = NaiveDate::from_ymd_opt(2012, 5, 6).unwrap();
            Ok(MentionSet::new()
                .with_mention(Mention::named(EntityType::Person, 0, 17, "François Hollande", "francois hollande"))
                .with_mention(Mention::date(27, 37, "6 mai 2012", Period::single(date))))
        }
    }

    fn hits(urls: &[&str]) -> Vec<WebHit> {
        urls.iter()
            .enumerate()
            .map(|(i, u)| WebHit {
                url: u.to_string(),
                rank: (i + 1).to_string(),
            })
            .collect()
    }

    #[test]
    fn test_clean_url() {
        assert_eq!(
            clean_url("http://site.fr/check_cookies?url=%2Fpolitique%2Farticle.html"),
            "http://site.fr/politique/article.html"
        );
        assert_eq!(clean_url("http://site.fr/a"), "http://site.fr/a");
    }

    #[test]
    fn test_web_hits_merge_by_url() {
        let mut collection = ResultCollection::new();
        collection.add_web_hits("google", &hits(&["http://a", "http://b"]));
        collection.add_web_hits("bing", &hits(&["http://b"]));
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.engines(), &["google".to_string(), "bing".to_string()]);
        let b = collection.get("http://b").unwrap();
        assert_eq!(b.ranks()["google"], "2");
        assert_eq!(b.ranks()["bing"], "1");
    }

    #[test]
    fn test_retrieval_and_mentions_set_statuses() {
        let mut collection = ResultCollection::new();
        collection.add_web_hits(
            "google",
            &hits(&["http://ok", "http://list", "http://down", "http://broken", "http://empty", "http://host/x.pdf"]),
        );
        collection.filter_by_url();
        collection.retrieve_articles(&StubRetriever);
        collection.detect_mentions(&StubRecognizer);

        let status = |k: &str| collection.get(k).unwrap().status;
        assert_eq!(status("http://ok"), None);
        assert_eq!(status("http://list"), Some(ResultStatus::List));
        assert_eq!(status("http://down"), Some(ResultStatus::Unavailable));
        assert_eq!(status("http://broken"), Some(ResultStatus::NoMention));
        assert_eq!(status("http://empty"), Some(ResultStatus::NoMention));
        assert_eq!(status("http://host/x.pdf"), Some(ResultStatus::UnsupportedFormat));
        assert_eq!(collection.len(), 6);
    }

    fn prepared() -> ResultCollection {
        let mut collection = ResultCollection::new();
        collection.add_web_hits("google", &hits(&["http://a", "http://b", "http://c", "http://list"]));
        collection.retrieve_articles(&StubRetriever);
        collection.detect_mentions(&StubRecognizer);
        collection
    }

    #[test]
    fn test_filtering_is_idempotent_and_monotonic() {
        let d = |m, day| NaiveDate::from_ymd_opt(2012, m, day).unwrap();
        let settings = FilterSettings::new(
            Some(Language::Fr),
            Some("Hollande"),
            DateWindow::new(Some(d(5, 1)), Some(d(5, 6))),
            true,
            true,
        )
        .unwrap();

        let mut collection = prepared();
        let mut counts = vec![collection.alive_count()];
        collection.filter_by_content(&settings);
        counts.push(collection.alive_count());
        collection.filter_by_entity(&settings);
        counts.push(collection.alive_count());
        assert!(counts.windows(2).all(|w| w[1] <= w[0]));

        let statuses = |c: &ResultCollection| c.iter().map(|r| r.status).collect::<Vec<_>>();
        let first = statuses(&collection);
        collection.filter_by_content(&settings);
        collection.filter_by_entity(&settings);
        assert_eq!(statuses(&collection), first);
    }

    #[test]
    fn test_too_few_articles_get_na() {
        let mut collection = ResultCollection::new();
        collection.add_web_hits("google", &hits(&["http://a", "http://b", "http://list"]));
        collection.retrieve_articles(&StubRetriever);
        let outcome = collection.cluster_articles(&HierarchicalPartitioner, Some(Language::Fr), true);
        assert!(outcome.is_none());
        assert_eq!(collection.get("http://a").unwrap().cluster.as_deref(), Some(UNCLUSTERED_ID));
        assert_eq!(collection.get("http://list").unwrap().cluster, None);
    }

    #[test]
    fn test_every_survivor_gets_one_cluster() {
        let mut collection = prepared();
        let outcome = collection
            .cluster_articles(&HierarchicalPartitioner, Some(Language::Fr), true)
            .unwrap();
        assert_eq!(outcome.assignments.len(), 3);
        for result in collection.iter() {
            assert_eq!(result.cluster.is_some(), result.is_alive());
        }
    }

    #[test]
    fn test_event_extraction_and_clustering() {
        let mut collection = prepared();
        let extractor = EventExtractor::new(&UnicodeSentenceSplitter);
        assert_eq!(collection.extract_events(&extractor, ExtractionMode::ByArticle), 3);

        let clustering = collection.cluster_events(&HierarchicalPartitioner);
        assert!(clustering.silhouette.is_some());
        let members: usize = clustering.clusters.iter().map(|c| c.members.len()).sum();
        assert_eq!(members, 3);
        for event_ref in collection.event_refs() {
            assert!(collection.event(&event_ref).unwrap().cluster.is_some());
        }
    }

    #[test]
    fn test_event_clustering_needs_two_events() {
        let mut collection = ResultCollection::new();
        collection.add_web_hits("google", &hits(&["http://a"]));
        collection.retrieve_articles(&StubRetriever);
        collection.detect_mentions(&StubRecognizer);
        let extractor = EventExtractor::new(&UnicodeSentenceSplitter);
        collection.extract_events(&extractor, ExtractionMode::ByArticle);
        assert_eq!(collection.cluster_events(&HierarchicalPartitioner), EventClustering::default());
    }

    #[test]
    fn test_no_event_filter() {
        let mut collection = prepared();
        collection.filter_by_event();
        assert_eq!(collection.alive_count(), 0);
        assert_eq!(collection.get("http://a").unwrap().status, Some(ResultStatus::NoEvent));
        assert_eq!(collection.get("http://list").unwrap().status, Some(ResultStatus::List));
    }

    #[test]
    fn test_combine() {
        let mut web = ResultCollection::new();
        web.add_web_hits("google", &hits(&["http://a"]));
        let mut refs = ReferenceClusters::new();
        refs.insert("1@twitter", None);
        let mut social = ResultCollection::new();
        social.set_references(refs);
        social.add_social_posts(
            "twitter",
            &[SocialPost {
                id: "1".into(),
                source: "twitter".into(),
                content: "Bonjour".into(),
                ..Default::default()
            }],
            false,
        );
        let combined = ResultCollection::combine(&web, &social);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined.engines().len(), 2);
        assert!(combined.references().is_reviewed("1@twitter"));
    }
}
