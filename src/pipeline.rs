//! Orchestration of the web, social and combined passes: every stage runs
//! over the whole collection, is exported to a numbered file and scored
//! against the manual annotations.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::clustering::{PartitionOutcome, Partitioner};
use crate::collaborators::{ArticleRetriever, Recognizer, SentenceSplitter, SocialSearchEngine, WebSearchEngine};
use crate::config::PipelineConfig;
use crate::entity::DateWindow;
use crate::evaluation::{Evaluator, PerformanceLog, PerformanceRecord};
use crate::events::reference::{ANNOTATED_CLUSTERS_FILE, ANNOTATED_EVENTS_FILE};
use crate::events::{EventExtractor, ExtractionMode, ReferenceClusters, ReferenceEvents};
use crate::export::{self, CsvTable};
use crate::result::{FilterSettings, ResultCollection};

pub const TARGET_PIPELINE: &str = "pipeline";

/// Final state of one pass.
#[derive(Debug, Clone)]
pub struct PassReport {
    pub name: &'static str,
    pub collection: ResultCollection,
    pub performance: PerformanceLog,
}

#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub web: PassReport,
    pub social: PassReport,
    pub combined: PassReport,
}

impl ExtractionReport {
    pub fn passes(&self) -> [&PassReport; 3] {
        [&self.web, &self.social, &self.combined]
    }
}

/// Numbered exports and performance records of one pass.
struct PassContext<'a> {
    name: &'static str,
    folder: PathBuf,
    step: usize,
    evaluator: &'a Evaluator<'a>,
    events: &'a ReferenceEvents,
    window: DateWindow,
    log: PerformanceLog,
}

impl<'a> PassContext<'a> {
    fn new(
        name: &'static str,
        output: &Path,
        evaluator: &'a Evaluator<'a>,
        events: &'a ReferenceEvents,
        window: DateWindow,
    ) -> Self {
        PassContext {
            name,
            folder: output.join(name),
            step: 0,
            evaluator,
            events,
            window,
            log: PerformanceLog::new(),
        }
    }

    /// Advances the step counter.
    ///
    /// # Returns
    /// * The step label and the path of its export
    fn next_step(&mut self, suffix: &str) -> (String, PathBuf) {
        self.step += 1;
        let path = export::step_path(&self.folder, self.step, suffix);
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}_{}", self.step, suffix));
        (label, path)
    }

    fn write(&self, table: &CsvTable, path: &Path) {
        if let Err(e) = table.write(path) {
            error!(target: export::TARGET_EXPORT, "{}: {:#}", self.name, e);
        }
    }

    fn record(&mut self, record: PerformanceRecord) {
        self.log.push(record);
    }

    /// Exports the results after a filtering step and scores relevance.
    fn filtering_step(&mut self, suffix: &str, collection: &ResultCollection) {
        let (label, path) = self.next_step(suffix);
        self.write(&export::results_table(collection, self.events, &self.window), &path);
        let record = self.evaluator.filtering_step(&label, collection);
        self.record(record);
    }

    fn article_clustering_step(&mut self, collection: &ResultCollection, outcome: Option<&PartitionOutcome>) {
        let (label, path) = self.next_step(export::FILE_ARTICLES_CLUSTERING);
        self.write(&export::results_table(collection, self.events, &self.window), &path);
        let (record, confusion) = self.evaluator.article_clustering_step(
            &label,
            collection,
            outcome.map(|o| o.silhouette),
        );
        let confmat = export::step_path(&self.folder, self.step, export::FILE_ARTICLES_CONFMAT);
        self.write(&export::confusion_table(&confusion), &confmat);
        self.record(record);
    }

    fn finish(self, collection: ResultCollection) -> PassReport {
        self.write(
            &export::performance_table(&self.log),
            &self.folder.join(export::FILE_PERFORMANCE),
        );
        info!(
            target: TARGET_PIPELINE,
            "{} pass done: {}/{} results kept, {} steps recorded",
            self.name,
            collection.alive_count(),
            collection.len(),
            self.log.len()
        );
        PassReport {
            name: self.name,
            collection,
            performance: self.log,
        }
    }
}

/// Runs the whole extraction over the given collaborators.
pub struct Searcher<'a> {
    config: PipelineConfig,
    web_engines: Vec<&'a dyn WebSearchEngine>,
    social_engines: Vec<&'a dyn SocialSearchEngine>,
    retriever: &'a dyn ArticleRetriever,
    recognizer: &'a dyn Recognizer,
    splitter: &'a dyn SentenceSplitter,
}

impl<'a> Searcher<'a> {
    pub fn new(
        config: PipelineConfig,
        retriever: &'a dyn ArticleRetriever,
        recognizer: &'a dyn Recognizer,
        splitter: &'a dyn SentenceSplitter,
    ) -> Self {
        Searcher {
            config,
            web_engines: Vec::new(),
            social_engines: Vec::new(),
            retriever,
            recognizer,
            splitter,
        }
    }

    pub fn with_web_engine(mut self, engine: &'a dyn WebSearchEngine) -> Self {
        self.web_engines.push(engine);
        self
    }

    pub fn with_social_engine(mut self, engine: &'a dyn SocialSearchEngine) -> Self {
        self.social_engines.push(engine);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn selects(&self, engine: &str) -> bool {
        let selected = self.config.uses_engine(engine);
        if !selected {
            debug!(target: TARGET_PIPELINE, "{}: not among the selected engines", engine);
        }
        selected
    }

    /// Loads the annotations, runs the three passes and writes their
    /// exports under the output folder.
    pub fn perform_extraction(&self) -> Result<ExtractionReport> {
        self.config.validate()?;
        let web_settings = self.config.filter_settings()?;
        let social_settings = self.config.social_filter_settings()?;
        info!(
            target: TARGET_PIPELINE,
            "Searching '{}' within {} ({} strategy)",
            self.config.keywords,
            self.config.window,
            self.config.strategy
        );

        let folder = &self.config.annotation_folder;
        let events = ReferenceEvents::load(&folder.join(ANNOTATED_EVENTS_FILE))?;
        let references = ReferenceClusters::load(&folder.join(ANNOTATED_CLUSTERS_FILE), &events)?;
        let evaluator = Evaluator::new(&events, self.config.window);
        let partitioner = self.config.strategy.partitioner();

        let context = |name| {
            PassContext::new(name, &self.config.output_folder, &evaluator, &events, self.config.window)
        };

        let web = self.web_pass(context(export::WEB_FOLDER), &web_settings, &references, partitioner.as_ref());
        let social = self.social_pass(
            context(export::SOCIAL_FOLDER),
            &social_settings,
            &references,
            partitioner.as_ref(),
        );
        let combined = self.combined_pass(
            context(export::COMBINED_FOLDER),
            &web.collection,
            &social.collection,
            partitioner.as_ref(),
        );

        Ok(ExtractionReport { web, social, combined })
    }

    fn web_pass(
        &self,
        mut ctx: PassContext<'_>,
        settings: &FilterSettings,
        references: &ReferenceClusters,
        partitioner: &dyn Partitioner,
    ) -> PassReport {
        let mut collection = ResultCollection::new();
        collection.set_references(references.clone());
        for engine in self.web_engines.iter().filter(|e| self.selects(e.name())) {
            match engine.search(&self.config.keywords, &self.config.window) {
                Ok(hits) => collection.add_web_hits(engine.name(), &hits),
                Err(e) => warn!(target: TARGET_PIPELINE, "{} search failed: {:#}", engine.name(), e),
            }
        }
        ctx.filtering_step(export::FILE_ARTICLES_RAW, &collection);

        collection.filter_by_url();
        ctx.filtering_step(export::FILE_ARTICLES_URL_FILTER, &collection);

        collection.retrieve_articles(self.retriever);
        collection.filter_by_content(settings);
        ctx.filtering_step(export::FILE_ARTICLES_CONTENT_FILTER, &collection);

        collection.detect_mentions(self.recognizer);
        collection.filter_by_entity(settings);
        ctx.filtering_step(export::FILE_ARTICLES_ENTITY_FILTER, &collection);

        self.cluster_and_extract(&mut ctx, &mut collection, partitioner);
        ctx.finish(collection)
    }

    fn social_pass(
        &self,
        mut ctx: PassContext<'_>,
        settings: &FilterSettings,
        references: &ReferenceClusters,
        partitioner: &dyn Partitioner,
    ) -> PassReport {
        let mut collection = ResultCollection::new();
        collection.set_references(references.clone());
        for engine in self.social_engines.iter().filter(|e| self.selects(e.name())) {
            match engine.search(&self.config.keywords, &self.config.window) {
                Ok(posts) => collection.add_social_posts(engine.name(), &posts, self.config.include_comments),
                Err(e) => warn!(target: TARGET_PIPELINE, "{} search failed: {:#}", engine.name(), e),
            }
        }
        ctx.filtering_step(export::FILE_ARTICLES_RAW, &collection);

        collection.filter_by_content(settings);
        ctx.filtering_step(export::FILE_ARTICLES_CONTENT_FILTER, &collection);

        collection.detect_mentions(self.recognizer);
        collection.filter_by_entity(settings);
        ctx.filtering_step(export::FILE_ARTICLES_ENTITY_FILTER, &collection);

        self.cluster_and_extract(&mut ctx, &mut collection, partitioner);
        ctx.finish(collection)
    }

    fn combined_pass(
        &self,
        mut ctx: PassContext<'_>,
        web: &ResultCollection,
        social: &ResultCollection,
        partitioner: &dyn Partitioner,
    ) -> PassReport {
        let mut collection = ResultCollection::combine(web, social);
        collection.reset_clusters();
        ctx.filtering_step(export::FILE_ARTICLES_MERGE, &collection);

        self.cluster_and_extract(&mut ctx, &mut collection, partitioner);

        collection.filter_by_cluster(self.config.consensus_threshold);
        ctx.filtering_step(export::FILE_ARTICLES_CLUSTER_FILTER, &collection);
        self.extract_and_cluster_events(&mut ctx, &mut collection, partitioner);

        ctx.finish(collection)
    }

    fn cluster_and_extract(
        &self,
        ctx: &mut PassContext<'_>,
        collection: &mut ResultCollection,
        partitioner: &dyn Partitioner,
    ) {
        let outcome = collection.cluster_articles(partitioner, self.config.language, self.config.use_sqrt_dot);
        ctx.article_clustering_step(collection, outcome.as_ref());
        self.extract_and_cluster_events(ctx, collection, partitioner);
    }

    /// Events by article then by sentence, each clustered and exported.
    /// Eventless results are rejected after the by-article extraction only,
    /// as an article without such event cannot hold a sentence-level one.
    fn extract_and_cluster_events(
        &self,
        ctx: &mut PassContext<'_>,
        collection: &mut ResultCollection,
        partitioner: &dyn Partitioner,
    ) {
        let extractor =
            EventExtractor::new(self.splitter).with_publication_date_fallback(self.config.publication_date_fallback);

        for mode in [ExtractionMode::ByArticle, ExtractionMode::BySentence] {
            collection.extract_events(&extractor, mode);
            if self.config.exclude_eventless && mode == ExtractionMode::ByArticle {
                collection.filter_by_event();
            }
            let clustering = collection.cluster_events(partitioner);

            let (label, path) = ctx.next_step(&export::event_list_file(mode));
            ctx.write(&export::events_table(collection, ctx.events, &ctx.window), &path);
            let clusters_path = export::step_path(&ctx.folder, ctx.step, &export::event_clusters_file(mode));
            ctx.write(
                &export::event_clusters_table(collection, &clustering, self.config.language),
                &clusters_path,
            );
            let record = ctx.evaluator.event_clustering_step(&label, collection, &clustering);
            ctx.record(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::UnicodeSentenceSplitter;
    use crate::corpus::JsonCorpus;
    use std::fs;
    use tempfile::TempDir;

    const CORPUS: &str = r#"{
        "web": {"google": [
            {"url": "http://a", "rank": "1"}, {"url": "http://b", "rank": "2"},
            {"url": "http://c", "rank": "3"}, {"url": "http://d.pdf", "rank": "4"},
            {"url": "http://list", "rank": "5"}]},
        "social": {"twitter": [
            {"id": "9", "source": "twitter", "content": "Hollande visite Tulle le 6 mai 2012.", "original": true}]},
        "articles": {
            "http://a": {"title": "A", "url": "http://a", "raw_text": "Hollande vote à Tulle le 6 mai 2012.", "language": "fr"},
            "http://b": {"title": "B", "url": "http://b", "raw_text": "Hollande est élu le 6 mai 2012 à Tulle.", "language": "fr"},
            "http://c": {"title": "C", "url": "http://c", "raw_text": "Sarkozy parle à Paris le 6 mai 2012.", "language": "fr"}
        },
        "failures": {"http://list": "not_an_article"},
        "mentions": {
            "http://a": [
                {"type": "PERSON", "start": 0, "end": 8, "text": "Hollande", "value": "hollande"},
                {"type": "LOCATION", "start": 17, "end": 22, "text": "Tulle", "value": "tulle"},
                {"type": "DATE", "start": 26, "end": 36, "text": "6 mai 2012", "value": {"start": "2012-05-06", "end": "2012-05-06"}}],
            "http://b": [
                {"type": "PERSON", "start": 0, "end": 8, "text": "Hollande", "value": "hollande"},
                {"type": "DATE", "start": 19, "end": 29, "text": "6 mai 2012", "value": {"start": "2012-05-06", "end": "2012-05-06"}}],
            "http://c": [
                {"type": "PERSON", "start": 0, "end": 7, "text": "Sarkozy", "value": "sarkozy"},
                {"type": "DATE", "start": 25, "end": 35, "text": "6 mai 2012", "value": {"start": "2012-05-06", "end": "2012-05-06"}}],
            "9": [
                {"type": "PERSON", "start": 0, "end": 8, "text": "Hollande", "value": "hollande"},
                {"type": "DATE", "start": 25, "end": 35, "text": "6 mai 2012", "value": {"start": "2012-05-06", "end": "2012-05-06"}}]
        }
    }"#;

    #[test]
    fn test_perform_extraction_offline() {
        let output = TempDir::new().unwrap();
        let annotations = TempDir::new().unwrap();
        fs::write(annotations.path().join(ANNOTATED_EVENTS_FILE), "1\tElection\t\t2012-05-06\n").unwrap();
        fs::write(
            annotations.path().join(ANNOTATED_CLUSTERS_FILE),
            "http://a\t1\nhttp://b\t1\nhttp://c\t\n9@twitter\t1\n",
        )
        .unwrap();

        let corpus = JsonCorpus::from_json(CORPUS).unwrap();
        let config = PipelineConfig {
            keywords: "François Hollande".to_string(),
            compulsory: Some("Hollande".to_string()),
            window: DateWindow::new(
                chrono::NaiveDate::from_ymd_opt(2012, 5, 6),
                chrono::NaiveDate::from_ymd_opt(2012, 5, 6),
            ),
            output_folder: output.path().to_path_buf(),
            annotation_folder: annotations.path().to_path_buf(),
            ..Default::default()
        };
        let engines = corpus.web_engines();
        let social = corpus.social_engines();
        let splitter = UnicodeSentenceSplitter;
        let searcher = Searcher::new(config, &corpus, &corpus, &splitter)
            .with_web_engine(&engines[0])
            .with_social_engine(&social[0]);

        let report = searcher.perform_extraction().unwrap();

        let web = &report.web.collection;
        assert_eq!(web.len(), 5);
        assert_eq!(web.alive_count(), 2);
        assert_eq!(report.social.collection.alive_count(), 1);
        assert_eq!(report.combined.collection.len(), 6);

        // raw, url, content, entity, clustering, 2 event steps
        assert_eq!(report.web.performance.len(), 7);
        let raw = &report.web.performance.records()[0];
        assert_eq!(raw.step, "1_articles_raw");
        assert_eq!(raw.relevance.theme.tp, 2);

        let web_folder = output.path().join("web");
        for file in [
            "1_articles_raw.csv",
            "2_articles_url_filter.csv",
            "5_articles_clustering.csv",
            "5_articles_clustering_confmat.csv",
            "6_event_list_byarticle.csv",
            "7_event_clusters_bysentence.csv",
            "performance.csv",
        ] {
            assert!(web_folder.join(file).exists(), "missing {}", file);
        }
        assert!(output.path().join("combined").join("1_articles_merge.csv").exists());
    }
}
