pub mod items;
pub mod matching;
pub mod metrics;
pub mod performance;
pub mod relevance;

pub use items::{article_items, event_items, partition_scores, reference_columns, PartitionScores, ScoredItem};
pub use matching::{match_clusters, ClusterMatching, ConfusionMatrix};
pub use metrics::Counts;
pub use performance::{ClusterScores, PerformanceLog, PerformanceRecord};
pub use relevance::{relevance, RelevanceScores};

use tracing::info;

use crate::entity::DateWindow;
use crate::events::ReferenceEvents;
use crate::result::{EventClustering, ResultCollection};

pub const TARGET_EVAL: &str = "evaluation";

/// Scores pipeline steps against the manual annotations of one run.
pub struct Evaluator<'a> {
    events: &'a ReferenceEvents,
    window: DateWindow,
}

impl<'a> Evaluator<'a> {
    pub fn new(events: &'a ReferenceEvents, window: DateWindow) -> Self {
        Evaluator { events, window }
    }

    /// Relevance only, after a filtering step.
    pub fn filtering_step(&self, step: &str, collection: &ResultCollection) -> PerformanceRecord {
        let record = PerformanceRecord {
            step: step.to_string(),
            relevance: relevance(collection, self.events, &self.window),
            ..Default::default()
        };
        self.log(&record);
        record
    }

    /// Relevance plus article clustering quality.
    ///
    /// # Returns
    /// * The record and the confusion matrix to export
    pub fn article_clustering_step(
        &self,
        step: &str,
        collection: &ResultCollection,
        silhouette: Option<f64>,
    ) -> (PerformanceRecord, ConfusionMatrix) {
        let items = article_items(collection, self.events, &self.window);
        let matching = match_clusters(&items, &reference_columns(self.events, &self.window));
        let record = PerformanceRecord {
            step: step.to_string(),
            relevance: relevance(collection, self.events, &self.window),
            articles: ClusterScores {
                silhouette,
                partition: partition_scores(&items),
                matching: Some(matching.counts),
            },
            ..Default::default()
        };
        self.log(&record);
        (record, matching.confusion)
    }

    /// Relevance plus event clustering quality.
    pub fn event_clustering_step(
        &self,
        step: &str,
        collection: &ResultCollection,
        clustering: &EventClustering,
    ) -> PerformanceRecord {
        let items = event_items(collection, self.events, &self.window);
        let matching = match_clusters(&items, &reference_columns(self.events, &self.window));
        let record = PerformanceRecord {
            step: step.to_string(),
            relevance: relevance(collection, self.events, &self.window),
            events: ClusterScores {
                silhouette: clustering.silhouette,
                partition: partition_scores(&items),
                matching: Some(matching.counts),
            },
            ..Default::default()
        };
        self.log(&record);
        record
    }

    fn log(&self, record: &PerformanceRecord) {
        info!(
            target: TARGET_EVAL,
            "{}: theme F={:.4}, theme-time F={:.4}",
            record.step,
            record.relevance.theme.f_measure(),
            record.relevance.theme_time.f_measure()
        );
    }
}
