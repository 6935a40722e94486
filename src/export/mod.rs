pub mod csv;
pub mod tables;

pub use csv::CsvTable;
pub use tables::{
    confusion_table, event_clusters_table, events_table, performance_table, results_table,
};

use std::path::{Path, PathBuf};

use crate::events::ExtractionMode;

pub const TARGET_EXPORT: &str = "export";

// Pass folders
pub const WEB_FOLDER: &str = "web";
pub const SOCIAL_FOLDER: &str = "social";
pub const COMBINED_FOLDER: &str = "combined";

// Step file suffixes
pub const FILE_ARTICLES_RAW: &str = "articles_raw.csv";
pub const FILE_ARTICLES_URL_FILTER: &str = "articles_url_filter.csv";
pub const FILE_ARTICLES_CONTENT_FILTER: &str = "articles_content_filter.csv";
pub const FILE_ARTICLES_ENTITY_FILTER: &str = "articles_entity_filter.csv";
pub const FILE_ARTICLES_CLUSTERING: &str = "articles_clustering.csv";
pub const FILE_ARTICLES_CONFMAT: &str = "articles_clustering_confmat.csv";
pub const FILE_ARTICLES_MERGE: &str = "articles_merge.csv";
pub const FILE_ARTICLES_CLUSTER_FILTER: &str = "articles_cluster_filter.csv";
pub const FILE_PERFORMANCE: &str = "performance.csv";

pub fn event_list_file(mode: ExtractionMode) -> String {
    format!("event_list_{}.csv", mode.label())
}

pub fn event_clusters_file(mode: ExtractionMode) -> String {
    format!("event_clusters_{}.csv", mode.label())
}

/// `<folder>/<step>_<suffix>`
pub fn step_path(folder: &Path, step: usize, suffix: &str) -> PathBuf {
    folder.join(format!("{}_{}", step, suffix))
}
