use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

use crate::article::Language;
use crate::clustering::ClusteringStrategy;
use crate::entity::DateWindow;
use crate::environment::{get_env_var, get_env_var_as_bool, get_env_var_as_vec, get_env_var_or};
use crate::result::FilterSettings;

/// Parameters of one extraction run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Query handed to the search engines.
    pub keywords: String,
    /// Names of the engines to query; empty means every registered engine.
    pub engines: Vec<String>,
    pub language: Option<Language>,
    /// Expression every kept article must contain.
    pub compulsory: Option<String>,
    pub window: DateWindow,
    pub filter_by_publication_date: bool,
    pub filter_by_entity_date: bool,
    pub strategy: ClusteringStrategy,
    pub use_sqrt_dot: bool,
    pub consensus_threshold: f64,
    /// Appends comments to the text of social posts.
    pub include_comments: bool,
    /// Rejects results that yield no event.
    pub exclude_eventless: bool,
    /// Uses the publication date when an article has no date mention.
    pub publication_date_fallback: bool,
    pub output_folder: PathBuf,
    pub annotation_folder: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            keywords: String::new(),
            engines: Vec::new(),
            language: None,
            compulsory: None,
            window: DateWindow::default(),
            filter_by_publication_date: true,
            filter_by_entity_date: true,
            strategy: ClusteringStrategy::default(),
            use_sqrt_dot: true,
            consensus_threshold: 1.0,
            include_comments: false,
            exclude_eventless: false,
            publication_date_fallback: true,
            output_folder: PathBuf::from("output"),
            annotation_folder: PathBuf::from("annotations"),
        }
    }
}

fn parse_optional<T: FromStr>(var: &str) -> Option<T> {
    let value = get_env_var(var)?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring invalid value '{}' for {}", value, var);
            None
        }
    }
}

impl PipelineConfig {
    /// Reads `EVENTSCOPE_*` variables, keeping the defaults for unset ones.
    pub fn from_env() -> Self {
        let defaults = PipelineConfig::default();
        PipelineConfig {
            keywords: get_env_var("EVENTSCOPE_KEYWORDS").unwrap_or(defaults.keywords),
            engines: get_env_var_as_vec("EVENTSCOPE_ENGINES", ','),
            language: parse_optional("EVENTSCOPE_LANGUAGE"),
            compulsory: get_env_var("EVENTSCOPE_COMPULSORY"),
            window: DateWindow::new(
                parse_optional::<NaiveDate>("EVENTSCOPE_START"),
                parse_optional::<NaiveDate>("EVENTSCOPE_END"),
            ),
            filter_by_publication_date: get_env_var_as_bool(
                "EVENTSCOPE_FILTER_PUB_DATE",
                defaults.filter_by_publication_date,
            ),
            filter_by_entity_date: get_env_var_as_bool(
                "EVENTSCOPE_FILTER_ENT_DATE",
                defaults.filter_by_entity_date,
            ),
            strategy: get_env_var_or("EVENTSCOPE_STRATEGY", defaults.strategy),
            use_sqrt_dot: get_env_var_as_bool("EVENTSCOPE_SQRT_DOT", defaults.use_sqrt_dot),
            consensus_threshold: get_env_var_or(
                "EVENTSCOPE_CONSENSUS_THRESHOLD",
                defaults.consensus_threshold,
            ),
            include_comments: get_env_var_as_bool(
                "EVENTSCOPE_INCLUDE_COMMENTS",
                defaults.include_comments,
            ),
            exclude_eventless: get_env_var_as_bool(
                "EVENTSCOPE_EXCLUDE_EVENTLESS",
                defaults.exclude_eventless,
            ),
            publication_date_fallback: get_env_var_as_bool(
                "EVENTSCOPE_PUB_DATE_FALLBACK",
                defaults.publication_date_fallback,
            ),
            output_folder: get_env_var("EVENTSCOPE_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_folder),
            annotation_folder: get_env_var("EVENTSCOPE_ANNOTATIONS")
                .map(PathBuf::from)
                .unwrap_or(defaults.annotation_folder),
        }
    }

    /// Engine names compare case-insensitively.
    pub fn uses_engine(&self, name: &str) -> bool {
        self.engines.is_empty() || self.engines.iter().any(|e| e.eq_ignore_ascii_case(name))
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.consensus_threshold) {
            bail!(
                "Consensus threshold must be within [0, 1], got {}",
                self.consensus_threshold
            );
        }
        if let (Some(start), Some(end)) = (self.window.start, self.window.end) {
            if start > end {
                bail!("Start date {} is after end date {}", start, end);
            }
        }
        Ok(())
    }

    /// Settings of the web pass filters.
    pub fn filter_settings(&self) -> Result<FilterSettings> {
        FilterSettings::new(
            self.language,
            self.compulsory.as_deref(),
            self.window,
            self.filter_by_publication_date,
            self.filter_by_entity_date,
        )
    }

    /// Social posts are dated by the platform, so the publication date filter
    /// never applies to them.
    pub fn social_filter_settings(&self) -> Result<FilterSettings> {
        let mut settings = self.filter_settings()?;
        settings.by_publication_date = false;
        Ok(settings)
    }
}
