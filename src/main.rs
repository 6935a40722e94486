use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use prettytable::{Cell, Row, Table};
use std::path::PathBuf;
use tracing::info;

use eventscope::clustering::ClusteringStrategy;
use eventscope::collaborators::UnicodeSentenceSplitter;
use eventscope::corpus::JsonCorpus;
use eventscope::evaluation::performance::format_score;
use eventscope::logging::configure_logging;
use eventscope::{ExtractionReport, Language, PipelineConfig, Searcher};

#[derive(Parser, Debug)]
#[clap(
    name = "eventscope",
    about = "Filter, cluster and score search results about a person's public events"
)]
struct Cli {
    /// Recorded engine outputs, articles and mentions
    #[clap(long)]
    corpus: PathBuf,

    /// Output folder of the CSV exports
    #[clap(long)]
    output: Option<PathBuf>,

    /// Folder holding annotated_events.txt and annotated_clusters.txt
    #[clap(long)]
    annotations: Option<PathBuf>,

    /// Search keywords
    #[clap(long)]
    keywords: Option<String>,

    /// Engines to query, comma separated (all of the corpus by default)
    #[clap(long, value_delimiter = ',')]
    engines: Vec<String>,

    /// Targeted language (en, fr, de, es, it)
    #[clap(long)]
    language: Option<Language>,

    /// Expression every kept article must contain
    #[clap(long)]
    compulsory: Option<String>,

    /// Start of the period (yyyy-mm-dd)
    #[clap(long)]
    start: Option<NaiveDate>,

    /// End of the period (yyyy-mm-dd)
    #[clap(long)]
    end: Option<NaiveDate>,

    /// Filter articles by publication date
    #[clap(long)]
    filter_pub_date: Option<bool>,

    /// Filter articles by the dates they mention
    #[clap(long)]
    filter_ent_date: Option<bool>,

    /// Partitioning strategy (hierarchical or medoids)
    #[clap(long)]
    strategy: Option<ClusteringStrategy>,

    /// Use the standard dot product in the TF-IDF cosine
    #[clap(long)]
    standard_dot: bool,

    /// Minimal share of a cluster that must mention a value to keep it
    #[clap(long)]
    consensus_threshold: Option<f64>,
}

impl Cli {
    /// Command-line values take precedence over the environment.
    fn apply(self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(output) = self.output {
            config.output_folder = output;
        }
        if let Some(annotations) = self.annotations {
            config.annotation_folder = annotations;
        }
        if let Some(keywords) = self.keywords {
            config.keywords = keywords;
        }
        if !self.engines.is_empty() {
            config.engines = self.engines;
        }
        if self.language.is_some() {
            config.language = self.language;
        }
        if self.compulsory.is_some() {
            config.compulsory = self.compulsory;
        }
        if self.start.is_some() {
            config.window.start = self.start;
        }
        if self.end.is_some() {
            config.window.end = self.end;
        }
        if let Some(enabled) = self.filter_pub_date {
            config.filter_by_publication_date = enabled;
        }
        if let Some(enabled) = self.filter_ent_date {
            config.filter_by_entity_date = enabled;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if self.standard_dot {
            config.use_sqrt_dot = false;
        }
        if let Some(threshold) = self.consensus_threshold {
            config.consensus_threshold = threshold;
        }
        config
    }
}

fn print_summary(report: &ExtractionReport) {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Pass"),
        Cell::new("Results"),
        Cell::new("Kept"),
        Cell::new("Theme F"),
        Cell::new("Theme-time F"),
    ]));
    for pass in report.passes() {
        let (theme, theme_time) = pass
            .performance
            .last()
            .map(|r| {
                (
                    format_score(r.relevance.theme.f_measure()),
                    format_score(r.relevance.theme_time.f_measure()),
                )
            })
            .unwrap_or_default();
        table.add_row(Row::new(vec![
            Cell::new(pass.name),
            Cell::new(&pass.collection.len().to_string()),
            Cell::new(&pass.collection.alive_count().to_string()),
            Cell::new(&theme),
            Cell::new(&theme_time),
        ]));
    }
    table.printstd();
}

fn main() -> Result<()> {
    configure_logging();

    let cli = Cli::parse();
    let corpus = JsonCorpus::load(&cli.corpus)?;
    let config = cli.apply(PipelineConfig::from_env());
    info!("Running with {:?}", config);

    let web_engines = corpus.web_engines();
    let social_engines = corpus.social_engines();
    let splitter = UnicodeSentenceSplitter;

    let mut searcher = Searcher::new(config, &corpus, &corpus, &splitter);
    for engine in &web_engines {
        searcher = searcher.with_web_engine(engine);
    }
    for engine in &social_engines {
        searcher = searcher.with_social_engine(engine);
    }

    let report = searcher.perform_extraction()?;
    print_summary(&report);
    Ok(())
}
