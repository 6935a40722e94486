use super::items::PartitionScores;
use super::metrics::Counts;
use super::relevance::RelevanceScores;

/// Clustering metrics of one level (articles or events).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClusterScores {
    pub silhouette: Option<f64>,
    pub partition: Option<PartitionScores>,
    pub matching: Option<Counts>,
}

/// Metrics recorded after one pipeline step. Clustering metrics stay empty
/// for steps that did not cluster.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceRecord {
    pub step: String,
    pub relevance: RelevanceScores,
    pub articles: ClusterScores,
    pub events: ClusterScores,
}

/// Ordered log of the performance records of one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceLog {
    records: Vec<PerformanceRecord>,
}

fn count_columns(prefix: &str) -> Vec<String> {
    ["TP", "FP", "FN", "Precision", "Recall", "F-Measure"]
        .iter()
        .map(|name| format!("{} {}", prefix, name))
        .collect()
}

fn cluster_columns(level: &str) -> Vec<String> {
    let reference = format!("{}-Ref", level);
    let mut columns = vec![
        format!("{} Silhouette", level),
        format!("{} Rand index", reference),
        format!("{} Adjusted Rand index", reference),
        format!("{} Normalized Mutual Information", reference),
    ];
    columns.extend(count_columns(&reference));
    columns
}

fn count_cells(counts: Option<&Counts>) -> Vec<String> {
    match counts {
        Some(c) => vec![
            c.tp.to_string(),
            c.fp.to_string(),
            c.fn_.to_string(),
            format_score(c.precision()),
            format_score(c.recall()),
            format_score(c.f_measure()),
        ],
        None => vec![String::new(); 6],
    }
}

fn cluster_cells(scores: &ClusterScores) -> Vec<String> {
    let optional = |value: Option<f64>| value.map(format_score).unwrap_or_default();
    let mut cells = vec![
        optional(scores.silhouette),
        optional(scores.partition.map(|p| p.rand)),
        optional(scores.partition.map(|p| p.adjusted_rand)),
        optional(scores.partition.map(|p| p.nmi)),
    ];
    cells.extend(count_cells(scores.matching.as_ref()));
    cells
}

pub fn format_score(value: f64) -> String {
    format!("{:.4}", value)
}

impl PerformanceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: PerformanceRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[PerformanceRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&PerformanceRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn header() -> Vec<String> {
        let mut columns = vec!["Step".to_string()];
        columns.extend(count_columns("Theme"));
        columns.extend(count_columns("Theme-time"));
        columns.extend(cluster_columns("Article"));
        columns.extend(cluster_columns("Event"));
        columns
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.records
            .iter()
            .map(|record| {
                let mut row = vec![record.step.clone()];
                row.extend(count_cells(Some(&record.relevance.theme)));
                row.extend(count_cells(Some(&record.relevance.theme_time)));
                row.extend(cluster_cells(&record.articles));
                row.extend(cluster_cells(&record.events));
                row
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_match_header() {
        let mut log = PerformanceLog::new();
        log.push(PerformanceRecord {
            step: "1_articles_raw".to_string(),
            ..Default::default()
        });
        log.push(PerformanceRecord {
            step: "5_articles_clustering".to_string(),
            relevance: RelevanceScores {
                theme: Counts::new(3, 1, 0),
                theme_time: Counts::new(2, 2, 1),
            },
            articles: ClusterScores {
                silhouette: Some(0.5),
                partition: None,
                matching: Some(Counts::new(1, 1, 1)),
            },
            events: ClusterScores::default(),
        });

        let header = PerformanceLog::header();
        assert_eq!(header.len(), 1 + 6 + 6 + 10 + 10);
        assert_eq!(header[1], "Theme TP");
        assert_eq!(header[13], "Article Silhouette");
        assert_eq!(header[16], "Article-Ref Normalized Mutual Information");

        let rows = log.rows();
        assert!(rows.iter().all(|row| row.len() == header.len()));
        assert_eq!(rows[1][1], "3");
        assert_eq!(rows[1][4], "0.7500");
        assert_eq!(rows[1][13], "0.5000");
        assert_eq!(rows[1][14], "");
        assert_eq!(rows[0][23], "");
    }
}
