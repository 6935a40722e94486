use std::collections::{BTreeSet, HashMap};

use super::csv::CsvTable;
use crate::article::Language;
use crate::entity::{DateWindow, EntityType};
use crate::evaluation::{ConfusionMatrix, PerformanceLog};
use crate::events::{Event, ReferenceClusters, ReferenceEvents};
use crate::result::{EventClustering, ResultCollection, ResultSource, SearchResult};
use crate::similarity::tokenize;

pub const COL_NOTES: &str = "Notes";
pub const COL_TITLE_CONTENT: &str = "Title/Content";
pub const COL_URL_ID: &str = "URL/ID";
pub const COL_LENGTH: &str = "Text length";
pub const COL_PUB_DATE: &str = "Publication date";
pub const COL_AUTHORS: &str = "Author(s)";
pub const COL_STATUS: &str = "Status";
pub const COL_ARTICLE_CLUSTER: &str = "Article cluster";
pub const COL_REFERENCE_EVENTS: &str = "Reference events";
pub const COL_SOURCE: &str = "Source";
pub const COL_ORIGINAL: &str = "Original post";
pub const COL_LIKES: &str = "Likes";
pub const COL_SHARES: &str = "Shares";
pub const COL_COMMENTS: &str = "Comments";
pub const COL_RANK_PREFIX: &str = "Rank ";
pub const COL_EVENT_CLUSTER: &str = "Event cluster";
pub const COL_EVENT_RANK: &str = "Event rank";
pub const COL_EVENT_SENTENCE: &str = "Event sentence";
pub const COL_KEYWORDS: &str = "Keywords";
pub const COL_FREQUENCY: &str = "Frequency";

/// Maximum number of keywords listed per event cluster.
pub const MAX_CLUSTER_KEYWORDS: usize = 12;

/// Order of the mention columns in every export.
const MENTION_COLUMNS: [EntityType; EntityType::COUNT] = [
    EntityType::Date,
    EntityType::Location,
    EntityType::Person,
    EntityType::Organization,
    EntityType::Function,
    EntityType::Production,
    EntityType::Meeting,
];

fn mention_header() -> impl Iterator<Item = String> {
    MENTION_COLUMNS.iter().map(|t| t.column_name().to_string())
}

fn join_values<'a>(values: impl IntoIterator<Item = &'a String>) -> String {
    values.into_iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Reference event ids of a result falling within the window, `id:id`.
fn reference_ids(
    references: &ReferenceClusters,
    key: &str,
    events: &ReferenceEvents,
    window: &DateWindow,
) -> String {
    let ids: BTreeSet<u32> = references
        .get(key)
        .flatten()
        .unwrap_or_default()
        .iter()
        .copied()
        .filter(|id| events.get(*id).map_or(false, |e| e.is_within_period(window)))
        .collect();
    ids.iter().map(u32::to_string).collect::<Vec<_>>().join(":")
}

fn metadata_header() -> Vec<String> {
    [
        COL_TITLE_CONTENT,
        COL_URL_ID,
        COL_LENGTH,
        COL_PUB_DATE,
        COL_AUTHORS,
        COL_STATUS,
        COL_ARTICLE_CLUSTER,
        COL_REFERENCE_EVENTS,
        COL_SOURCE,
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

/// Cells matching [`metadata_header`].
fn metadata_cells(
    result: &SearchResult,
    references: &ReferenceClusters,
    events: &ReferenceEvents,
    window: &DateWindow,
) -> Vec<String> {
    let article = result.article.as_ref();
    let title = match &result.source {
        ResultSource::Web { .. } => article.map(|a| a.title.clone()).unwrap_or_default(),
        ResultSource::Social { post, .. } => post.content.clone(),
    };
    let source = match &result.source {
        ResultSource::Web { .. } => "web".to_string(),
        ResultSource::Social { post, .. } => post.source.clone(),
    };
    vec![
        title,
        result.url().unwrap_or(&result.key).to_string(),
        optional(article.map(|a| a.text_length())),
        optional(article.and_then(|a| a.publication_date)),
        article.map(|a| a.authors.join(", ")).unwrap_or_default(),
        optional(result.status),
        result.cluster.clone().unwrap_or_default(),
        reference_ids(references, &result.key, events, window),
        source,
    ]
}

/// One row per result, rejected ones included.
pub fn results_table(collection: &ResultCollection, events: &ReferenceEvents, window: &DateWindow) -> CsvTable {
    let engines = collection.engines();
    let mut header = vec![COL_NOTES.to_string()];
    header.extend(metadata_header());
    header.extend([COL_ORIGINAL, COL_LIKES, COL_SHARES, COL_COMMENTS].map(String::from));
    header.extend(engines.iter().map(|e| format!("{}{}", COL_RANK_PREFIX, e)));
    header.extend(mention_header());

    let mut table = CsvTable::new(header);
    for result in collection.iter() {
        let mut row = vec![String::new()];
        row.extend(metadata_cells(result, collection.references(), events, window));
        match &result.source {
            ResultSource::Social { post, .. } => row.extend([
                post.original.to_string(),
                optional(post.likes),
                optional(post.shares),
                post.comments.len().to_string(),
            ]),
            ResultSource::Web { .. } => row.extend(vec![String::new(); 4]),
        }
        let ranks = result.ranks();
        row.extend(engines.iter().map(|e| ranks.get(e).cloned().unwrap_or_default()));
        row.extend(
            MENTION_COLUMNS
                .iter()
                .map(|t| join_values(&result.mentions.values(*t))),
        );
        table.push(row);
    }
    table
}

fn event_mention_cells(event: &Event) -> Vec<String> {
    MENTION_COLUMNS
        .iter()
        .map(|t| match t {
            EntityType::Date => event.period.to_string(),
            named => join_values(event.values(*named)),
        })
        .collect()
}

/// One row per extracted event with the metadata of its result.
pub fn events_table(collection: &ResultCollection, events: &ReferenceEvents, window: &DateWindow) -> CsvTable {
    let mut header = vec![COL_NOTES.to_string(), COL_EVENT_CLUSTER.to_string()];
    header.extend(metadata_header());
    header.extend([COL_EVENT_RANK, COL_EVENT_SENTENCE].map(String::from));
    header.extend(mention_header());

    let mut table = CsvTable::new(header);
    for result in collection.iter() {
        let metadata = metadata_cells(result, collection.references(), events, window);
        for (rank, event) in result.events.iter().enumerate() {
            let mut row = vec![String::new(), event.cluster.clone().unwrap_or_default()];
            row.extend(metadata.iter().cloned());
            row.push((rank + 1).to_string());
            row.push(event.text.clone());
            row.extend(event_mention_cells(event));
            table.push(row);
        }
    }
    table
}

/// Most frequent tokens over the texts, ties broken alphabetically.
pub fn top_keywords<'a>(texts: impl IntoIterator<Item = &'a str>, language: Option<Language>, limit: usize) -> Vec<String> {
    let mut frequencies: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for token in tokenize(text, language) {
            *frequencies.entry(token).or_insert(0) += 1;
        }
    }
    let mut sorted: Vec<(String, usize)> = frequencies.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.into_iter().take(limit).map(|(token, _)| token).collect()
}

/// One row per event cluster: member count, merged mentions and keywords.
pub fn event_clusters_table(
    collection: &ResultCollection,
    clustering: &EventClustering,
    language: Option<Language>,
) -> CsvTable {
    let mut header = vec![
        COL_NOTES.to_string(),
        COL_EVENT_CLUSTER.to_string(),
        COL_KEYWORDS.to_string(),
        COL_FREQUENCY.to_string(),
    ];
    header.extend(mention_header());

    let mut table = CsvTable::new(header);
    for cluster in &clustering.clusters {
        let members: Vec<&Event> = cluster
            .members
            .iter()
            .filter_map(|r| collection.event(r))
            .collect();
        let keywords = top_keywords(members.iter().map(|e| e.text.as_str()), language, MAX_CLUSTER_KEYWORDS);

        let mut row = vec![
            String::new(),
            cluster.id.clone(),
            keywords.join(", "),
            members.len().to_string(),
        ];
        for entity_type in MENTION_COLUMNS {
            let values: BTreeSet<String> = match entity_type {
                EntityType::Date => members.iter().map(|e| e.period.to_string()).collect(),
                named => members
                    .iter()
                    .flat_map(|e| e.values(named).iter().cloned())
                    .collect(),
            };
            row.push(join_values(&values));
        }
        table.push(row);
    }
    table
}

pub fn performance_table(log: &PerformanceLog) -> CsvTable {
    let mut table = CsvTable::new(PerformanceLog::header());
    for row in log.rows() {
        table.push(row);
    }
    table
}

pub fn confusion_table(matrix: &ConfusionMatrix) -> CsvTable {
    let mut table = CsvTable::new(matrix.header());
    for row in matrix.rows() {
        table.push(row);
    }
    table
}
