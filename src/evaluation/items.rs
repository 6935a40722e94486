use std::collections::BTreeSet;

use super::metrics::{adjusted_rand_index, normalized_mutual_information, rand_index};
use crate::clustering::relabel_by_first_appearance;
use crate::entity::DateWindow;
use crate::events::ReferenceEvents;
use crate::result::ResultCollection;

/// One clustered item (article or event) as seen by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredItem {
    /// Estimated cluster, `None` when the item was rejected or left out.
    pub cluster: Option<String>,
    /// Top-level reference event of the item, `None` when the owning result
    /// was judged irrelevant or never reviewed.
    pub reference: Option<u32>,
}

/// Agreement between the estimated and the reference partitions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionScores {
    pub rand: f64,
    pub adjusted_rand: f64,
    pub nmi: f64,
}

/// One item per result; rejected results have no cluster.
pub fn article_items(
    collection: &ResultCollection,
    events: &ReferenceEvents,
    window: &DateWindow,
) -> Vec<ScoredItem> {
    let references = collection.references();
    collection
        .iter()
        .map(|result| ScoredItem {
            cluster: if result.is_alive() {
                result.cluster.clone()
            } else {
                None
            },
            reference: references.best_event(&result.key, events, window),
        })
        .collect()
}

/// One item per extracted event, inheriting the reference event of the
/// result it was extracted from.
pub fn event_items(
    collection: &ResultCollection,
    events: &ReferenceEvents,
    window: &DateWindow,
) -> Vec<ScoredItem> {
    let references = collection.references();
    collection
        .event_refs()
        .iter()
        .filter_map(|event_ref| {
            let event = collection.event(event_ref)?;
            Some(ScoredItem {
                cluster: event.cluster.clone(),
                reference: references.best_event(&event_ref.key, events, window),
            })
        })
        .collect()
}

/// Top-level reference events within the window, always shown in the
/// confusion matrix.
pub fn reference_columns(events: &ReferenceEvents, window: &DateWindow) -> BTreeSet<u32> {
    events
        .iter()
        .filter(|e| e.parent.map_or(true, |p| !events.contains(p)))
        .filter(|e| e.is_within_period(window))
        .map(|e| e.id)
        .collect()
}

/// Compares the estimated partition with the reference one over the items
/// having both.
///
/// # Returns
/// * `None` when fewer than two items can be compared
pub fn partition_scores(items: &[ScoredItem]) -> Option<PartitionScores> {
    let paired: Vec<(&str, u32)> = items
        .iter()
        .filter_map(|item| Some((item.cluster.as_deref()?, item.reference?)))
        .collect();
    if paired.len() < 2 {
        return None;
    }
    let estimated = relabel_by_first_appearance(&paired.iter().map(|(c, _)| *c).collect::<Vec<_>>());
    let reference: Vec<u32> = paired.iter().map(|(_, r)| *r).collect();

    Some(PartitionScores {
        rand: rand_index(&estimated, &reference),
        adjusted_rand: adjusted_rand_index(&estimated, &reference),
        nmi: normalized_mutual_information(&estimated, &reference),
    })
}
