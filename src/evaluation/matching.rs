use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::metrics::Counts;
use super::ScoredItem;

/// Row label of the items that ended up in no estimated cluster.
pub const NO_CLUSTER_LABEL: &str = "No cluster";

/// Column label of the items matching no reference event.
pub const NO_EVENT_LABEL: &str = "No event";

/// Corner label of the exported matrix.
pub const CORNER_LABEL: &str = "Clusters vs. Events";

/// Estimated clusters against reference events, with one extra column for
/// items without a reference event and one extra row for items outside any
/// cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub clusters: Vec<String>,
    pub events: Vec<u32>,
    /// `(clusters + 1) x (events + 1)` cells; the last row and column are the
    /// "no cluster" and "no event" buckets.
    pub cells: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn header(&self) -> Vec<String> {
        std::iter::once(CORNER_LABEL.to_string())
            .chain(self.events.iter().map(u32::to_string))
            .chain(std::iter::once(NO_EVENT_LABEL.to_string()))
            .collect()
    }

    /// Table rows, each starting with its label.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let label = self
                    .clusters
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| NO_CLUSTER_LABEL.to_string());
                std::iter::once(label)
                    .chain(row.iter().map(usize::to_string))
                    .collect()
            })
            .collect()
    }
}

/// Outcome of matching estimated clusters with reference events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterMatching {
    pub counts: Counts,
    pub confusion: ConfusionMatrix,
}

/// Orders cluster ids numerically when possible.
pub fn compare_cluster_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Matches each estimated cluster with the reference event it shares the
/// most items with.
///
/// A cluster is a false positive when that best intersection does not
/// exceed the number of its items matching no event, or when several events
/// tie for it. Every event matched by at least one cluster is a true
/// positive; an event sharing no item with any cluster is a false negative.
///
/// # Arguments
/// * `items` - The scored items (articles or events)
/// * `reference_columns` - Reference event ids always shown as columns
pub fn match_clusters(items: &[ScoredItem], reference_columns: &BTreeSet<u32>) -> ClusterMatching {
    let mut clusters: Vec<String> = items
        .iter()
        .filter_map(|item| item.cluster.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    clusters.sort_by(|a, b| compare_cluster_ids(a, b));

    let events: Vec<u32> = reference_columns
        .iter()
        .copied()
        .chain(items.iter().filter_map(|item| item.reference))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let no_cluster = clusters.len();
    let no_event = events.len();
    let mut cells = vec![vec![0usize; events.len() + 1]; clusters.len() + 1];

    for item in items {
        let row = item
            .cluster
            .as_ref()
            .and_then(|c| clusters.iter().position(|x| x == c))
            .unwrap_or(no_cluster);
        let column = item
            .reference
            .and_then(|r| events.iter().position(|x| *x == r))
            .unwrap_or(no_event);
        cells[row][column] += 1;
    }

    let mut matched: BTreeSet<usize> = BTreeSet::new();
    let mut fp = 0;
    for row in cells.iter().take(no_cluster) {
        let best = row[..no_event].iter().copied().max().unwrap_or(0);
        let ties = row[..no_event].iter().filter(|&&c| c == best).count();
        if best <= row[no_event] || ties > 1 {
            fp += 1;
        } else if let Some(column) = row[..no_event].iter().position(|&c| c == best) {
            matched.insert(column);
        }
    }

    let fn_ = (0..no_event)
        .filter(|&j| cells.iter().take(no_cluster).all(|row| row[j] == 0))
        .count();

    ClusterMatching {
        counts: Counts::new(matched.len(), fp, fn_),
        confusion: ConfusionMatrix {
            clusters,
            events,
            cells,
        },
    }
}
