use tracing::debug;

use super::metrics::Counts;
use super::TARGET_EVAL;
use crate::entity::DateWindow;
use crate::events::ReferenceEvents;
use crate::result::ResultCollection;

/// Relevance counts of one pipeline step, matching on the theme alone and on
/// theme plus time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelevanceScores {
    pub theme: Counts,
    pub theme_time: Counts,
}

fn tally(counts: &mut Counts, relevant: bool, kept: bool) {
    match (relevant, kept) {
        (true, true) => counts.tp += 1,
        (true, false) => counts.fn_ += 1,
        (false, true) => counts.fp += 1,
        (false, false) => {}
    }
}

/// Compares each result's status (kept or rejected) against the presence of
/// a reference event. A result missing from the annotations has no reference
/// event.
pub fn relevance(
    collection: &ResultCollection,
    events: &ReferenceEvents,
    window: &DateWindow,
) -> RelevanceScores {
    let references = collection.references();
    let mut scores = RelevanceScores::default();

    for result in collection.iter() {
        let kept = result.is_alive();
        let theme = references.theme_event(&result.key).is_some();
        let theme_time = references
            .theme_time_event(&result.key, events, window)
            .is_some();
        tally(&mut scores.theme, theme, kept);
        tally(&mut scores.theme_time, theme_time, kept);
    }

    debug!(
        target: TARGET_EVAL,
        "Relevance: theme {:?}, theme-time {:?}",
        scores.theme,
        scores.theme_time
    );
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ReferenceClusters;
    use crate::result::{ResultStatus, SearchResult};
    use chrono::NaiveDate;

    #[test]
    fn test_theme_and_theme_time() {
        let events = ReferenceEvents::parse("1\tSpeech\t\t2012-05-06\n2\tOld speech\t\t2010-01-01\n");
        let mut references = ReferenceClusters::new();
        references.insert("kept-relevant", Some(vec![1]));
        references.insert("kept-old", Some(vec![2]));
        references.insert("kept-irrelevant", None);
        references.insert("rejected-relevant", Some(vec![1]));
        references.insert("rejected-irrelevant", None);

        let mut collection = ResultCollection::new();
        for key in ["kept-relevant", "kept-old", "kept-irrelevant", "unreviewed"] {
            collection.insert(SearchResult::web(key));
        }
        for key in ["rejected-relevant", "rejected-irrelevant"] {
            let mut result = SearchResult::web(key);
            result.reject(ResultStatus::MissingKeyword);
            collection.insert(result);
        }
        collection.set_references(references);

        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        let window = DateWindow::new(Some(d(2012, 1, 1)), Some(d(2012, 12, 31)));
        let scores = relevance(&collection, &events, &window);

        assert_eq!(scores.theme, Counts::new(2, 2, 1));
        // The 2010 event is outside the window
        assert_eq!(scores.theme_time, Counts::new(1, 3, 1));
    }

    #[test]
    fn test_kept_unannotated_result_is_false_positive() {
        let events = ReferenceEvents::parse("1\tSpeech\t\t2012-05-06\n");
        let mut references = ReferenceClusters::new();
        references.insert("irrelevant", None);

        let mut collection = ResultCollection::new();
        collection.insert(SearchResult::web("irrelevant"));
        collection.insert(SearchResult::web("never-seen"));
        let mut rejected = SearchResult::web("rejected-never-seen");
        rejected.reject(ResultStatus::MissingKeyword);
        collection.insert(rejected);
        collection.set_references(references);

        let scores = relevance(&collection, &events, &DateWindow::default());
        assert_eq!(scores.theme, Counts::new(0, 2, 0));
        assert_eq!(scores.theme_time, Counts::new(0, 2, 0));
    }
}
