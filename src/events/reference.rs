use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::TARGET_EVENT;
use crate::entity::{DateWindow, Period};

/// File holding the manually annotated reference events.
pub const ANNOTATED_EVENTS_FILE: &str = "annotated_events.txt";

/// File mapping result keys to reference event ids.
pub const ANNOTATED_CLUSTERS_FILE: &str = "annotated_clusters.txt";

/// A manually annotated real-world event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEvent {
    pub id: u32,
    pub name: String,
    pub parent: Option<u32>,
    pub period: Period,
}

impl ReferenceEvent {
    /// True when the event date lies between the window bounds, inclusive.
    /// A partial date stands for its first day; an open window accepts every
    /// event.
    pub fn is_within_period(&self, window: &DateWindow) -> bool {
        window.contains(self.period.start)
    }
}

/// Arena of reference events indexed by id. Parent links are ids, resolved
/// through this arena.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceEvents {
    events: BTreeMap<u32, ReferenceEvent>,
}

impl ReferenceEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, event: ReferenceEvent) {
        self.events.insert(event.id, event);
    }

    pub fn get(&self, id: u32) -> Option<&ReferenceEvent> {
        self.events.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.events.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceEvent> {
        self.events.values()
    }

    /// Walks parent links up to the top-level event. A dangling parent id
    /// ends the walk; a cycle stops at the first repeated event.
    pub fn ancestor(&self, id: u32) -> Option<&ReferenceEvent> {
        let mut current = self.events.get(&id)?;
        let mut seen = BTreeSet::from([current.id]);
        while let Some(parent) = current.parent.and_then(|p| self.events.get(&p)) {
            if !seen.insert(parent.id) {
                warn!(target: TARGET_EVENT, "Cycle in reference events at id {}", parent.id);
                break;
            }
            current = parent;
        }
        Some(current)
    }

    /// Parses the tab-separated `id, name, parent, date` format. Malformed
    /// rows are logged and skipped.
    pub fn parse(text: &str) -> Self {
        let mut result = ReferenceEvents::new();
        for (line_number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_event_line(line) {
                Ok(event) => result.insert(event),
                Err(e) => warn!(
                    target: TARGET_EVENT,
                    "Skipping reference event line {}: {:#}",
                    line_number + 1,
                    e
                ),
            }
        }
        result
    }

    /// Loads the annotation file; a missing file yields an empty arena.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(target: TARGET_EVENT, "No reference events file at {}", path.display());
            return Ok(ReferenceEvents::new());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read reference events from {}", path.display()))?;
        let result = Self::parse(&text);
        info!(target: TARGET_EVENT, "Loaded {} reference events from {}", result.len(), path.display());
        Ok(result)
    }
}

fn parse_event_line(line: &str) -> Result<ReferenceEvent> {
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    if fields.len() < 4 {
        anyhow::bail!("expected 4 tab-separated fields, found {}", fields.len());
    }
    let id = fields[0]
        .parse()
        .with_context(|| format!("invalid event id '{}'", fields[0]))?;
    let parent = if fields[2].is_empty() {
        None
    } else {
        Some(
            fields[2]
                .parse()
                .with_context(|| format!("invalid parent id '{}'", fields[2]))?,
        )
    };
    let period = Period::parse_partial(fields[3])?;

    Ok(ReferenceEvent {
        id,
        name: fields[1].to_string(),
        parent,
        period,
    })
}

/// Manual mapping from result keys to reference events. `None` marks a
/// result reviewed as irrelevant; a key absent from the map was never
/// reviewed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceClusters {
    mapping: BTreeMap<String, Option<Vec<u32>>>,
}

impl ReferenceClusters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, events: Option<Vec<u32>>) {
        self.mapping.insert(key.to_string(), events);
    }

    /// `None` when the key was never reviewed, `Some(None)` when it was judged
    /// irrelevant.
    pub fn get(&self, key: &str) -> Option<Option<&[u32]>> {
        self.mapping.get(key).map(|events| events.as_deref())
    }

    pub fn is_reviewed(&self, key: &str) -> bool {
        self.mapping.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Adds every entry of `other`, replacing existing keys.
    pub fn extend(&mut self, other: &ReferenceClusters) {
        for (key, events) in &other.mapping {
            self.mapping.insert(key.clone(), events.clone());
        }
    }

    /// Reference event used to score a result: the first candidate within the
    /// window (the first candidate at all when the window is open), replaced by
    /// its top-level ancestor.
    ///
    /// # Returns
    /// * The ancestor's id, or `None` for unreviewed, irrelevant, or out-of-window results
    pub fn best_event(&self, key: &str, events: &ReferenceEvents, window: &DateWindow) -> Option<u32> {
        let chosen = self.theme_time_event(key, events, window)?;
        events.ancestor(chosen).map(|e| e.id)
    }

    /// First candidate of the result, ignoring the window.
    pub fn theme_event(&self, key: &str) -> Option<u32> {
        self.get(key).flatten().and_then(|c| c.first().copied())
    }

    /// First candidate falling within the window (the first candidate when the
    /// window is open).
    pub fn theme_time_event(&self, key: &str, events: &ReferenceEvents, window: &DateWindow) -> Option<u32> {
        let candidates = self.get(key).flatten()?;
        if window.is_unbounded() {
            return candidates.first().copied();
        }
        candidates
            .iter()
            .copied()
            .find(|id| events.get(*id).map_or(false, |e| e.is_within_period(window)))
    }

    /// Parses `key \t id[:id...]` lines. An empty id field marks the key as
    /// irrelevant; ids unknown to `events` are dropped.
    pub fn parse(text: &str, events: &ReferenceEvents) -> Self {
        let mut result = ReferenceClusters::new();
        for (line_number, line) in text.lines().enumerate() {
            let Some((key, ids)) = line.split_once('\t') else {
                if !line.trim().is_empty() {
                    warn!(target: TARGET_EVENT, "Skipping reference cluster line {}: no tab", line_number + 1);
                }
                continue;
            };
            let key = key.trim();
            let ids = ids.trim();
            if ids.is_empty() {
                result.insert(key, None);
                continue;
            }

            let mut valid = Vec::new();
            for raw in ids.split(':') {
                match raw.trim().parse::<u32>() {
                    Ok(id) if events.contains(id) => valid.push(id),
                    Ok(id) => warn!(target: TARGET_EVENT, "Line {}: unknown reference event {}", line_number + 1, id),
                    Err(_) => warn!(target: TARGET_EVENT, "Line {}: invalid event id '{}'", line_number + 1, raw),
                }
            }
            if valid.is_empty() {
                warn!(target: TARGET_EVENT, "Skipping reference cluster line {}: no valid id", line_number + 1);
            } else {
                result.insert(key, Some(valid));
            }
        }
        result
    }

    /// Loads the mapping file; a missing file yields an empty mapping.
    pub fn load(path: &Path, events: &ReferenceEvents) -> Result<Self> {
        if !path.exists() {
            info!(target: TARGET_EVENT, "No reference clusters file at {}", path.display());
            return Ok(ReferenceClusters::new());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read reference clusters from {}", path.display()))?;
        let result = Self::parse(&text, events);
        info!(target: TARGET_EVENT, "Loaded {} reference clusters from {}", result.len(), path.display());
        Ok(result)
    }

    /// Serializes the mapping, one line per key in key order.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for (key, events) in &self.mapping {
            let ids = events
                .as_ref()
                .map(|ids| ids.iter().map(u32::to_string).collect::<Vec<_>>().join(":"))
                .unwrap_or_default();
            text.push_str(key);
            text.push('\t');
            text.push_str(&ids);
            text.push('\n');
        }
        text
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_text())
            .with_context(|| format!("Failed to write reference clusters to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const EVENTS: &str = "0\tElection\t\t2012-05\n\
                          1\tSecond round\t0\t2012-05-06\n\
                          2\tInauguration\t\t2012-05-15\n\
                          x\tBroken line\t\t2012\n\
                          3\tNo date\t\n";

    fn events() -> ReferenceEvents {
        ReferenceEvents::parse(EVENTS)
    }

    #[test]
    fn test_parse_events_skips_malformed() {
        let events = events();
        assert_eq!(events.len(), 3);
        assert_eq!(events.get(1).unwrap().parent, Some(0));
        assert_eq!(events.get(0).unwrap().name, "Election");
    }

    #[test]
    fn test_best_event_returns_ancestor() {
        let events = events();
        let mut clusters = ReferenceClusters::new();
        clusters.insert("A", Some(vec![1]));
        let window = DateWindow::default();
        assert_eq!(clusters.best_event("A", &events, &window), Some(0));
        assert_eq!(clusters.theme_event("A"), Some(1));
    }

    #[test]
    fn test_partial_date_is_its_first_day() {
        let events = events();
        let election = events.get(0).unwrap();
        let d = |m, day| NaiveDate::from_ymd_opt(2012, m, day).unwrap();
        assert!(election.is_within_period(&DateWindow::new(Some(d(5, 1)), Some(d(5, 1)))));
        assert!(election.is_within_period(&DateWindow::new(Some(d(4, 1)), Some(d(5, 5)))));
        // The month overlaps this window but its first day does not
        assert!(!election.is_within_period(&DateWindow::new(Some(d(5, 10)), Some(d(5, 31)))));
        assert!(election.is_within_period(&DateWindow::default()));
    }

    #[test]
    fn test_best_event_respects_window() {
        let events = events();
        let mut clusters = ReferenceClusters::new();
        clusters.insert("B", Some(vec![1, 2]));
        clusters.insert("C", None);
        let d = |m, day| NaiveDate::from_ymd_opt(2012, m, day).unwrap();
        let window = DateWindow::new(Some(d(5, 10)), Some(d(5, 31)));
        assert_eq!(clusters.best_event("B", &events, &window), Some(2));
        assert_eq!(clusters.theme_time_event("B", &events, &window), Some(2));
        assert_eq!(clusters.best_event("C", &events, &window), None);
        assert_eq!(clusters.best_event("unknown", &events, &window), None);

        let late = DateWindow::new(Some(d(7, 1)), Some(d(7, 31)));
        assert_eq!(clusters.best_event("B", &events, &late), None);
    }

    #[test]
    fn test_ancestor_guards_cycles() {
        let mut events = ReferenceEvents::new();
        let period = Period::parse_partial("2012").unwrap();
        events.insert(ReferenceEvent { id: 1, name: "a".into(), parent: Some(2), period });
        events.insert(ReferenceEvent { id: 2, name: "b".into(), parent: Some(1), period });
        assert!(events.ancestor(1).is_some());
        assert!(events.ancestor(9).is_none());
    }

    #[test]
    fn test_clusters_parse_states() {
        let events = events();
        let clusters = ReferenceClusters::parse("A\t1\nB\t1:2\nC\t\nD\t7\nE\t7:2\nno tab here\n", &events);
        assert_eq!(clusters.get("A"), Some(Some(&[1u32][..])));
        assert_eq!(clusters.get("B"), Some(Some(&[1u32, 2][..])));
        assert_eq!(clusters.get("C"), Some(None));
        assert_eq!(clusters.get("D"), None);
        assert_eq!(clusters.get("E"), Some(Some(&[2u32][..])));
        assert!(!clusters.is_reviewed("no tab here"));
    }

    #[test]
    fn test_clusters_save_load_roundtrip() {
        let events = events();
        let mut clusters = ReferenceClusters::new();
        clusters.insert("http://example.com/a", Some(vec![1, 2]));
        clusters.insert("42@twitter", None);
        clusters.insert("http://example.com/b", Some(vec![0]));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ANNOTATED_CLUSTERS_FILE);
        clusters.save(&path).unwrap();
        let reloaded = ReferenceClusters::load(&path, &events).unwrap();
        assert_eq!(reloaded, clusters);
    }

    #[test]
    fn test_missing_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let events = ReferenceEvents::load(&dir.path().join(ANNOTATED_EVENTS_FILE)).unwrap();
        assert!(events.is_empty());
        let clusters = ReferenceClusters::load(&dir.path().join(ANNOTATED_CLUSTERS_FILE), &events).unwrap();
        assert!(clusters.is_empty());
    }
}
