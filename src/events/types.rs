use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::entity::normalizer::normalize_name;
use crate::entity::{EntityType, MentionSet, Period};

/// A (date, participants) tuple extracted from an article or a sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub period: Period,
    // Byte range of the source text within the article
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub cluster: Option<String>,
    // Indexed by EntityType::index(); the DATE slot stays empty
    values: [BTreeSet<String>; EntityType::COUNT],
}

impl Event {
    pub fn new(period: Period, start: usize, end: usize, text: &str) -> Self {
        Event {
            period,
            start,
            end,
            text: text.to_string(),
            cluster: None,
            values: Default::default(),
        }
    }

    /// Attaches the values of every named mention found in `mentions`.
    pub fn with_named_mentions(mut self, mentions: &MentionSet) -> Self {
        for entity_type in EntityType::NAMED {
            for mention in mentions.of_type(entity_type) {
                self.values[entity_type.index()].insert(mention.value_key());
            }
        }
        self
    }

    pub fn add_value(&mut self, entity_type: EntityType, value: &str) {
        if entity_type != EntityType::Date {
            self.values[entity_type.index()].insert(normalize_name(value));
        }
    }

    pub fn values(&self, entity_type: EntityType) -> &BTreeSet<String> {
        &self.values[entity_type.index()]
    }

    /// Total number of named values attached to this event.
    pub fn value_count(&self) -> usize {
        EntityType::NAMED
            .iter()
            .map(|t| self.values[t.index()].len())
            .sum()
    }
}

/// Location of an event inside a result collection: the owning result's key
/// and the event's position in that result's list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventRef {
    pub key: String,
    pub index: usize,
}

/// One group of events produced by event clustering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCluster {
    pub id: String,
    pub members: Vec<EventRef>,
}
