use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::normalizer::normalize_name;
use super::period::Period;

/// Mention type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityType {
    Date,
    Location,
    Organization,
    Person,
    Function,
    Production,
    Meeting,
}

impl EntityType {
    pub const COUNT: usize = 7;

    pub const ALL: [EntityType; EntityType::COUNT] = [
        EntityType::Date,
        EntityType::Location,
        EntityType::Organization,
        EntityType::Person,
        EntityType::Function,
        EntityType::Production,
        EntityType::Meeting,
    ];

    /// Every type whose mentions carry a name rather than a period.
    pub const NAMED: [EntityType; 6] = [
        EntityType::Location,
        EntityType::Organization,
        EntityType::Person,
        EntityType::Function,
        EntityType::Production,
        EntityType::Meeting,
    ];

    /// Slot of this type in fixed-size per-type tables.
    pub const fn index(self) -> usize {
        match self {
            EntityType::Date => 0,
            EntityType::Location => 1,
            EntityType::Organization => 2,
            EntityType::Person => 3,
            EntityType::Function => 4,
            EntityType::Production => 5,
            EntityType::Meeting => 6,
        }
    }

    /// Column header used by the tabular exports.
    pub fn column_name(self) -> &'static str {
        match self {
            EntityType::Date => "Dates",
            EntityType::Location => "Locations",
            EntityType::Organization => "Organizations",
            EntityType::Person => "Persons",
            EntityType::Function => "Functions",
            EntityType::Production => "Production",
            EntityType::Meeting => "Meetings",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Date => write!(f, "DATE"),
            EntityType::Location => write!(f, "LOCATION"),
            EntityType::Organization => write!(f, "ORGANIZATION"),
            EntityType::Person => write!(f, "PERSON"),
            EntityType::Function => write!(f, "FUNCTION"),
            EntityType::Production => write!(f, "PRODUCTION"),
            EntityType::Meeting => write!(f, "MEETING"),
        }
    }
}

impl FromStr for EntityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DATE" => Ok(EntityType::Date),
            "LOCATION" => Ok(EntityType::Location),
            "ORGANIZATION" => Ok(EntityType::Organization),
            "PERSON" => Ok(EntityType::Person),
            "FUNCTION" => Ok(EntityType::Function),
            "PRODUCTION" => Ok(EntityType::Production),
            "MEETING" => Ok(EntityType::Meeting),
            other => Err(anyhow!("Unknown mention type: {}", other)),
        }
    }
}

/// Typed value of a mention: dates carry a period, everything else a
/// normalized name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MentionValue {
    Date(Period),
    Name(String),
}

impl fmt::Display for MentionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MentionValue::Date(period) => write!(f, "{}", period),
            MentionValue::Name(name) => write!(f, "{}", name),
        }
    }
}

/// A typed occurrence of an entity in an article's raw text. `start` and
/// `end` are byte offsets into that text, `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub value: MentionValue,
}

impl Mention {
    pub fn date(start: usize, end: usize, text: &str, period: Period) -> Self {
        Mention {
            entity_type: EntityType::Date,
            start,
            end,
            text: text.to_string(),
            value: MentionValue::Date(period),
        }
    }

    pub fn named(entity_type: EntityType, start: usize, end: usize, text: &str, value: &str) -> Self {
        Mention {
            entity_type,
            start,
            end,
            text: text.to_string(),
            value: MentionValue::Name(value.to_string()),
        }
    }

    pub fn period(&self) -> Option<&Period> {
        match &self.value {
            MentionValue::Date(period) => Some(period),
            MentionValue::Name(_) => None,
        }
    }

    /// String form of the value, as compared by the consensus filter and
    /// the event similarity. Names are normalized so that surface variants
    /// of one entity share a key.
    pub fn value_key(&self) -> String {
        match &self.value {
            MentionValue::Date(period) => period.to_string(),
            MentionValue::Name(name) => normalize_name(name),
        }
    }

    pub fn is_within(&self, start: usize, end: usize) -> bool {
        self.start >= start && self.end <= end
    }
}

/// Mentions detected in one article, stored in a fixed table indexed by
/// [`EntityType::index`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Mention>", into = "Vec<Mention>")]
pub struct MentionSet {
    by_type: [Vec<Mention>; EntityType::COUNT],
}

impl MentionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mention: Mention) {
        self.by_type[mention.entity_type.index()].push(mention);
    }

    pub fn with_mention(mut self, mention: Mention) -> Self {
        self.add(mention);
        self
    }

    pub fn of_type(&self, entity_type: EntityType) -> &[Mention] {
        &self.by_type[entity_type.index()]
    }

    pub fn len(&self) -> usize {
        self.by_type.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.iter().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mention> {
        self.by_type.iter().flatten()
    }

    /// Mentions located entirely inside the byte range `start..end`, in
    /// text order within each type.
    pub fn within(&self, start: usize, end: usize) -> MentionSet {
        let mut result = MentionSet::new();
        for mention in self.iter().filter(|m| m.is_within(start, end)) {
            result.add(mention.clone());
        }
        result.sort_by_position();
        result
    }

    pub fn sort_by_position(&mut self) {
        for mentions in self.by_type.iter_mut() {
            mentions.sort_by_key(|m| (m.start, m.end));
        }
    }

    /// Distinct values of one type, sorted.
    pub fn values(&self, entity_type: EntityType) -> BTreeSet<String> {
        self.of_type(entity_type)
            .iter()
            .map(Mention::value_key)
            .collect()
    }

    /// Keeps only the mentions of `entity_type` for which `keep` returns true.
    /// Returns how many were removed.
    pub fn retain<F>(&mut self, entity_type: EntityType, mut keep: F) -> usize
    where
        F: FnMut(&Mention) -> bool,
    {
        let mentions = &mut self.by_type[entity_type.index()];
        let before = mentions.len();
        mentions.retain(|m| keep(m));
        before - mentions.len()
    }
}

impl From<Vec<Mention>> for MentionSet {
    fn from(mentions: Vec<Mention>) -> Self {
        let mut set = MentionSet::new();
        for mention in mentions {
            set.add(mention);
        }
        set.sort_by_position();
        set
    }
}

impl From<MentionSet> for Vec<Mention> {
    fn from(set: MentionSet) -> Self {
        let mut mentions: Vec<Mention> = set.by_type.into_iter().flatten().collect();
        mentions.sort_by_key(|m| (m.start, m.end));
        mentions
    }
}
