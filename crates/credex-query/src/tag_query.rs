//! # Tag Queries
//!
//! A boolean tree over equality predicates on a record's indexed tags.
//! Serializes to the `{"tag": value}` / `{"$and": [...]}` / `{"$or": [...]}`
//! shape record-query executors consume.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Value of an indexed tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// Boolean tag, used for attribute markers.
    Bool(bool),
    /// Text tag.
    Text(String),
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Indexed tags of one record.
pub type Tags = BTreeMap<String, TagValue>;

/// A compiled tag query.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagQuery {
    /// The tag equals the value.
    Eq {
        /// Tag name.
        tag: String,
        /// Required value.
        value: TagValue,
    },
    /// Every sub-query holds. Empty matches everything.
    And(Vec<TagQuery>),
    /// At least one sub-query holds. Empty matches nothing.
    Or(Vec<TagQuery>),
}

impl TagQuery {
    /// Equality predicate.
    pub fn eq(tag: impl Into<String>, value: impl Into<TagValue>) -> Self {
        Self::Eq {
            tag: tag.into(),
            value: value.into(),
        }
    }

    /// Evaluate the query against a record's tags.
    pub fn matches(&self, tags: &Tags) -> bool {
        match self {
            Self::Eq { tag, value } => tags.get(tag) == Some(value),
            Self::And(queries) => queries.iter().all(|q| q.matches(tags)),
            Self::Or(queries) => queries.iter().any(|q| q.matches(tags)),
        }
    }
}

impl Serialize for TagQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::Eq { tag, value } => map.serialize_entry(tag, value)?,
            Self::And(queries) => map.serialize_entry("$and", queries)?,
            Self::Or(queries) => map.serialize_entry("$or", queries)?,
        }
        map.end()
    }
}
