//! # Selective-Disclosure Query Compiler
//!
//! Turns one attribute or predicate group of a presentation request into a
//! [`TagQuery`] over the tags credential records are indexed with.
//!
//! ```text
//! AND( marker(a) & marker(b) & ...,
//!      OR( restriction_1, restriction_2, ... ) )
//! ```
//!
//! Each restriction becomes one AND-clause of equality predicates. Keys that
//! have no tag mapping are skipped, so newer restriction keys never make an
//! older holder fail. Clauses are sorted and de-duplicated: the output does
//! not depend on key order or restriction-array order.

use std::collections::BTreeSet;

use credex_core::identifier::{CredentialDefinitionId, IndyDid, SchemaId};

use crate::error::QueryError;
use crate::request::{
    AttributeGroup, PredicateGroup, PresentationRequest, RequestedGroup, Restriction,
};
use crate::tag_query::{TagQuery, TagValue};

const ATTR_PREFIX: &str = "attr::";
const MARKER_SUFFIX: &str = "::marker";
const VALUE_SUFFIX: &str = "::value";

/// Which tag names the target records are indexed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagVocabulary {
    /// W3C credential records (`anonCreds*` tags).
    W3c,
    /// Legacy credential records (plain tag names).
    Legacy,
}

/// Tag-bearing field a restriction key resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    CredentialDefinitionId,
    IssuerId,
    SchemaId,
    SchemaIssuerId,
    SchemaName,
    SchemaVersion,
}

impl Field {
    fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "cred_def_id" => Self::CredentialDefinitionId,
            "issuer_id" | "issuer_did" => Self::IssuerId,
            "schema_id" => Self::SchemaId,
            "schema_issuer_id" | "schema_issuer_did" => Self::SchemaIssuerId,
            "schema_name" => Self::SchemaName,
            "schema_version" => Self::SchemaVersion,
            _ => return None,
        })
    }

    fn is_unqualified(self, value: &str) -> bool {
        match self {
            Self::CredentialDefinitionId => CredentialDefinitionId::is_unqualified_str(value),
            Self::IssuerId | Self::SchemaIssuerId => IndyDid::is_unqualified_str(value),
            Self::SchemaId => SchemaId::is_unqualified_str(value),
            Self::SchemaName | Self::SchemaVersion => false,
        }
    }
}

impl TagVocabulary {
    /// Tag carrying `attr::<name>::marker`.
    pub fn marker_tag(self, attribute: &str) -> String {
        match self {
            Self::W3c => format!("anonCredsAttr::{attribute}::marker"),
            Self::Legacy => format!("attr::{attribute}::marker"),
        }
    }

    /// Tag carrying `attr::<name>::value`.
    pub fn value_tag(self, attribute: &str) -> String {
        match self {
            Self::W3c => format!("anonCredsAttr::{attribute}::value"),
            Self::Legacy => format!("attr::{attribute}::value"),
        }
    }

    fn field_tag(self, field: Field, unqualified: bool) -> &'static str {
        match (self, field, unqualified) {
            (Self::W3c, Field::CredentialDefinitionId, false) => "anonCredsCredentialDefinitionId",
            (Self::W3c, Field::CredentialDefinitionId, true) => {
                "anonCredsUnqualifiedCredentialDefinitionId"
            }
            (Self::W3c, Field::IssuerId, false) => "anonCredsIssuerId",
            (Self::W3c, Field::IssuerId, true) => "anonCredsUnqualifiedIssuerId",
            (Self::W3c, Field::SchemaId, false) => "anonCredsSchemaId",
            (Self::W3c, Field::SchemaId, true) => "anonCredsUnqualifiedSchemaId",
            (Self::W3c, Field::SchemaIssuerId, false) => "anonCredsSchemaIssuerId",
            (Self::W3c, Field::SchemaIssuerId, true) => "anonCredsUnqualifiedSchemaIssuerId",
            (Self::W3c, Field::SchemaName, _) => "anonCredsSchemaName",
            (Self::W3c, Field::SchemaVersion, _) => "anonCredsSchemaVersion",
            (Self::Legacy, Field::CredentialDefinitionId, _) => "credentialDefinitionId",
            (Self::Legacy, Field::IssuerId, _) => "issuerId",
            (Self::Legacy, Field::SchemaId, _) => "schemaId",
            (Self::Legacy, Field::SchemaIssuerId, _) => "schemaIssuerId",
            (Self::Legacy, Field::SchemaName, _) => "schemaName",
            (Self::Legacy, Field::SchemaVersion, _) => "schemaVersion",
        }
    }
}

/// Compiles presentation-request groups into tag queries.
#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler {
    vocabulary: TagVocabulary,
}

impl QueryCompiler {
    /// Create a compiler emitting tags of `vocabulary`.
    pub fn new(vocabulary: TagVocabulary) -> Self {
        Self { vocabulary }
    }

    /// The vocabulary this compiler emits.
    pub fn vocabulary(&self) -> TagVocabulary {
        self.vocabulary
    }

    /// Compile the group named `referent`.
    pub fn compile(
        &self,
        request: &PresentationRequest,
        referent: &str,
    ) -> Result<TagQuery, QueryError> {
        self.compile_with_extra(request, referent, None)
    }

    /// Compile the group named `referent`, AND-ing `extra` onto the result.
    pub fn compile_with_extra(
        &self,
        request: &PresentationRequest,
        referent: &str,
        extra: Option<&TagQuery>,
    ) -> Result<TagQuery, QueryError> {
        let group = request
            .group(referent)
            .ok_or_else(|| QueryError::ReferentNotFound(referent.to_string()))?;
        let query = self.compile_group(group);
        Ok(match extra {
            Some(extra) => TagQuery::And(vec![query, extra.clone()]),
            None => query,
        })
    }

    /// Compile a standalone attribute group.
    pub fn compile_attribute_group(&self, group: &AttributeGroup) -> TagQuery {
        self.compile_group(RequestedGroup::Attribute(group))
    }

    /// Compile a standalone predicate group.
    pub fn compile_predicate_group(&self, group: &PredicateGroup) -> TagQuery {
        self.compile_group(RequestedGroup::Predicate(group))
    }

    fn compile_group(&self, group: RequestedGroup<'_>) -> TagQuery {
        let markers = TagQuery::And(
            group
                .attribute_names()
                .into_iter()
                .map(|name| TagQuery::eq(self.vocabulary.marker_tag(name), true))
                .collect(),
        );

        let clauses: BTreeSet<TagQuery> = group
            .restrictions()
            .iter()
            .filter_map(|restriction| self.compile_restriction(restriction))
            .collect();

        if clauses.is_empty() {
            markers
        } else {
            TagQuery::And(vec![markers, TagQuery::Or(clauses.into_iter().collect())])
        }
    }

    /// One restriction as an AND-clause; `None` when nothing maps to a tag.
    fn compile_restriction(&self, restriction: &Restriction) -> Option<TagQuery> {
        let predicates: BTreeSet<TagQuery> = restriction
            .iter()
            .filter_map(|(key, value)| {
                let compiled = self.compile_entry(key, value);
                if compiled.is_none() {
                    tracing::debug!(key = %key, "skipping restriction key without tag mapping");
                }
                compiled
            })
            .collect();
        (!predicates.is_empty()).then(|| TagQuery::And(predicates.into_iter().collect()))
    }

    fn compile_entry(&self, key: &str, value: &str) -> Option<TagQuery> {
        if let Some(attribute) = key.strip_prefix(ATTR_PREFIX) {
            if let Some(name) = attribute.strip_suffix(MARKER_SUFFIX) {
                // Markers are only ever asserted, never negated.
                return (value == "1")
                    .then(|| TagQuery::eq(self.vocabulary.marker_tag(name), TagValue::Bool(true)));
            }
            if let Some(name) = attribute.strip_suffix(VALUE_SUFFIX) {
                return Some(TagQuery::eq(self.vocabulary.value_tag(name), value));
            }
            return None;
        }
        let field = Field::from_key(key)?;
        let unqualified = self.vocabulary == TagVocabulary::W3c && field.is_unqualified(value);
        Some(TagQuery::eq(
            self.vocabulary.field_tag(field, unqualified),
            value,
        ))
    }
}
