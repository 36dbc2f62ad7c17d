//! # Presentation Request Model
//!
//! Wire shape of an AnonCreds presentation request. Group labels (the map
//! keys of `requested_attributes` / `requested_predicates`) are referents;
//! they carry no meaning beyond identifying a group inside one request.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A flat map of restriction key to required value, e.g.
/// `{"cred_def_id": "...", "attr::name::value": "Alice"}`.
pub type Restriction = BTreeMap<String, String>;

/// Non-revocation window. An absent interval equals `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonRevokedInterval {
    /// Earliest acceptable non-revocation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    /// Latest acceptable non-revocation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<u64>,
}

/// A requested (revealed) attribute group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeGroup {
    /// Single attribute name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Several attribute names that must come from one credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
    /// Alternative restrictions; any one must hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Vec<Restriction>>,
    /// Group-level non-revocation window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

impl AttributeGroup {
    /// The union of `name` and `names`.
    pub fn attribute_names(&self) -> BTreeSet<&str> {
        self.name
            .iter()
            .chain(self.names.iter().flatten())
            .map(String::as_str)
            .collect()
    }
}

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredicateType {
    /// `>=`
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    /// `>`
    #[serde(rename = ">")]
    GreaterThan,
    /// `<=`
    #[serde(rename = "<=")]
    LessThanOrEqual,
    /// `<`
    #[serde(rename = "<")]
    LessThan,
}

/// A requested predicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateGroup {
    /// Attribute the predicate is evaluated on.
    pub name: String,
    /// Comparison operator.
    pub p_type: PredicateType,
    /// Comparison operand.
    pub p_value: i64,
    /// Alternative restrictions; any one must hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Vec<Restriction>>,
    /// Group-level non-revocation window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

/// An AnonCreds presentation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationRequest {
    /// Human-readable request name.
    pub name: String,
    /// Request version.
    pub version: String,
    /// Verifier nonce.
    pub nonce: String,
    /// Referent → attribute group.
    #[serde(default)]
    pub requested_attributes: BTreeMap<String, AttributeGroup>,
    /// Referent → predicate group.
    #[serde(default)]
    pub requested_predicates: BTreeMap<String, PredicateGroup>,
    /// Request-level non-revocation window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

/// A group looked up by referent, attribute groups first.
#[derive(Debug, Clone, Copy)]
pub enum RequestedGroup<'a> {
    /// An attribute group.
    Attribute(&'a AttributeGroup),
    /// A predicate group.
    Predicate(&'a PredicateGroup),
}

impl<'a> RequestedGroup<'a> {
    /// Names the group covers.
    pub fn attribute_names(&self) -> BTreeSet<&'a str> {
        match *self {
            Self::Attribute(group) => group.attribute_names(),
            Self::Predicate(group) => BTreeSet::from([group.name.as_str()]),
        }
    }

    /// The group's restrictions, empty when absent.
    pub fn restrictions(&self) -> &'a [Restriction] {
        let restrictions = match *self {
            Self::Attribute(group) => group.restrictions.as_deref(),
            Self::Predicate(group) => group.restrictions.as_deref(),
        };
        restrictions.unwrap_or_default()
    }
}

impl PresentationRequest {
    /// Look up a group by referent.
    pub fn group(&self, referent: &str) -> Option<RequestedGroup<'_>> {
        self.requested_attributes
            .get(referent)
            .map(RequestedGroup::Attribute)
            .or_else(|| {
                self.requested_predicates
                    .get(referent)
                    .map(RequestedGroup::Predicate)
            })
    }

    /// All restrictions of all groups.
    pub fn restrictions(&self) -> impl Iterator<Item = &Restriction> {
        let attributes = self
            .requested_attributes
            .values()
            .flat_map(|g| g.restrictions.iter().flatten());
        let predicates = self
            .requested_predicates
            .values()
            .flat_map(|g| g.restrictions.iter().flatten());
        attributes.chain(predicates)
    }
}
