//! # AnonCreds Identifiers
//!
//! Schemas, credential definitions and revocation registries each have two
//! textual forms that coexist on the wire:
//!
//! ```text
//! legacy     SDqTzbVuCowusqGBNbNDjH:2:<name>:<version>
//!            SDqTzbVuCowusqGBNbNDjH:3:CL:<seqNo>:<tag>
//!            SDqTzbVuCowusqGBNbNDjH:4:SDqTzbVuCowusqGBNbNDjH:3:CL:<seqNo>:<credDefTag>:CL_ACCUM:<tag>
//! did:indy   did:indy:<namespace>:SDqTzbVuCowusqGBNbNDjH/anoncreds/v0/SCHEMA/<name>/<version>
//!            did:indy:<namespace>:SDqTzbVuCowusqGBNbNDjH/anoncreds/v0/CLAIM_DEF/<seqNo>/<tag>
//!            did:indy:<namespace>:SDqTzbVuCowusqGBNbNDjH/anoncreds/v0/REV_REG_DEF/<seqNo>/<credDefTag>/<tag>
//! ```
//!
//! [`AnonCredsId`] is the tagged union over both forms. The components are
//! kept verbatim, so `qualify` followed by `unqualify` returns the original
//! text and parsing a rendered id yields the same value.
//!
//! ## Validation
//!
//! Parsing is all-or-nothing: an input that matches neither grammar fails
//! with [`ValidationError::InvalidIdentifier`]; nothing is partially filled.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

const DID_INDY_PREFIX: &str = "did:indy:";
const DID_SOV_PREFIX: &str = "did:sov:";
const ANONCREDS_PATH: &str = "/anoncreds/v0/";

// ─── Grammar Primitives ──────────────────────────────────────────────

/// Legacy namespace identifier: `[a-zA-Z0-9]{21,22}`.
fn is_legacy_did(s: &str) -> bool {
    (21..=22).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// did:indy namespace identifier: base58, 21 or 22 characters.
fn is_base58_did(s: &str) -> bool {
    (21..=22).contains(&s.len())
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() && !matches!(b, b'0' | b'O' | b'I' | b'l'))
}

/// `[a-z][_a-z0-9-]*`
fn is_namespace_segment(s: &str) -> bool {
    let mut bytes = s.bytes();
    matches!(bytes.next(), Some(b'a'..=b'z'))
        && bytes.all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-'))
}

/// Validate a did:indy namespace such as `sovrin` or `bcovrin:test`.
pub fn validate_namespace(namespace: &str) -> Result<(), ValidationError> {
    let valid = match namespace.split_once(':') {
        Some((network, sub)) => is_namespace_segment(network) && is_namespace_segment(sub),
        None => is_namespace_segment(namespace),
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidNamespace(namespace.to_string()))
    }
}

/// `[1-9][0-9]*`
fn is_seq_no(s: &str) -> bool {
    let mut bytes = s.bytes();
    matches!(bytes.next(), Some(b'1'..=b'9')) && bytes.all(|b| b.is_ascii_digit())
}

/// `[0-9.]+`
fn is_version(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit() || b == b'.')
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

// ─── Components ──────────────────────────────────────────────────────

/// The per-kind part of an identifier, shared by both textual forms.
pub trait IdComponents: Sized + Clone + PartialEq + Eq {
    /// Human-readable kind, used in error messages.
    const KIND: &'static str;

    /// The issuer's namespace identifier (the unqualified DID).
    fn namespace_identifier(&self) -> &str;

    /// Parse the legacy colon-delimited form.
    fn parse_legacy(id: &str) -> Option<Self>;

    /// Parse what follows `did:indy:<namespace>:<namespace_identifier>`.
    fn parse_qualified(namespace_identifier: &str, suffix: &str) -> Option<Self>;

    /// Render the legacy form.
    fn legacy_string(&self) -> String;

    /// Render what follows `did:indy:<namespace>:<namespace_identifier>`.
    fn qualified_suffix(&self) -> String;
}

/// Schema components: issuer, name and version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaComponents {
    /// Issuer namespace identifier.
    pub namespace_identifier: String,
    /// Schema name.
    pub name: String,
    /// Schema version, digits and dots.
    pub version: String,
}

impl IdComponents for SchemaComponents {
    const KIND: &'static str = "schema";

    fn namespace_identifier(&self) -> &str {
        &self.namespace_identifier
    }

    fn parse_legacy(id: &str) -> Option<Self> {
        let (did, rest) = id.split_once(':')?;
        let rest = rest.strip_prefix("2:")?;
        let (name, version) = rest.rsplit_once(':')?;
        if !is_legacy_did(did) || !is_version(version) {
            return None;
        }
        Some(Self {
            namespace_identifier: did.to_string(),
            name: non_empty(name)?.to_string(),
            version: version.to_string(),
        })
    }

    fn parse_qualified(namespace_identifier: &str, suffix: &str) -> Option<Self> {
        let path = suffix.strip_prefix(ANONCREDS_PATH)?.strip_prefix("SCHEMA/")?;
        let (name, version) = path.rsplit_once('/')?;
        if !is_version(version) {
            return None;
        }
        Some(Self {
            namespace_identifier: namespace_identifier.to_string(),
            name: non_empty(name)?.to_string(),
            version: version.to_string(),
        })
    }

    fn legacy_string(&self) -> String {
        format!("{}:2:{}:{}", self.namespace_identifier, self.name, self.version)
    }

    fn qualified_suffix(&self) -> String {
        format!("{ANONCREDS_PATH}SCHEMA/{}/{}", self.name, self.version)
    }
}

/// Credential definition components: issuer, schema sequence number and tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialDefinitionComponents {
    /// Issuer namespace identifier.
    pub namespace_identifier: String,
    /// Ledger sequence number of the schema.
    pub schema_seq_no: String,
    /// Credential definition tag.
    pub tag: String,
}

impl IdComponents for CredentialDefinitionComponents {
    const KIND: &'static str = "credential definition";

    fn namespace_identifier(&self) -> &str {
        &self.namespace_identifier
    }

    fn parse_legacy(id: &str) -> Option<Self> {
        let (did, rest) = id.split_once(':')?;
        let rest = rest.strip_prefix("3:CL:")?;
        let (seq_no, tag) = rest.split_once(':')?;
        if !is_legacy_did(did) || !is_seq_no(seq_no) {
            return None;
        }
        Some(Self {
            namespace_identifier: did.to_string(),
            schema_seq_no: seq_no.to_string(),
            tag: non_empty(tag)?.to_string(),
        })
    }

    fn parse_qualified(namespace_identifier: &str, suffix: &str) -> Option<Self> {
        let path = suffix.strip_prefix(ANONCREDS_PATH)?.strip_prefix("CLAIM_DEF/")?;
        let (seq_no, tag) = path.split_once('/')?;
        if !is_seq_no(seq_no) {
            return None;
        }
        Some(Self {
            namespace_identifier: namespace_identifier.to_string(),
            schema_seq_no: seq_no.to_string(),
            tag: non_empty(tag)?.to_string(),
        })
    }

    fn legacy_string(&self) -> String {
        format!(
            "{}:3:CL:{}:{}",
            self.namespace_identifier, self.schema_seq_no, self.tag
        )
    }

    fn qualified_suffix(&self) -> String {
        format!("{ANONCREDS_PATH}CLAIM_DEF/{}/{}", self.schema_seq_no, self.tag)
    }
}

/// Revocation registry components.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevocationRegistryComponents {
    /// Issuer namespace identifier.
    pub namespace_identifier: String,
    /// Ledger sequence number of the schema.
    pub schema_seq_no: String,
    /// Tag of the owning credential definition.
    pub credential_definition_tag: String,
    /// Revocation registry tag.
    pub revocation_registry_tag: String,
}

impl IdComponents for RevocationRegistryComponents {
    const KIND: &'static str = "revocation registry";

    fn namespace_identifier(&self) -> &str {
        &self.namespace_identifier
    }

    fn parse_legacy(id: &str) -> Option<Self> {
        let (did, rest) = id.split_once(':')?;
        let rest = rest.strip_prefix("4:")?;
        let (cred_def_did, rest) = rest.split_once(':')?;
        let rest = rest.strip_prefix("3:CL:")?;
        let (seq_no, rest) = rest.split_once(':')?;
        let (cred_def_tag, tag) = rest.rsplit_once(":CL_ACCUM:")?;
        if !is_legacy_did(did) || cred_def_did != did || !is_seq_no(seq_no) {
            return None;
        }
        Some(Self {
            namespace_identifier: did.to_string(),
            schema_seq_no: seq_no.to_string(),
            credential_definition_tag: non_empty(cred_def_tag)?.to_string(),
            revocation_registry_tag: non_empty(tag)?.to_string(),
        })
    }

    fn parse_qualified(namespace_identifier: &str, suffix: &str) -> Option<Self> {
        let path = suffix
            .strip_prefix(ANONCREDS_PATH)?
            .strip_prefix("REV_REG_DEF/")?;
        let (seq_no, rest) = path.split_once('/')?;
        let (cred_def_tag, tag) = rest.rsplit_once('/')?;
        if !is_seq_no(seq_no) {
            return None;
        }
        Some(Self {
            namespace_identifier: namespace_identifier.to_string(),
            schema_seq_no: seq_no.to_string(),
            credential_definition_tag: non_empty(cred_def_tag)?.to_string(),
            revocation_registry_tag: non_empty(tag)?.to_string(),
        })
    }

    fn legacy_string(&self) -> String {
        let did = &self.namespace_identifier;
        format!(
            "{did}:4:{did}:3:CL:{}:{}:CL_ACCUM:{}",
            self.schema_seq_no, self.credential_definition_tag, self.revocation_registry_tag
        )
    }

    fn qualified_suffix(&self) -> String {
        format!(
            "{ANONCREDS_PATH}REV_REG_DEF/{}/{}/{}",
            self.schema_seq_no, self.credential_definition_tag, self.revocation_registry_tag
        )
    }
}

/// An issuer DID. The legacy form is the bare namespace identifier,
/// optionally written as `did:sov:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DidComponents {
    /// Namespace identifier.
    pub namespace_identifier: String,
    /// Whether the legacy text carried the `did:sov:` prefix.
    pub sov_prefix: bool,
}

impl IdComponents for DidComponents {
    const KIND: &'static str = "issuer DID";

    fn namespace_identifier(&self) -> &str {
        &self.namespace_identifier
    }

    fn parse_legacy(id: &str) -> Option<Self> {
        let (bare, sov_prefix) = match id.strip_prefix(DID_SOV_PREFIX) {
            Some(rest) => (rest, true),
            None => (id, false),
        };
        is_legacy_did(bare).then(|| Self {
            namespace_identifier: bare.to_string(),
            sov_prefix,
        })
    }

    fn parse_qualified(namespace_identifier: &str, suffix: &str) -> Option<Self> {
        suffix.is_empty().then(|| Self {
            namespace_identifier: namespace_identifier.to_string(),
            sov_prefix: false,
        })
    }

    fn legacy_string(&self) -> String {
        if self.sov_prefix {
            format!("{DID_SOV_PREFIX}{}", self.namespace_identifier)
        } else {
            self.namespace_identifier.clone()
        }
    }

    fn qualified_suffix(&self) -> String {
        String::new()
    }
}

// ─── Tagged Union ────────────────────────────────────────────────────

/// An identifier in either its legacy or its did:indy form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnonCredsId<C> {
    /// Legacy colon-delimited form; the namespace is not encoded.
    Unqualified(C),
    /// did:indy form with an explicit namespace.
    Qualified {
        /// did:indy namespace, e.g. `bcovrin:test`.
        namespace: String,
        /// Kind-specific components.
        components: C,
    },
}

/// Schema identifier.
pub type SchemaId = AnonCredsId<SchemaComponents>;
/// Credential definition identifier.
pub type CredentialDefinitionId = AnonCredsId<CredentialDefinitionComponents>;
/// Revocation registry definition identifier.
pub type RevocationRegistryId = AnonCredsId<RevocationRegistryComponents>;
/// Issuer DID.
pub type IndyDid = AnonCredsId<DidComponents>;

impl<C: IdComponents> AnonCredsId<C> {
    /// Parse either textual form.
    pub fn parse(id: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidIdentifier {
            kind: C::KIND,
            value: id.to_string(),
        };
        if let Some(rest) = id.strip_prefix(DID_INDY_PREFIX) {
            let head_end = rest.find('/').unwrap_or(rest.len());
            let (head, suffix) = rest.split_at(head_end);
            let (namespace, namespace_identifier) = head.rsplit_once(':').ok_or_else(invalid)?;
            validate_namespace(namespace).map_err(|_| invalid())?;
            if !is_base58_did(namespace_identifier) {
                return Err(invalid());
            }
            let components = C::parse_qualified(namespace_identifier, suffix).ok_or_else(invalid)?;
            return Ok(Self::Qualified {
                namespace: namespace.to_string(),
                components,
            });
        }
        C::parse_legacy(id).map(Self::Unqualified).ok_or_else(invalid)
    }

    /// Whether `id` parses as the legacy form of this kind.
    pub fn is_unqualified_str(id: &str) -> bool {
        matches!(Self::parse(id), Ok(Self::Unqualified(_)))
    }

    /// Whether `id` parses as the did:indy form of this kind.
    pub fn is_qualified_str(id: &str) -> bool {
        matches!(Self::parse(id), Ok(Self::Qualified { .. }))
    }

    /// Whether this is the legacy form.
    pub fn is_unqualified(&self) -> bool {
        matches!(self, Self::Unqualified(_))
    }

    /// Whether this is the did:indy form.
    pub fn is_qualified(&self) -> bool {
        matches!(self, Self::Qualified { .. })
    }

    /// The did:indy namespace, if encoded.
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Self::Unqualified(_) => None,
            Self::Qualified { namespace, .. } => Some(namespace),
        }
    }

    /// The kind-specific components.
    pub fn components(&self) -> &C {
        match self {
            Self::Unqualified(components) | Self::Qualified { components, .. } => components,
        }
    }

    /// Convert to the did:indy form under `namespace`.
    ///
    /// An already-qualified id is returned unchanged. Legacy DIDs outside
    /// the base58 alphabet have no did:indy form and are rejected.
    pub fn qualify(&self, namespace: &str) -> Result<Self, ValidationError> {
        match self {
            Self::Qualified { .. } => Ok(self.clone()),
            Self::Unqualified(components) => {
                validate_namespace(namespace)?;
                if !is_base58_did(components.namespace_identifier()) {
                    return Err(ValidationError::InvalidIdentifier {
                        kind: C::KIND,
                        value: self.to_string(),
                    });
                }
                Ok(Self::Qualified {
                    namespace: namespace.to_string(),
                    components: components.clone(),
                })
            }
        }
    }

    /// Convert to the legacy form. Identity on legacy input.
    pub fn unqualify(&self) -> Self {
        Self::Unqualified(self.components().clone())
    }
}

impl IndyDid {
    /// The bare namespace identifier.
    pub fn namespace_identifier(&self) -> &str {
        self.components().namespace_identifier()
    }
}

impl SchemaId {
    /// The issuer that published the schema.
    pub fn issuer_id(&self) -> IndyDid {
        self.map_to_did()
    }
}

impl CredentialDefinitionId {
    /// The issuer of the credential definition.
    pub fn issuer_id(&self) -> IndyDid {
        self.map_to_did()
    }
}

impl RevocationRegistryId {
    /// The credential definition this registry belongs to.
    pub fn credential_definition_id(&self) -> CredentialDefinitionId {
        let c = self.components();
        let components = CredentialDefinitionComponents {
            namespace_identifier: c.namespace_identifier.clone(),
            schema_seq_no: c.schema_seq_no.clone(),
            tag: c.credential_definition_tag.clone(),
        };
        match self {
            Self::Unqualified(_) => AnonCredsId::Unqualified(components),
            Self::Qualified { namespace, .. } => AnonCredsId::Qualified {
                namespace: namespace.clone(),
                components,
            },
        }
    }
}

impl<C: IdComponents> AnonCredsId<C> {
    fn map_to_did(&self) -> IndyDid {
        let components = DidComponents {
            namespace_identifier: self.components().namespace_identifier().to_string(),
            sov_prefix: false,
        };
        match self {
            Self::Unqualified(_) => AnonCredsId::Unqualified(components),
            Self::Qualified { namespace, .. } => AnonCredsId::Qualified {
                namespace: namespace.clone(),
                components,
            },
        }
    }
}

impl<C: IdComponents> fmt::Display for AnonCredsId<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unqualified(components) => f.write_str(&components.legacy_string()),
            Self::Qualified {
                namespace,
                components,
            } => write!(
                f,
                "{DID_INDY_PREFIX}{namespace}:{}{}",
                components.namespace_identifier(),
                components.qualified_suffix()
            ),
        }
    }
}

impl<C: IdComponents> FromStr for AnonCredsId<C> {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<C: IdComponents> Serialize for AnonCredsId<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, C: IdComponents> Deserialize<'de> for AnonCredsId<C> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ─── Any Kind ────────────────────────────────────────────────────────

/// An identifier of any AnonCreds kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnonCredsIdentifier {
    /// Schema id.
    Schema(SchemaId),
    /// Credential definition id.
    CredentialDefinition(CredentialDefinitionId),
    /// Revocation registry definition id.
    RevocationRegistry(RevocationRegistryId),
    /// Issuer DID.
    Did(IndyDid),
}

impl AnonCredsIdentifier {
    /// Parse an identifier of any kind.
    pub fn parse(id: &str) -> Result<Self, ValidationError> {
        SchemaId::parse(id)
            .map(Self::Schema)
            .or_else(|_| CredentialDefinitionId::parse(id).map(Self::CredentialDefinition))
            .or_else(|_| RevocationRegistryId::parse(id).map(Self::RevocationRegistry))
            .or_else(|_| IndyDid::parse(id).map(Self::Did))
            .map_err(|_| ValidationError::InvalidIdentifier {
                kind: "AnonCreds",
                value: id.to_string(),
            })
    }

    /// Whether the identifier is in its legacy form.
    pub fn is_unqualified(&self) -> bool {
        match self {
            Self::Schema(id) => id.is_unqualified(),
            Self::CredentialDefinition(id) => id.is_unqualified(),
            Self::RevocationRegistry(id) => id.is_unqualified(),
            Self::Did(id) => id.is_unqualified(),
        }
    }

    /// The did:indy namespace, if encoded.
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Self::Schema(id) => id.namespace(),
            Self::CredentialDefinition(id) => id.namespace(),
            Self::RevocationRegistry(id) => id.namespace(),
            Self::Did(id) => id.namespace(),
        }
    }

    /// The issuer namespace identifier shared by every kind.
    pub fn namespace_identifier(&self) -> &str {
        match self {
            Self::Schema(id) => id.components().namespace_identifier(),
            Self::CredentialDefinition(id) => id.components().namespace_identifier(),
            Self::RevocationRegistry(id) => id.components().namespace_identifier(),
            Self::Did(id) => id.components().namespace_identifier(),
        }
    }

    /// Convert to the did:indy form under `namespace`.
    pub fn qualify(&self, namespace: &str) -> Result<Self, ValidationError> {
        Ok(match self {
            Self::Schema(id) => Self::Schema(id.qualify(namespace)?),
            Self::CredentialDefinition(id) => Self::CredentialDefinition(id.qualify(namespace)?),
            Self::RevocationRegistry(id) => Self::RevocationRegistry(id.qualify(namespace)?),
            Self::Did(id) => Self::Did(id.qualify(namespace)?),
        })
    }

    /// Convert to the legacy form.
    pub fn unqualify(&self) -> Self {
        match self {
            Self::Schema(id) => Self::Schema(id.unqualify()),
            Self::CredentialDefinition(id) => Self::CredentialDefinition(id.unqualify()),
            Self::RevocationRegistry(id) => Self::RevocationRegistry(id.unqualify()),
            Self::Did(id) => Self::Did(id.unqualify()),
        }
    }
}

impl fmt::Display for AnonCredsIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(id) => fmt::Display::fmt(id, f),
            Self::CredentialDefinition(id) => fmt::Display::fmt(id, f),
            Self::RevocationRegistry(id) => fmt::Display::fmt(id, f),
            Self::Did(id) => fmt::Display::fmt(id, f),
        }
    }
}

/// Whether `id` is a legacy identifier of any kind.
pub fn is_unqualified_identifier(id: &str) -> bool {
    AnonCredsIdentifier::parse(id).is_ok_and(|parsed| parsed.is_unqualified())
}

/// Whether `id` is a did:indy identifier of any kind.
pub fn is_qualified_identifier(id: &str) -> bool {
    AnonCredsIdentifier::parse(id).is_ok_and(|parsed| !parsed.is_unqualified())
}

/// Qualify an identifier of any kind, returning its text.
pub fn qualify(id: &str, namespace: &str) -> Result<String, ValidationError> {
    Ok(AnonCredsIdentifier::parse(id)?.qualify(namespace)?.to_string())
}

/// Unqualify an identifier of any kind, returning its text.
pub fn unqualify(id: &str) -> Result<String, ValidationError> {
    Ok(AnonCredsIdentifier::parse(id)?.unqualify().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DID: &str = "SDqTzbVuCowusqGBNbNDjH";
    const SCHEMA: &str = "SDqTzbVuCowusqGBNbNDjH:2:schema-name:1.0";
    const QUALIFIED_SCHEMA: &str =
        "did:indy:bcovrin:test:SDqTzbVuCowusqGBNbNDjH/anoncreds/v0/SCHEMA/schema-name/1.0";
    const CRED_DEF: &str = "SDqTzbVuCowusqGBNbNDjH:3:CL:12:default";
    const QUALIFIED_CRED_DEF: &str =
        "did:indy:sovrin:SDqTzbVuCowusqGBNbNDjH/anoncreds/v0/CLAIM_DEF/12/default";
    const REV_REG: &str =
        "SDqTzbVuCowusqGBNbNDjH:4:SDqTzbVuCowusqGBNbNDjH:3:CL:12:default:CL_ACCUM:tag1";
    const QUALIFIED_REV_REG: &str =
        "did:indy:sovrin:SDqTzbVuCowusqGBNbNDjH/anoncreds/v0/REV_REG_DEF/12/default/tag1";

    #[test]
    fn test_qualify_legacy_schema() {
        let id = SchemaId::parse(SCHEMA).unwrap();
        let qualified = id.qualify("bcovrin:test").unwrap();
        assert_eq!(qualified.to_string(), QUALIFIED_SCHEMA);
        assert_eq!(qualified.unqualify().to_string(), SCHEMA);
        assert_eq!(qualify(SCHEMA, "bcovrin:test").unwrap(), QUALIFIED_SCHEMA);
        assert_eq!(unqualify(QUALIFIED_SCHEMA).unwrap(), SCHEMA);
    }

    #[test]
    fn test_parse_schema_components() {
        let id = SchemaId::parse(QUALIFIED_SCHEMA).unwrap();
        assert_eq!(id.namespace(), Some("bcovrin:test"));
        assert_eq!(id.components().name, "schema-name");
        assert_eq!(id.components().version, "1.0");
        assert_eq!(id.issuer_id().to_string(), format!("did:indy:bcovrin:test:{DID}"));
    }

    #[test]
    fn test_schema_name_with_colons() {
        let legacy = "SDqTzbVuCowusqGBNbNDjH:2:a:b:c:2.1";
        let id = SchemaId::parse(legacy).unwrap();
        assert_eq!(id.components().name, "a:b:c");
        assert_eq!(id.to_string(), legacy);
    }

    #[test]
    fn test_cred_def_round_trip() {
        let legacy = CredentialDefinitionId::parse(CRED_DEF).unwrap();
        assert_eq!(legacy.components().schema_seq_no, "12");
        assert_eq!(legacy.qualify("sovrin").unwrap().to_string(), QUALIFIED_CRED_DEF);
        let qualified = CredentialDefinitionId::parse(QUALIFIED_CRED_DEF).unwrap();
        assert_eq!(qualified.unqualify(), legacy);
    }

    #[test]
    fn test_rev_reg_round_trip() {
        let legacy = RevocationRegistryId::parse(REV_REG).unwrap();
        assert_eq!(legacy.components().credential_definition_tag, "default");
        assert_eq!(legacy.components().revocation_registry_tag, "tag1");
        assert_eq!(legacy.qualify("sovrin").unwrap().to_string(), QUALIFIED_REV_REG);
        assert_eq!(
            RevocationRegistryId::parse(QUALIFIED_REV_REG).unwrap().unqualify().to_string(),
            REV_REG
        );
        assert_eq!(legacy.credential_definition_id().to_string(), CRED_DEF);
    }

    #[test]
    fn test_rev_reg_with_mismatched_issuers_rejected() {
        let id = "SDqTzbVuCowusqGBNbNDjH:4:TL1EaPFCZ8Si5aUrqScBDt:3:CL:12:default:CL_ACCUM:tag1";
        assert!(RevocationRegistryId::parse(id).is_err());
    }

    #[test]
    fn test_did_forms() {
        let sov = IndyDid::parse(&format!("did:sov:{DID}")).unwrap();
        assert!(sov.is_unqualified());
        assert_eq!(sov.to_string(), format!("did:sov:{DID}"));
        let qualified = sov.qualify("sovrin:staging").unwrap();
        assert_eq!(qualified.to_string(), format!("did:indy:sovrin:staging:{DID}"));
        assert_eq!(qualified.unqualify().to_string(), DID);
        assert_eq!(IndyDid::parse(&qualified.to_string()).unwrap().namespace_identifier(), DID);
    }

    #[test]
    fn test_qualify_is_identity_on_qualified() {
        let id = SchemaId::parse(QUALIFIED_SCHEMA).unwrap();
        assert_eq!(id.qualify("sovrin").unwrap(), id);
    }

    #[test]
    fn test_unqualify_is_identity_on_legacy() {
        assert_eq!(unqualify(CRED_DEF).unwrap(), CRED_DEF);
    }

    #[test]
    fn test_qualify_rejects_non_base58_did() {
        let legacy = "0DqTzbVuCowusqGBNbNDjH:2:schema-name:1.0";
        let id = SchemaId::parse(legacy).unwrap();
        assert!(id.is_unqualified());
        assert_eq!(
            id.qualify("sovrin").unwrap_err(),
            ValidationError::InvalidIdentifier {
                kind: SchemaComponents::KIND,
                value: legacy.into()
            }
        );
        assert!(qualify(legacy, "sovrin").is_err());
        assert!(qualify("SDqTzbVuCowusqGBNbNDIl:3:CL:12:default", "sovrin").is_err());
    }

    #[test]
    fn test_invalid_namespace_rejected() {
        let id = SchemaId::parse(SCHEMA).unwrap();
        for ns in ["", "Sovrin", "1abc", "a:b:c", "a:"] {
            assert_eq!(
                id.qualify(ns).unwrap_err(),
                ValidationError::InvalidNamespace(ns.to_string())
            );
        }
    }

    #[test]
    fn test_malformed_ids_rejected() {
        for bad in [
            "",
            "short:2:name:1.0",
            "SDqTzbVuCowusqGBNbNDjH:2:name:v1",
            "SDqTzbVuCowusqGBNbNDjH:2::1.0",
            "SDqTzbVuCowusqGBNbNDjH:3:CL:012:tag",
            "SDqTzbVuCowusqGBNbNDjH:3:CL:12:",
            "did:indy:sovrin:SDqTzbVuCowusqGBNbNDjH/anoncreds/v0/SCHEMA/name",
            "did:indy:Sovrin:SDqTzbVuCowusqGBNbNDjH/anoncreds/v0/SCHEMA/name/1.0",
            "did:indy:sovrin:0DqTzbVuCowusqGBNbNDjH/anoncreds/v0/SCHEMA/name/1.0",
            "did:indy:SDqTzbVuCowusqGBNbNDjH/anoncreds/v0/SCHEMA/name/1.0",
        ] {
            assert!(AnonCredsIdentifier::parse(bad).is_err(), "{bad:?} parsed");
        }
    }

    #[test]
    fn test_error_names_kind_and_input() {
        let err = CredentialDefinitionId::parse("nope").unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidIdentifier {
                kind: "credential definition",
                value: "nope".into()
            }
        );
    }

    #[test]
    fn test_any_kind_dispatch() {
        assert!(matches!(
            AnonCredsIdentifier::parse(REV_REG).unwrap(),
            AnonCredsIdentifier::RevocationRegistry(_)
        ));
        assert!(matches!(
            AnonCredsIdentifier::parse(DID).unwrap(),
            AnonCredsIdentifier::Did(_)
        ));
        assert!(is_unqualified_identifier(CRED_DEF));
        assert!(is_qualified_identifier(QUALIFIED_CRED_DEF));
        assert!(!is_unqualified_identifier("X"));
        assert!(!is_qualified_identifier("X"));
    }

    #[test]
    fn test_serde_as_string() {
        let id = CredentialDefinitionId::parse(CRED_DEF).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{CRED_DEF}\""));
        let back: CredentialDefinitionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<SchemaId>("\"garbage\"").is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn did() -> impl Strategy<Value = String> {
            "[a-zA-Z0-9]{21,22}"
        }

        fn is_base58(did: &str) -> bool {
            !did.contains(['0', 'O', 'I', 'l'])
        }

        fn namespace() -> impl Strategy<Value = String> {
            "[a-z][_a-z0-9-]{0,8}(:[a-z][_a-z0-9-]{0,8})?"
        }

        proptest! {
            #[test]
            fn schema_round_trips(
                did in did(),
                name in "[A-Za-z0-9 _-]{1,16}",
                version in "[0-9]{1,3}(\\.[0-9]{1,3}){0,2}",
                ns in namespace(),
            ) {
                let legacy = format!("{did}:2:{name}:{version}");
                let qualified = qualify(&legacy, &ns);
                prop_assert_eq!(qualified.is_ok(), is_base58(&did));
                let Ok(qualified) = qualified else { return Ok(()) };
                let reparsed = SchemaId::parse(&qualified).unwrap();
                prop_assert_eq!(reparsed.to_string(), qualified.clone());
                prop_assert_eq!(unqualify(&qualified).unwrap(), legacy);
            }

            #[test]
            fn cred_def_round_trips(
                did in did(),
                seq in 1u32..1_000_000,
                tag in "[A-Za-z0-9_-]{1,16}",
                ns in namespace(),
            ) {
                let legacy = format!("{did}:3:CL:{seq}:{tag}");
                let parsed = CredentialDefinitionId::parse(&legacy).unwrap();
                prop_assert_eq!(parsed.to_string(), legacy.clone());
                let qualified = qualify(&legacy, &ns);
                prop_assert_eq!(qualified.is_ok(), is_base58(&did));
                let Ok(qualified) = qualified else { return Ok(()) };
                let reparsed = CredentialDefinitionId::parse(&qualified).unwrap();
                prop_assert_eq!(reparsed.to_string(), qualified.clone());
                prop_assert_eq!(unqualify(&qualified).unwrap(), legacy);
            }

            #[test]
            fn rev_reg_round_trips(
                did in did(),
                seq in 1u32..1_000_000,
                cd_tag in "[A-Za-z0-9_-]{1,16}",
                tag in "[A-Za-z0-9_-]{1,16}",
                ns in namespace(),
            ) {
                let legacy = format!("{did}:4:{did}:3:CL:{seq}:{cd_tag}:CL_ACCUM:{tag}");
                let qualified = qualify(&legacy, &ns);
                prop_assert_eq!(qualified.is_ok(), is_base58(&did));
                let Ok(qualified) = qualified else { return Ok(()) };
                let reparsed = RevocationRegistryId::parse(&qualified).unwrap();
                prop_assert_eq!(reparsed.to_string(), qualified.clone());
                prop_assert_eq!(unqualify(&qualified).unwrap(), legacy);
            }
        }
    }
}
