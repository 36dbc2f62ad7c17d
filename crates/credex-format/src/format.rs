//! # Credential Formats
//!
//! The three interchangeable credential encodings. They share every
//! transition of the exchange and differ only in:
//!
//! - the media type of each attachment,
//! - whether did:indy identifiers are accepted,
//! - where the holder stores the received credential.
//!
//! The shared identifier checks live here as free functions so every
//! variant runs exactly the same validation.

use std::fmt;

use credex_core::{CredentialDefinitionId, IndyDid, SchemaId, ValidationError};
use credex_query::TagVocabulary;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::problem::ProblemReport;

/// Issue-credential protocol step an attachment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolStep {
    /// Holder's proposal.
    Proposal,
    /// Issuer's offer.
    Offer,
    /// Holder's request.
    Request,
    /// Issuer's credential.
    Credential,
}

impl ProtocolStep {
    /// All steps in protocol order.
    pub const ALL: [ProtocolStep; 4] = [
        ProtocolStep::Proposal,
        ProtocolStep::Offer,
        ProtocolStep::Request,
        ProtocolStep::Credential,
    ];
}

/// Where a holder stores received credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialRecordType {
    /// W3C credential records, tagged with the `anonCreds*` vocabulary.
    W3c,
    /// Legacy AnonCreds credential records.
    Legacy,
}

impl CredentialRecordType {
    /// Tag vocabulary records of this type are indexed with.
    pub fn tag_vocabulary(self) -> TagVocabulary {
        match self {
            Self::W3c => TagVocabulary::W3c,
            Self::Legacy => TagVocabulary::Legacy,
        }
    }

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::W3c => "w3c",
            Self::Legacy => "legacy",
        }
    }
}

impl fmt::Display for CredentialRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A credential encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialFormat {
    /// `hlindy/*@v2.0` attachments, legacy identifiers only.
    Legacy,
    /// `anoncreds/*@v1.0` attachments.
    AnonCreds,
    /// W3C data-integrity envelopes around AnonCreds payloads.
    DataIntegrity,
}

impl CredentialFormat {
    /// Every format.
    pub const ALL: [CredentialFormat; 3] = [
        CredentialFormat::Legacy,
        CredentialFormat::AnonCreds,
        CredentialFormat::DataIntegrity,
    ];

    /// Key of the format in protocol messages.
    pub fn format_key(self) -> &'static str {
        match self {
            Self::Legacy => "indy",
            Self::AnonCreds => "anoncreds",
            Self::DataIntegrity => "dataIntegrity",
        }
    }

    /// Media type of the attachment for `step`, if the format defines one.
    pub fn media_type(self, step: ProtocolStep) -> Option<&'static str> {
        use ProtocolStep::*;
        Some(match (self, step) {
            (Self::Legacy, Proposal) => "hlindy/cred-filter@v2.0",
            (Self::Legacy, Offer) => "hlindy/cred-abstract@v2.0",
            (Self::Legacy, Request) => "hlindy/cred-req@v2.0",
            (Self::Legacy, Credential) => "hlindy/cred@v2.0",
            (Self::AnonCreds, Proposal) => "anoncreds/credential-filter@v1.0",
            (Self::AnonCreds, Offer) => "anoncreds/credential-offer@v1.0",
            (Self::AnonCreds, Request) => "anoncreds/credential-request@v1.0",
            (Self::AnonCreds, Credential) => "anoncreds/credential@v1.0",
            (Self::DataIntegrity, Proposal) => return None,
            (Self::DataIntegrity, Offer) => "didcomm/w3c-di-vc-offer@v0.1",
            (Self::DataIntegrity, Request) => "didcomm/w3c-di-vc-request@v0.1",
            (Self::DataIntegrity, Credential) => "didcomm/w3c-di-vc@v0.1",
        })
    }

    /// Whether `media_type` belongs to this format.
    pub fn supports_format(self, media_type: &str) -> bool {
        ProtocolStep::ALL
            .iter()
            .filter_map(|step| self.media_type(*step))
            .any(|supported| supported == media_type)
    }

    /// Whether the format defines a proposal document.
    pub fn supports_proposal(self) -> bool {
        self.media_type(ProtocolStep::Proposal).is_some()
    }

    /// Whether did:indy identifiers may appear in offers and filters.
    pub fn allows_qualified_identifiers(self) -> bool {
        !matches!(self, Self::Legacy)
    }

    /// Where holders of this format store credentials.
    pub fn credential_record_type(self) -> CredentialRecordType {
        match self {
            Self::Legacy => CredentialRecordType::Legacy,
            Self::AnonCreds | Self::DataIntegrity => CredentialRecordType::W3c,
        }
    }

    /// Tag vocabulary of this format's credential records.
    pub fn tag_vocabulary(self) -> TagVocabulary {
        self.credential_record_type().tag_vocabulary()
    }
}

impl fmt::Display for CredentialFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.format_key())
    }
}

// ─── Proposal Filter ─────────────────────────────────────────────────

/// What credential a holder proposes to receive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialFilter {
    /// DID of the schema issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_issuer_id: Option<String>,
    /// Schema id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,
    /// Schema name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    /// Schema version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Credential definition id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_def_id: Option<String>,
    /// DID of the credential issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct LegacyCredentialFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_issuer_did: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cred_def_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    issuer_did: Option<String>,
}

impl CredentialFilter {
    /// Filter document in the key spelling of `format`.
    pub fn to_document(&self, format: CredentialFormat) -> Result<Value, serde_json::Error> {
        match format {
            CredentialFormat::Legacy => serde_json::to_value(LegacyCredentialFilter {
                schema_issuer_did: self.schema_issuer_id.clone(),
                schema_id: self.schema_id.clone(),
                schema_name: self.schema_name.clone(),
                schema_version: self.schema_version.clone(),
                cred_def_id: self.cred_def_id.clone(),
                issuer_did: self.issuer_id.clone(),
            }),
            _ => serde_json::to_value(self),
        }
    }

    /// Parse a filter document in the key spelling of `format`.
    pub fn from_document(
        format: CredentialFormat,
        document: Value,
    ) -> Result<Self, serde_json::Error> {
        match format {
            CredentialFormat::Legacy => {
                let legacy: LegacyCredentialFilter = serde_json::from_value(document)?;
                Ok(Self {
                    schema_issuer_id: legacy.schema_issuer_did,
                    schema_id: legacy.schema_id,
                    schema_name: legacy.schema_name,
                    schema_version: legacy.schema_version,
                    cred_def_id: legacy.cred_def_id,
                    issuer_id: legacy.issuer_did,
                })
            }
            _ => serde_json::from_value(document),
        }
    }

    /// Check every identifier in the filter parses and is allowed by `format`.
    pub fn validate(&self, format: CredentialFormat) -> Result<(), ValidationError> {
        if let Some(id) = &self.schema_id {
            check_identifier_form(format, SchemaId::parse(id)?.is_qualified(), id)?;
        }
        if let Some(id) = &self.cred_def_id {
            check_identifier_form(format, CredentialDefinitionId::parse(id)?.is_qualified(), id)?;
        }
        for id in [&self.schema_issuer_id, &self.issuer_id].into_iter().flatten() {
            check_identifier_form(format, IndyDid::parse(id)?.is_qualified(), id)?;
        }
        Ok(())
    }
}

// ─── Shared Identifier Checks ────────────────────────────────────────

fn check_identifier_form(
    format: CredentialFormat,
    qualified: bool,
    id: &str,
) -> Result<(), ValidationError> {
    if qualified && !format.allows_qualified_identifiers() {
        return Err(ValidationError::InvalidIdentifier {
            kind: "legacy",
            value: id.to_string(),
        });
    }
    Ok(())
}

/// Check an offer's schema and credential definition ids.
///
/// A malformed id, or a did:indy id offered in the Legacy format, is a fault
/// of the offering party and comes back as an `issuance-abandoned` report.
pub fn validate_offer_identifiers(
    format: CredentialFormat,
    schema_id: &str,
    cred_def_id: &str,
) -> Result<(), ProblemReport> {
    let checked = SchemaId::parse(schema_id)
        .and_then(|id| check_identifier_form(format, id.is_qualified(), schema_id))
        .and_then(|_| CredentialDefinitionId::parse(cred_def_id))
        .and_then(|id| check_identifier_form(format, id.is_qualified(), cred_def_id));
    checked.map_err(|e| ProblemReport::issuance_abandoned(format!("Invalid credential offer: {e}")))
}
