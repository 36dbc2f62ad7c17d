//! # Exchange Record Metadata
//!
//! Typed side-table attached to each exchange record. Entries are keyed by
//! a closed set of [`MetadataKind`]s and written only by the coordinator.

use credex_zkp::AnonCredsCredentialRequestMetadata;
use serde::{Deserialize, Serialize};

/// Kinds of metadata an exchange record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    /// Credential provenance and revocation identifiers.
    Credential,
    /// Holder-side request metadata from the signature library.
    CredentialRequest,
}

impl MetadataKind {
    /// Storage key of the entry.
    pub fn key(self) -> &'static str {
        match self {
            Self::Credential => "_anoncreds/credential",
            Self::CredentialRequest => "_anoncreds/credentialRequest",
        }
    }
}

/// Revocation identifiers of one credential. Both or neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationMetadata {
    /// Revocation registry definition id.
    pub revocation_registry_id: String,
    /// Index of the credential in the registry, as text.
    pub credential_revocation_id: String,
}

/// `_anoncreds/credential` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialMetadata {
    /// Schema id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,
    /// Credential definition id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_definition_id: Option<String>,
    /// Revocation identifiers, for revocable credentials.
    #[serde(flatten)]
    pub revocation: Option<RevocationMetadata>,
}

impl CredentialMetadata {
    /// Metadata naming the schema and credential definition.
    pub fn new(schema_id: impl Into<String>, credential_definition_id: impl Into<String>) -> Self {
        Self {
            schema_id: Some(schema_id.into()),
            credential_definition_id: Some(credential_definition_id.into()),
            revocation: None,
        }
    }

    /// Overlay the fields `other` sets.
    pub fn merge(&mut self, other: CredentialMetadata) {
        if other.schema_id.is_some() {
            self.schema_id = other.schema_id;
        }
        if other.credential_definition_id.is_some() {
            self.credential_definition_id = other.credential_definition_id;
        }
        if other.revocation.is_some() {
            self.revocation = other.revocation;
        }
    }
}

/// Metadata side-table of one exchange record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeMetadata {
    #[serde(
        rename = "_anoncreds/credential",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    credential: Option<CredentialMetadata>,
    #[serde(
        rename = "_anoncreds/credentialRequest",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    credential_request: Option<AnonCredsCredentialRequestMetadata>,
}

impl ExchangeMetadata {
    /// The `_anoncreds/credential` entry.
    pub fn credential(&self) -> Option<&CredentialMetadata> {
        self.credential.as_ref()
    }

    /// The `_anoncreds/credentialRequest` entry.
    pub fn credential_request(&self) -> Option<&AnonCredsCredentialRequestMetadata> {
        self.credential_request.as_ref()
    }

    /// Kinds currently present.
    pub fn kinds(&self) -> Vec<MetadataKind> {
        let mut kinds = Vec::new();
        if self.credential.is_some() {
            kinds.push(MetadataKind::Credential);
        }
        if self.credential_request.is_some() {
            kinds.push(MetadataKind::CredentialRequest);
        }
        kinds
    }

    pub(crate) fn merge_credential(&mut self, update: CredentialMetadata) {
        self.credential.get_or_insert_with(Default::default).merge(update);
    }

    pub(crate) fn set_credential_request(&mut self, metadata: AnonCredsCredentialRequestMetadata) {
        self.credential_request = Some(metadata);
    }
}
