//! # Signature Library Primitives
//!
//! The issuer and holder halves of the AnonCreds signature scheme, as the
//! exchange engine consumes them. Implementations wrap a real CL-signature
//! library; [`crate::mock`] ships a deterministic stand-in.
//!
//! Calls are synchronous and pure with respect to the engine: they read the
//! objects passed in and return new ones, never touching storage.

use credex_core::{CanonicalizationError, CredentialValues};
use credex_state::RevocationSlot;
use thiserror::Error;

use crate::model::{
    AnonCredsCredential, AnonCredsCredentialDefinition, AnonCredsCredentialOffer,
    AnonCredsCredentialRequest, AnonCredsCredentialRequestMetadata, AnonCredsLinkSecret,
    AnonCredsRevocationRegistryDefinition, AnonCredsRevocationStatusList,
};

/// Errors raised by the signature library.
#[derive(Error, Debug)]
pub enum ZkpError {
    /// Two objects that must reference the same credential definition do not.
    #[error("credential definition mismatch: expected {expected}, got {actual}")]
    CredentialDefinitionMismatch {
        /// Id the operation was bound to.
        expected: String,
        /// Id found on the other object.
        actual: String,
    },

    /// The credential signature does not verify.
    #[error("invalid credential signature: {0}")]
    InvalidSignature(String),

    /// A revocable credential was requested without registry state.
    #[error("revocation status list required for revocable credential definition {0}")]
    MissingRevocationStatus(String),

    /// The revocation index is outside the registry.
    #[error("revocation index {index} out of range for registry {registry_id}")]
    IndexOutOfRange {
        /// Registry id.
        registry_id: String,
        /// Requested index.
        index: u32,
    },

    /// Hashing input could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Registry inputs for issuing a revocable credential.
#[derive(Debug, Clone, Copy)]
pub struct RevocationInput<'a> {
    /// Registry id and credential index.
    pub slot: &'a RevocationSlot,
    /// Current status list of the registry.
    pub status_list: &'a AnonCredsRevocationStatusList,
}

/// Everything the issuer signs over.
#[derive(Debug, Clone, Copy)]
pub struct CreateCredentialInput<'a> {
    /// The offer this credential answers.
    pub offer: &'a AnonCredsCredentialOffer,
    /// The holder's request.
    pub request: &'a AnonCredsCredentialRequest,
    /// Encoded attribute values.
    pub values: &'a CredentialValues,
    /// Registry inputs; `None` for non-revocable definitions.
    pub revocation: Option<RevocationInput<'a>>,
}

/// A freshly signed credential.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    /// The credential.
    pub credential: AnonCredsCredential,
    /// Index of the credential in its registry, as text.
    pub credential_revocation_id: Option<String>,
}

/// A received credential after holder-side verification.
#[derive(Debug, Clone)]
pub struct ProcessedCredential {
    /// The verified credential.
    pub credential: AnonCredsCredential,
    /// Index of the credential in its registry, for revocable credentials.
    pub credential_revocation_id: Option<String>,
}

/// A credential request and the holder state needed to finish it.
#[derive(Debug, Clone)]
pub struct CreatedCredentialRequest {
    /// Request sent to the issuer.
    pub request: AnonCredsCredentialRequest,
    /// Kept by the holder.
    pub metadata: AnonCredsCredentialRequestMetadata,
}

/// Issuer-side primitives.
pub trait AnonCredsIssuer: Send + Sync {
    /// Create an offer for `cred_def_id`.
    fn create_credential_offer(
        &self,
        cred_def_id: &str,
        credential_definition: &AnonCredsCredentialDefinition,
    ) -> Result<AnonCredsCredentialOffer, ZkpError>;

    /// Sign a credential answering `input.request`.
    fn create_credential(&self, input: CreateCredentialInput<'_>)
        -> Result<IssuedCredential, ZkpError>;
}

/// Holder-side primitives.
pub trait AnonCredsHolder: Send + Sync {
    /// Create a request for `offer`, bound to `link_secret`.
    fn create_credential_request(
        &self,
        offer: &AnonCredsCredentialOffer,
        credential_definition: &AnonCredsCredentialDefinition,
        link_secret: &AnonCredsLinkSecret,
    ) -> Result<CreatedCredentialRequest, ZkpError>;

    /// Verify and un-blind a received credential.
    fn process_credential(
        &self,
        credential: &AnonCredsCredential,
        metadata: &AnonCredsCredentialRequestMetadata,
        link_secret: &AnonCredsLinkSecret,
        credential_definition: &AnonCredsCredentialDefinition,
        revocation_registry: Option<&AnonCredsRevocationRegistryDefinition>,
    ) -> Result<ProcessedCredential, ZkpError>;
}
