//! # credex-core: Foundational Types for Credential Exchange
//!
//! Leaf crate of the credex workspace. It owns the two pieces of the
//! exchange engine that must be bit-for-bit identical between peers:
//!
//! 1. **Attribute value encoding.** [`encoding::encode`] maps a raw attribute
//!    value into the decimal integer domain the signature scheme signs over.
//!    Issuer, holder and verifier must all agree on it.
//!
//! 2. **Identifier grammars.** [`AnonCredsId`] parses the legacy and did:indy
//!    forms of schema, credential definition, revocation registry and issuer
//!    identifiers, and converts between them without loss.
//!
//! It also carries preview attributes, canonical JSON bytes used for digests,
//! and the [`ValidationError`] taxonomy the higher layers build on.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `credex-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Pure functions only: nothing here performs I/O.

pub mod attributes;
pub mod canonical;
pub mod encoding;
pub mod error;
pub mod identifier;

pub use attributes::{assert_attributes_match_schema, CredentialPreviewAttribute};
pub use canonical::CanonicalBytes;
pub use encoding::{
    assert_values_match, batch_encode, check_values_match, CredentialValue, CredentialValues,
};
pub use error::{CanonicalizationError, CredexError, ValidationError};
pub use identifier::{
    AnonCredsId, AnonCredsIdentifier, CredentialDefinitionId, IdComponents, IndyDid,
    RevocationRegistryId, SchemaId,
};
