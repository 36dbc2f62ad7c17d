//! # credex-zkp: Signature Library Boundary
//!
//! The exchange engine never performs CL-signature math itself. This crate
//! defines what it needs from a signature library and the objects that
//! cross that boundary.
//!
//! ## Architecture
//!
//! - **Model** (`model.rs`): AnonCreds ledger and exchange objects.
//!
//! - **Traits** (`traits.rs`): `AnonCredsIssuer` and `AnonCredsHolder`, the
//!   compile-time contract that keeps mock and real libraries
//!   interchangeable.
//!
//! - **Mock** (`mock.rs`, `mock` feature, on by default): `MockAnonCreds`
//!   produces digest "signatures" that a holder can check against its own
//!   request.
//!
//! ## Crate Policy
//!
//! - Depends on `credex-core` and `credex-state` internally.
//! - No `unsafe` in the mock implementation.
//! - Primitives are synchronous; callers decide where they run.

#[cfg(feature = "mock")]
pub mod mock;
pub mod model;
pub mod traits;

#[cfg(feature = "mock")]
pub use mock::MockAnonCreds;
pub use model::{
    AnonCredsCredential, AnonCredsCredentialDefinition, AnonCredsCredentialOffer,
    AnonCredsCredentialRequest, AnonCredsCredentialRequestMetadata, AnonCredsLinkSecret,
    AnonCredsRevocationRegistryDefinition, AnonCredsRevocationStatusList, AnonCredsSchema,
    CredentialDefinitionValue, RevocationRegistryDefinitionValue,
};
pub use traits::{
    AnonCredsHolder, AnonCredsIssuer, CreateCredentialInput, CreatedCredentialRequest,
    IssuedCredential, ProcessedCredential, RevocationInput, ZkpError,
};
