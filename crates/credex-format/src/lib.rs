//! # credex-format: Credential Format Coordination
//!
//! Top crate of the credex workspace. A [`CredentialFormatCoordinator`]
//! runs one side (issuer or holder) of credential exchanges in one of three
//! formats:
//!
//! - **Legacy** (`hlindy/*@v2.0`): unqualified identifiers only, credentials
//!   kept as legacy records.
//! - **AnonCreds** (`anoncreds/*@v1.0`): legacy or did:indy identifiers,
//!   credentials kept as W3C records.
//! - **DataIntegrity** (`didcomm/w3c-di-vc*@v0.1`): the AnonCreds payloads
//!   wrapped in W3C envelopes; no proposal step.
//!
//! Everything outside the coordinator's own logic (ledger resolution,
//! record and credential persistence, link secrets, the signature library,
//! revocation registry state) is injected through [`Collaborators`].
//! [`memory`] provides in-memory implementations of every collaborator.
//!
//! ## Crate Policy
//!
//! - Remote-party faults surface as [`ProblemReport`]s, local faults as
//!   plain [`FormatError`] variants.
//! - A failed step never writes the exchange record.
//! - Auto-respond predicates never fail; anything unconfirmed is `false`.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod attachment;
pub mod auto_respond;
pub mod collaborators;
pub mod config;
pub mod coordinator;
pub mod data_integrity;
pub mod error;
pub mod format;
pub mod memory;
pub mod metadata;
pub mod namespace;
pub mod payload;
pub mod problem;
pub mod record;
pub mod resolver;
pub mod selection;
pub mod telemetry;

pub use attachment::{select_attachment, Attachment, FormatOutput, FormatSpec};
pub use auto_respond::AutoAcceptCredential;
pub use collaborators::{
    AnonCredsResolver, Collaborators, CredentialStore, ExchangeRecordStore, LinkSecretStore,
    Resolved, StoredCredential,
};
pub use config::{ConfigError, CoordinatorConfig};
pub use coordinator::{CredentialFormatCoordinator, OfferOptions, StepOutput};
pub use error::{FormatError, ResolverError, StoreError};
pub use format::{CredentialFilter, CredentialFormat, CredentialRecordType, ProtocolStep};
pub use metadata::{CredentialMetadata, ExchangeMetadata, MetadataKind, RevocationMetadata};
pub use namespace::{NamespaceResolver, Resolution};
pub use payload::DecodedOffer;
pub use problem::{ProblemReport, ProblemReportReason};
pub use record::{CredentialExchangeRecord, CredentialRecordBinding, ExchangeRole};
pub use resolver::CachingResolver;
pub use selection::CredentialSelector;
pub use telemetry::{init_tracing, TelemetryConfig, TelemetryError};
