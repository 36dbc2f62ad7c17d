//! # External Collaborators
//!
//! Everything the coordinator reads from or writes to outside its own
//! logic is reached through these traits, passed in at construction.
//! [`crate::memory`] provides in-memory implementations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use credex_query::{TagQuery, Tags};
use credex_state::RevocationRegistryTracker;
use credex_zkp::{
    AnonCredsCredentialDefinition, AnonCredsHolder, AnonCredsIssuer, AnonCredsLinkSecret,
    AnonCredsRevocationRegistryDefinition, AnonCredsRevocationStatusList, AnonCredsSchema,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ResolverError, StoreError};
use crate::format::CredentialRecordType;
use crate::record::CredentialExchangeRecord;

// ─── Resolver ────────────────────────────────────────────────────────

/// A ledger object plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    /// The object.
    pub value: T,
    /// did:indy namespace of the ledger that served it, when known.
    pub namespace: Option<String>,
    /// Whether a cache answered instead of the registry.
    pub served_from_cache: bool,
}

impl<T> Resolved<T> {
    /// A fresh registry answer.
    pub fn fetched(value: T, namespace: Option<String>) -> Self {
        Self {
            value,
            namespace,
            served_from_cache: false,
        }
    }
}

/// Read access to AnonCreds ledger objects.
#[async_trait]
pub trait AnonCredsResolver: Send + Sync {
    /// Resolve a schema.
    async fn get_schema(&self, schema_id: &str)
        -> Result<Resolved<AnonCredsSchema>, ResolverError>;

    /// Resolve a credential definition.
    async fn get_credential_definition(
        &self,
        cred_def_id: &str,
    ) -> Result<Resolved<AnonCredsCredentialDefinition>, ResolverError>;

    /// Resolve a revocation registry definition.
    async fn get_revocation_registry_definition(
        &self,
        rev_reg_id: &str,
    ) -> Result<Resolved<AnonCredsRevocationRegistryDefinition>, ResolverError>;

    /// Resolve a registry's status list as of `timestamp` (latest if `None`).
    async fn get_revocation_status_list(
        &self,
        rev_reg_id: &str,
        timestamp: Option<u64>,
    ) -> Result<Resolved<AnonCredsRevocationStatusList>, ResolverError>;
}

// ─── Stores ──────────────────────────────────────────────────────────

/// Persistence of exchange records.
#[async_trait]
pub trait ExchangeRecordStore: Send + Sync {
    /// Insert a new record.
    async fn save(&self, record: &CredentialExchangeRecord) -> Result<(), StoreError>;

    /// Replace an existing record.
    async fn update(&self, record: &CredentialExchangeRecord) -> Result<(), StoreError>;

    /// Look up a record.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CredentialExchangeRecord>, StoreError>;

    /// Records whose tags match `query`.
    async fn find_by_query(
        &self,
        query: &TagQuery,
    ) -> Result<Vec<CredentialExchangeRecord>, StoreError>;
}

/// A credential at rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredential {
    /// Store-assigned id; empty until stored.
    pub id: String,
    /// Store the record belongs to.
    pub record_type: CredentialRecordType,
    /// Credential in the store's native form.
    pub credential: Value,
    /// Schema id, as indexed.
    pub schema_id: String,
    /// Credential definition id, as indexed.
    pub cred_def_id: String,
    /// Revocation registry id, for revocable credentials.
    pub rev_reg_id: Option<String>,
    /// Index in the registry, for revocable credentials.
    pub credential_revocation_id: Option<String>,
    /// Link secret the credential is bound to.
    pub link_secret_id: String,
    /// Query tags.
    pub tags: Tags,
    /// Storage time.
    pub created_at: DateTime<Utc>,
}

/// Persistence of received credentials, one store per record type.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store type served.
    fn record_type(&self) -> CredentialRecordType;

    /// Persist a credential, returning its id.
    async fn store(&self, credential: StoredCredential) -> Result<String, StoreError>;

    /// Look up a credential.
    async fn get(&self, id: &str) -> Result<Option<StoredCredential>, StoreError>;

    /// Credentials whose tags match `query`.
    async fn find_by_query(&self, query: &TagQuery) -> Result<Vec<StoredCredential>, StoreError>;

    /// Remove a credential. Returns whether it existed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

/// Access to the holder's link secrets.
#[async_trait]
pub trait LinkSecretStore: Send + Sync {
    /// Look up a link secret.
    async fn get(&self, id: &str) -> Result<Option<AnonCredsLinkSecret>, StoreError>;

    /// The default link secret, if one is set.
    async fn default_link_secret(&self) -> Result<Option<AnonCredsLinkSecret>, StoreError>;
}

// ─── Bundle ──────────────────────────────────────────────────────────

/// Everything a coordinator is constructed with.
#[derive(Clone)]
pub struct Collaborators {
    /// Ledger object resolver.
    pub resolver: Arc<dyn AnonCredsResolver>,
    /// Exchange record persistence.
    pub records: Arc<dyn ExchangeRecordStore>,
    /// Credential persistence for the format's record type.
    pub credentials: Arc<dyn CredentialStore>,
    /// Holder link secrets.
    pub link_secrets: Arc<dyn LinkSecretStore>,
    /// Issuer signature primitives.
    pub issuer: Arc<dyn AnonCredsIssuer>,
    /// Holder signature primitives.
    pub holder: Arc<dyn AnonCredsHolder>,
    /// Revocation registry lifecycle.
    pub revocation: RevocationRegistryTracker,
}
