//! # In-Memory Collaborators
//!
//! Thread-safe, cloneable implementations of every collaborator trait over
//! shared maps. Used by tests and by embedders that keep exchange state in
//! process.
//!
//! All map operations are synchronous (the lock is `parking_lot`, not
//! `tokio::sync`) and no lock is ever held across an `.await`.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use credex_core::identifier::unqualify;
use credex_query::TagQuery;
use credex_zkp::{
    AnonCredsCredentialDefinition, AnonCredsLinkSecret, AnonCredsRevocationRegistryDefinition,
    AnonCredsRevocationStatusList, AnonCredsSchema,
};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::collaborators::{
    AnonCredsResolver, CredentialStore, ExchangeRecordStore, LinkSecretStore, Resolved,
    StoredCredential,
};
use crate::error::{ResolverError, StoreError};
use crate::format::CredentialRecordType;
use crate::record::CredentialExchangeRecord;

// ─── Generic Store ───────────────────────────────────────────────────

/// Cloneable shared map. Clones see the same data.
#[derive(Debug)]
pub struct Store<K, T> {
    data: Arc<RwLock<HashMap<K, T>>>,
}

impl<K, T> Clone for Store<K, T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K, T> Default for Store<K, T> {
    fn default() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<K: Eq + Hash, T: Clone> Store<K, T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous value if the key existed.
    pub fn insert(&self, key: K, value: T) -> Option<T> {
        self.data.write().insert(key, value)
    }

    /// Insert only if the key is free. Returns whether it was inserted.
    pub fn insert_new(&self, key: K, value: T) -> bool {
        let mut guard = self.data.write();
        if guard.contains_key(&key) {
            return false;
        }
        guard.insert(key, value);
        true
    }

    /// Retrieve a value.
    pub fn get(&self, key: &K) -> Option<T> {
        self.data.read().get(key).cloned()
    }

    /// Replace an existing value. Returns whether the key existed.
    pub fn replace(&self, key: &K, value: T) -> bool {
        match self.data.write().get_mut(key) {
            Some(entry) => {
                *entry = value;
                true
            }
            None => false,
        }
    }

    /// Values satisfying `predicate`.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.data
            .read()
            .values()
            .filter(|v| predicate(v))
            .cloned()
            .collect()
    }

    /// Remove a value.
    pub fn remove(&self, key: &K) -> Option<T> {
        self.data.write().remove(key)
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─── Resolver ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    namespace: Option<String>,
}

/// Ledger stand-in. Objects are found by either form of their id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAnonCredsResolver {
    schemas: Store<String, Entry<AnonCredsSchema>>,
    credential_definitions: Store<String, Entry<AnonCredsCredentialDefinition>>,
    registry_definitions: Store<String, Entry<AnonCredsRevocationRegistryDefinition>>,
    status_lists: Store<String, Entry<Vec<AnonCredsRevocationStatusList>>>,
    fetches: Arc<AtomicUsize>,
}

fn ledger_key(id: &str) -> String {
    unqualify(id).unwrap_or_else(|_| id.to_string())
}

fn lookup<T: Clone>(
    store: &Store<String, Entry<T>>,
    kind: &'static str,
    id: &str,
) -> Result<Resolved<T>, ResolverError> {
    store
        .get(&ledger_key(id))
        .map(|entry| Resolved::fetched(entry.value, entry.namespace))
        .ok_or_else(|| ResolverError::NotFound {
            kind,
            id: id.to_string(),
        })
}

impl InMemoryAnonCredsResolver {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a schema.
    pub fn register_schema(&self, id: &str, schema: AnonCredsSchema, namespace: Option<&str>) {
        self.schemas.insert(
            ledger_key(id),
            Entry {
                value: schema,
                namespace: namespace.map(str::to_string),
            },
        );
    }

    /// Publish a credential definition.
    pub fn register_credential_definition(
        &self,
        id: &str,
        definition: AnonCredsCredentialDefinition,
        namespace: Option<&str>,
    ) {
        self.credential_definitions.insert(
            ledger_key(id),
            Entry {
                value: definition,
                namespace: namespace.map(str::to_string),
            },
        );
    }

    /// Publish a revocation registry definition.
    pub fn register_revocation_registry_definition(
        &self,
        id: &str,
        definition: AnonCredsRevocationRegistryDefinition,
        namespace: Option<&str>,
    ) {
        self.registry_definitions.insert(
            ledger_key(id),
            Entry {
                value: definition,
                namespace: namespace.map(str::to_string),
            },
        );
    }

    /// Publish a status list entry for a registry.
    pub fn register_revocation_status_list(
        &self,
        status_list: AnonCredsRevocationStatusList,
        namespace: Option<&str>,
    ) {
        let key = ledger_key(&status_list.rev_reg_def_id);
        let mut history = self
            .status_lists
            .get(&key)
            .map(|entry| entry.value)
            .unwrap_or_default();
        history.push(status_list);
        history.sort_by_key(|list| list.timestamp);
        self.status_lists.insert(
            key,
            Entry {
                value: history,
                namespace: namespace.map(str::to_string),
            },
        );
    }

    /// Number of lookups served.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.fetches.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AnonCredsResolver for InMemoryAnonCredsResolver {
    async fn get_schema(
        &self,
        schema_id: &str,
    ) -> Result<Resolved<AnonCredsSchema>, ResolverError> {
        self.count();
        lookup(&self.schemas, "schema", schema_id)
    }

    async fn get_credential_definition(
        &self,
        cred_def_id: &str,
    ) -> Result<Resolved<AnonCredsCredentialDefinition>, ResolverError> {
        self.count();
        lookup(&self.credential_definitions, "credential definition", cred_def_id)
    }

    async fn get_revocation_registry_definition(
        &self,
        rev_reg_id: &str,
    ) -> Result<Resolved<AnonCredsRevocationRegistryDefinition>, ResolverError> {
        self.count();
        lookup(
            &self.registry_definitions,
            "revocation registry definition",
            rev_reg_id,
        )
    }

    async fn get_revocation_status_list(
        &self,
        rev_reg_id: &str,
        timestamp: Option<u64>,
    ) -> Result<Resolved<AnonCredsRevocationStatusList>, ResolverError> {
        self.count();
        let history = lookup(&self.status_lists, "revocation status list", rev_reg_id)?;
        let not_found = || ResolverError::NotFound {
            kind: "revocation status list",
            id: rev_reg_id.to_string(),
        };
        // Latest list at or before the requested time.
        let list = history
            .value
            .into_iter()
            .rev()
            .find(|list| match (timestamp, list.timestamp) {
                (Some(at), Some(ts)) => ts <= at,
                _ => true,
            })
            .ok_or_else(not_found)?;
        Ok(Resolved::fetched(list, history.namespace))
    }
}

// ─── Exchange Records ────────────────────────────────────────────────

/// In-memory [`ExchangeRecordStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryExchangeRecordStore {
    records: Store<Uuid, CredentialExchangeRecord>,
}

impl InMemoryExchangeRecordStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record is stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ExchangeRecordStore for InMemoryExchangeRecordStore {
    async fn save(&self, record: &CredentialExchangeRecord) -> Result<(), StoreError> {
        if !self.records.insert_new(record.id, record.clone()) {
            return Err(StoreError::Duplicate(record.id.to_string()));
        }
        Ok(())
    }

    async fn update(&self, record: &CredentialExchangeRecord) -> Result<(), StoreError> {
        if !self.records.replace(&record.id, record.clone()) {
            return Err(StoreError::NotFound(record.id.to_string()));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CredentialExchangeRecord>, StoreError> {
        Ok(self.records.get(&id))
    }

    async fn find_by_query(
        &self,
        query: &TagQuery,
    ) -> Result<Vec<CredentialExchangeRecord>, StoreError> {
        Ok(self.records.filter(|record| query.matches(record.tags())))
    }
}

// ─── Credentials ─────────────────────────────────────────────────────

/// In-memory [`CredentialStore`] for one record type.
#[derive(Debug, Clone)]
pub struct InMemoryCredentialStore {
    record_type: CredentialRecordType,
    credentials: Store<String, StoredCredential>,
}

impl InMemoryCredentialStore {
    /// An empty store of `record_type` records.
    pub fn new(record_type: CredentialRecordType) -> Self {
        Self {
            record_type,
            credentials: Store::new(),
        }
    }

    /// Number of stored credentials.
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Whether no credential is stored.
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    fn record_type(&self) -> CredentialRecordType {
        self.record_type
    }

    async fn store(&self, mut credential: StoredCredential) -> Result<String, StoreError> {
        if credential.record_type != self.record_type {
            return Err(StoreError::Backend(format!(
                "{} store cannot hold {} credentials",
                self.record_type, credential.record_type
            )));
        }
        if credential.id.is_empty() {
            credential.id = Uuid::new_v4().to_string();
        }
        let id = credential.id.clone();
        if !self.credentials.insert_new(id.clone(), credential) {
            return Err(StoreError::Duplicate(id));
        }
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<StoredCredential>, StoreError> {
        Ok(self.credentials.get(&id.to_string()))
    }

    async fn find_by_query(&self, query: &TagQuery) -> Result<Vec<StoredCredential>, StoreError> {
        Ok(self.credentials.filter(|credential| query.matches(&credential.tags)))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.credentials.remove(&id.to_string()).is_some())
    }
}

// ─── Link Secrets ────────────────────────────────────────────────────

/// In-memory [`LinkSecretStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryLinkSecretStore {
    secrets: Store<String, AnonCredsLinkSecret>,
    default_id: Arc<RwLock<Option<String>>>,
}

impl InMemoryLinkSecretStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a link secret, optionally making it the default.
    pub fn insert(&self, secret: AnonCredsLinkSecret, make_default: bool) {
        if make_default {
            *self.default_id.write() = Some(secret.id.clone());
        }
        self.secrets.insert(secret.id.clone(), secret);
    }
}

#[async_trait]
impl LinkSecretStore for InMemoryLinkSecretStore {
    async fn get(&self, id: &str) -> Result<Option<AnonCredsLinkSecret>, StoreError> {
        Ok(self.secrets.get(&id.to_string()))
    }

    async fn default_link_secret(&self) -> Result<Option<AnonCredsLinkSecret>, StoreError> {
        let default_id = self.default_id.read().clone();
        Ok(default_id.and_then(|id| self.secrets.get(&id)))
    }
}
