//! # Caching Resolver
//!
//! Decorator over any [`AnonCredsResolver`] that keeps answers for a fixed
//! time-to-live. Ledger objects are immutable once published, so a stale
//! hit is only ever a stale status list, bounded by the TTL.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use credex_zkp::{
    AnonCredsCredentialDefinition, AnonCredsRevocationRegistryDefinition,
    AnonCredsRevocationStatusList, AnonCredsSchema,
};
use tracing::trace;

use crate::collaborators::{AnonCredsResolver, Resolved};
use crate::error::ResolverError;
use crate::memory::Store;

/// Default time-to-live of cached answers.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    resolved: Resolved<T>,
    inserted: Instant,
}

#[derive(Debug, Clone)]
struct TtlCache<K, T> {
    entries: Store<K, CacheEntry<T>>,
    ttl: Duration,
}

impl<K: Eq + std::hash::Hash, T: Clone> TtlCache<K, T> {
    fn new(ttl: Duration) -> Self {
        Self {
            entries: Store::new(),
            ttl,
        }
    }

    fn get(&self, key: &K) -> Option<Resolved<T>> {
        let entry = self.entries.get(key)?;
        if entry.inserted.elapsed() > self.ttl {
            self.entries.remove(key);
            return None;
        }
        Some(Resolved {
            served_from_cache: true,
            ..entry.resolved
        })
    }

    fn put(&self, key: K, resolved: &Resolved<T>) {
        self.entries.insert(
            key,
            CacheEntry {
                resolved: resolved.clone(),
                inserted: Instant::now(),
            },
        );
    }
}

/// TTL cache in front of another resolver.
pub struct CachingResolver {
    inner: Arc<dyn AnonCredsResolver>,
    schemas: TtlCache<String, AnonCredsSchema>,
    credential_definitions: TtlCache<String, AnonCredsCredentialDefinition>,
    registry_definitions: TtlCache<String, AnonCredsRevocationRegistryDefinition>,
    status_lists: TtlCache<(String, Option<u64>), AnonCredsRevocationStatusList>,
}

impl CachingResolver {
    /// Cache answers of `inner` for `ttl`.
    pub fn new(inner: Arc<dyn AnonCredsResolver>, ttl: Duration) -> Self {
        Self {
            inner,
            schemas: TtlCache::new(ttl),
            credential_definitions: TtlCache::new(ttl),
            registry_definitions: TtlCache::new(ttl),
            status_lists: TtlCache::new(ttl),
        }
    }
}

#[async_trait]
impl AnonCredsResolver for CachingResolver {
    async fn get_schema(
        &self,
        schema_id: &str,
    ) -> Result<Resolved<AnonCredsSchema>, ResolverError> {
        let key = schema_id.to_string();
        if let Some(hit) = self.schemas.get(&key) {
            trace!(schema_id, "schema served from cache");
            return Ok(hit);
        }
        let resolved = self.inner.get_schema(schema_id).await?;
        self.schemas.put(key, &resolved);
        Ok(resolved)
    }

    async fn get_credential_definition(
        &self,
        cred_def_id: &str,
    ) -> Result<Resolved<AnonCredsCredentialDefinition>, ResolverError> {
        let key = cred_def_id.to_string();
        if let Some(hit) = self.credential_definitions.get(&key) {
            trace!(cred_def_id, "credential definition served from cache");
            return Ok(hit);
        }
        let resolved = self.inner.get_credential_definition(cred_def_id).await?;
        self.credential_definitions.put(key, &resolved);
        Ok(resolved)
    }

    async fn get_revocation_registry_definition(
        &self,
        rev_reg_id: &str,
    ) -> Result<Resolved<AnonCredsRevocationRegistryDefinition>, ResolverError> {
        let key = rev_reg_id.to_string();
        if let Some(hit) = self.registry_definitions.get(&key) {
            trace!(rev_reg_id, "revocation registry definition served from cache");
            return Ok(hit);
        }
        let resolved = self.inner.get_revocation_registry_definition(rev_reg_id).await?;
        self.registry_definitions.put(key, &resolved);
        Ok(resolved)
    }

    async fn get_revocation_status_list(
        &self,
        rev_reg_id: &str,
        timestamp: Option<u64>,
    ) -> Result<Resolved<AnonCredsRevocationStatusList>, ResolverError> {
        let key = (rev_reg_id.to_string(), timestamp);
        if let Some(hit) = self.status_lists.get(&key) {
            trace!(rev_reg_id, ?timestamp, "status list served from cache");
            return Ok(hit);
        }
        let resolved = self
            .inner
            .get_revocation_status_list(rev_reg_id, timestamp)
            .await?;
        self.status_lists.put(key, &resolved);
        Ok(resolved)
    }
}
