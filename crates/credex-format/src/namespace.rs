//! # Namespace Lookup
//!
//! A legacy identifier does not say which did:indy ledger it lives on. To
//! qualify one, the namespace of its issuer DID is looked up in a local
//! cache under the two historical pool-service key prefixes, and only then
//! by resolving a ledger object owned by the issuer.
//!
//! Concurrent lookups for the same DID may both fetch. The fill is
//! idempotent and the last write wins.

use credex_core::AnonCredsIdentifier;
use tracing::debug;

use crate::collaborators::AnonCredsResolver;
use crate::error::ResolverError;
use crate::memory::Store;

/// Cache key prefix of a ledger pool service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachePrefix {
    /// `IndySdkPoolService:<did>`.
    IndySdk,
    /// `IndyVdrPoolService:<did>`.
    IndyVdr,
}

impl CachePrefix {
    /// Lookup order.
    pub const ALL: [CachePrefix; 2] = [CachePrefix::IndySdk, CachePrefix::IndyVdr];

    /// Key prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IndySdk => "IndySdkPoolService",
            Self::IndyVdr => "IndyVdrPoolService",
        }
    }

    fn key(self, did: &str) -> String {
        format!("{}:{did}", self.as_str())
    }
}

/// Outcome of a namespace lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Known without a fetch: encoded in the id or found in the cache.
    Cached(String),
    /// Fetched from the ledger and written to the cache.
    FetchAndCache(String),
}

impl Resolution {
    /// The namespace.
    pub fn namespace(&self) -> &str {
        match self {
            Self::Cached(namespace) | Self::FetchAndCache(namespace) => namespace,
        }
    }

    /// Take the namespace.
    pub fn into_namespace(self) -> String {
        match self {
            Self::Cached(namespace) | Self::FetchAndCache(namespace) => namespace,
        }
    }
}

/// Namespace cache plus fallback lookup.
#[derive(Debug, Clone, Default)]
pub struct NamespaceResolver {
    cache: Store<String, String>,
}

impl NamespaceResolver {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `did` lives on `namespace`.
    pub fn remember(&self, prefix: CachePrefix, did: &str, namespace: &str) {
        self.cache.insert(prefix.key(did), namespace.to_string());
    }

    /// Cached namespace of `did`, checking every prefix in order.
    pub fn cached(&self, did: &str) -> Option<String> {
        CachePrefix::ALL
            .iter()
            .find_map(|prefix| self.cache.get(&prefix.key(did)))
    }

    /// Namespace of `id`.
    ///
    /// Schemas are looked up through the schema itself; credential
    /// definitions and revocation registries through the credential
    /// definition. A bare DID that is not cached cannot be looked up.
    pub async fn resolve(
        &self,
        id: &AnonCredsIdentifier,
        resolver: &dyn AnonCredsResolver,
    ) -> Result<Resolution, ResolverError> {
        if let Some(namespace) = id.namespace() {
            return Ok(Resolution::Cached(namespace.to_string()));
        }
        let did = id.namespace_identifier();
        if let Some(namespace) = self.cached(did) {
            return Ok(Resolution::Cached(namespace));
        }

        debug!(id = %id, "namespace not cached, resolving owning object");
        let fetched = match id {
            AnonCredsIdentifier::Schema(schema_id) => {
                resolver.get_schema(&schema_id.to_string()).await?.namespace
            }
            AnonCredsIdentifier::CredentialDefinition(cred_def_id) => {
                resolver
                    .get_credential_definition(&cred_def_id.to_string())
                    .await?
                    .namespace
            }
            AnonCredsIdentifier::RevocationRegistry(rev_reg_id) => {
                resolver
                    .get_credential_definition(&rev_reg_id.credential_definition_id().to_string())
                    .await?
                    .namespace
            }
            AnonCredsIdentifier::Did(_) => None,
        };
        let namespace = fetched.ok_or_else(|| ResolverError::NamespaceUnknown(id.to_string()))?;
        self.remember(CachePrefix::IndyVdr, did, &namespace);
        Ok(Resolution::FetchAndCache(namespace))
    }

    /// The did:indy form of `id`, looking up its namespace if needed.
    pub async fn qualify(
        &self,
        id: &str,
        resolver: &dyn AnonCredsResolver,
    ) -> Result<String, ResolverError> {
        let parsed = AnonCredsIdentifier::parse(id)?;
        if !parsed.is_unqualified() {
            return Ok(id.to_string());
        }
        let resolution = self.resolve(&parsed, resolver).await?;
        Ok(parsed.qualify(resolution.namespace())?.to_string())
    }
}
