//! # Credential Tags and Selection
//!
//! Holders index every stored credential with the tags the query compiler
//! targets, then select candidates for a presentation request by compiling
//! each group against every credential store they keep.

use std::sync::Arc;

use credex_core::identifier::{is_unqualified_identifier, qualify};
use credex_core::ValidationError;
use credex_query::{
    assert_no_duplicate_group_names, PresentationRequest, QueryCompiler, TagQuery, TagValue,
    TagVocabulary, Tags,
};
use credex_zkp::{AnonCredsCredential, AnonCredsSchema};
use tracing::{debug, warn};

use crate::collaborators::{CredentialStore, StoredCredential};
use crate::error::FormatError;
use crate::format::CredentialRecordType;

// ─── Tags ────────────────────────────────────────────────────────────

/// Identifiers a credential is indexed by.
#[derive(Debug, Clone, Copy)]
pub struct IndexedIds<'a> {
    /// Schema id.
    pub schema_id: &'a str,
    /// Credential definition id.
    pub cred_def_id: &'a str,
    /// Revocation registry id.
    pub rev_reg_id: Option<&'a str>,
    /// Credential issuer DID.
    pub issuer_id: &'a str,
    /// Schema issuer DID.
    pub schema_issuer_id: &'a str,
}

impl<'a> IndexedIds<'a> {
    /// Ids of `credential` issued by `issuer_id` under `schema`.
    pub fn of(
        credential: &'a AnonCredsCredential,
        schema: &'a AnonCredsSchema,
        issuer_id: &'a str,
    ) -> Self {
        Self {
            schema_id: &credential.schema_id,
            cred_def_id: &credential.cred_def_id,
            rev_reg_id: credential.rev_reg_id.as_deref(),
            issuer_id,
            schema_issuer_id: &schema.issuer_id,
        }
    }
}

fn w3c_id_tags(
    tags: &mut Tags,
    tag: &str,
    unqualified_tag: &str,
    id: &str,
    namespace: Option<&str>,
) -> Result<(), ValidationError> {
    if is_unqualified_identifier(id) {
        tags.insert(unqualified_tag.to_string(), TagValue::from(id));
        let main = match namespace {
            Some(namespace) => qualify(id, namespace)?,
            None => id.to_string(),
        };
        tags.insert(tag.to_string(), TagValue::from(main));
    } else {
        tags.insert(tag.to_string(), TagValue::from(id));
    }
    Ok(())
}

/// Tags of a stored credential in `vocabulary`.
///
/// W3C records carry the did:indy form of every id when `namespace` is
/// known, plus the legacy form under the `anonCredsUnqualified*` tags.
pub fn credential_tags(
    vocabulary: TagVocabulary,
    ids: IndexedIds<'_>,
    credential: &AnonCredsCredential,
    schema: &AnonCredsSchema,
    namespace: Option<&str>,
) -> Result<Tags, ValidationError> {
    let mut tags = Tags::new();
    match vocabulary {
        TagVocabulary::W3c => {
            w3c_id_tags(
                &mut tags,
                "anonCredsCredentialDefinitionId",
                "anonCredsUnqualifiedCredentialDefinitionId",
                ids.cred_def_id,
                namespace,
            )?;
            w3c_id_tags(
                &mut tags,
                "anonCredsSchemaId",
                "anonCredsUnqualifiedSchemaId",
                ids.schema_id,
                namespace,
            )?;
            w3c_id_tags(
                &mut tags,
                "anonCredsIssuerId",
                "anonCredsUnqualifiedIssuerId",
                ids.issuer_id,
                namespace,
            )?;
            w3c_id_tags(
                &mut tags,
                "anonCredsSchemaIssuerId",
                "anonCredsUnqualifiedSchemaIssuerId",
                ids.schema_issuer_id,
                namespace,
            )?;
            if let Some(rev_reg_id) = ids.rev_reg_id {
                w3c_id_tags(
                    &mut tags,
                    "anonCredsRevocationRegistryId",
                    "anonCredsUnqualifiedRevocationRegistryId",
                    rev_reg_id,
                    namespace,
                )?;
            }
            tags.insert("anonCredsSchemaName".into(), TagValue::from(schema.name.as_str()));
            tags.insert(
                "anonCredsSchemaVersion".into(),
                TagValue::from(schema.version.as_str()),
            );
        }
        TagVocabulary::Legacy => {
            tags.insert("credentialDefinitionId".into(), TagValue::from(ids.cred_def_id));
            tags.insert("schemaId".into(), TagValue::from(ids.schema_id));
            tags.insert("issuerId".into(), TagValue::from(ids.issuer_id));
            tags.insert("schemaIssuerId".into(), TagValue::from(ids.schema_issuer_id));
            tags.insert("schemaName".into(), TagValue::from(schema.name.as_str()));
            tags.insert("schemaVersion".into(), TagValue::from(schema.version.as_str()));
            if let Some(rev_reg_id) = ids.rev_reg_id {
                tags.insert("revocationRegistryId".into(), TagValue::from(rev_reg_id));
            }
        }
    }
    for (name, value) in &credential.values {
        tags.insert(vocabulary.marker_tag(name), TagValue::Bool(true));
        tags.insert(vocabulary.value_tag(name), TagValue::from(value.raw.as_str()));
    }
    Ok(tags)
}

// ─── Selection ───────────────────────────────────────────────────────

/// Finds stored credentials answering a presentation request group.
#[derive(Clone)]
pub struct CredentialSelector {
    stores: Vec<Arc<dyn CredentialStore>>,
}

impl CredentialSelector {
    /// Select across `stores`, each queried in its own tag vocabulary.
    pub fn new(stores: Vec<Arc<dyn CredentialStore>>) -> Self {
        Self { stores }
    }

    /// Candidates for the group named `referent`, with `extra` AND-ed on.
    pub async fn select(
        &self,
        request: &PresentationRequest,
        referent: &str,
        extra: Option<&TagQuery>,
    ) -> Result<Vec<StoredCredential>, FormatError> {
        assert_no_duplicate_group_names(request)?;
        let mut selected = Vec::new();
        for store in &self.stores {
            let record_type = store.record_type();
            let compiler = QueryCompiler::new(record_type.tag_vocabulary());
            let query = compiler.compile_with_extra(request, referent, extra)?;
            let found = store.find_by_query(&query).await?;
            debug!(referent, %record_type, count = found.len(), "credentials selected");
            if record_type == CredentialRecordType::Legacy && !found.is_empty() {
                warn!(
                    referent,
                    count = found.len(),
                    "legacy credential records selected, migrate them to w3c records"
                );
            }
            selected.extend(found);
        }
        Ok(selected)
    }
}
