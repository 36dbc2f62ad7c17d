//! # Credential Format Coordinator
//!
//! Drives one side of a credential exchange in one [`CredentialFormat`].
//! Every operation follows the same shape:
//!
//! 1. Load the exchange record (or create one at an entry state).
//! 2. Advance the state machine on a draft copy.
//! 3. Decode attachments, resolve ledger objects, call the signature
//!    library, and write metadata and tags onto the draft.
//! 4. Commit the draft through the record store.
//!
//! A failure anywhere before step 4 leaves the stored record untouched.
//!
//! The three formats share every step; they differ only in media types,
//! whether did:indy identifiers are accepted, and which credential store
//! holds the result.

use std::sync::Arc;

use chrono::Utc;
use credex_core::identifier::qualify;
use credex_core::{
    assert_attributes_match_schema, assert_values_match, batch_encode, AnonCredsIdentifier,
    CredentialPreviewAttribute,
};
use credex_query::TagQuery;
use credex_state::{CredentialExchangeState, RevocationSlot};
use credex_zkp::{AnonCredsLinkSecret, CreateCredentialInput, RevocationInput};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::attachment::{Attachment, FormatOutput};
use crate::auto_respond::{
    should_auto_respond_to_credential, should_auto_respond_to_offer,
    should_auto_respond_to_proposal, should_auto_respond_to_request, AutoAcceptCredential,
};
use crate::collaborators::{AnonCredsResolver, Collaborators, StoredCredential};
use crate::config::CoordinatorConfig;
use crate::data_integrity::to_w3c_credential;
use crate::error::FormatError;
use crate::format::{
    validate_offer_identifiers, CredentialFilter, CredentialFormat, CredentialRecordType,
};
use crate::metadata::{CredentialMetadata, RevocationMetadata};
use crate::namespace::NamespaceResolver;
use crate::problem::ProblemReport;
use crate::record::{
    CredentialExchangeRecord, CredentialRecordBinding, ExchangeRole,
    CREDENTIAL_REVOCATION_ID_TAG, REVOCATION_REGISTRY_ID_TAG,
};
use crate::resolver::CachingResolver;
use crate::selection::{credential_tags, IndexedIds};

/// A committed record plus the attachment to send to the other party.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// The record as stored.
    pub record: CredentialExchangeRecord,
    /// Outbound attachment and its format spec.
    pub output: FormatOutput,
}

/// What an issuer offers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferOptions {
    /// Credential definition; defaults to the proposal's when accepting one.
    pub cred_def_id: Option<String>,
    /// Preview attributes; defaults to the proposal's when accepting one.
    pub attributes: Option<Vec<CredentialPreviewAttribute>>,
    /// Revocation registry the credential will be issued into.
    pub revocation_registry_id: Option<String>,
    /// Index reserved for the credential in that registry.
    pub revocation_index: Option<u32>,
    /// Attachment id to use instead of a fresh UUID.
    pub attach_id: Option<String>,
}

impl OfferOptions {
    /// Offer `attributes` under `cred_def_id`.
    pub fn new(
        cred_def_id: impl Into<String>,
        attributes: Vec<CredentialPreviewAttribute>,
    ) -> Self {
        Self {
            cred_def_id: Some(cred_def_id.into()),
            attributes: Some(attributes),
            ..Self::default()
        }
    }

    /// Issue into `registry_id` at `index`.
    pub fn with_revocation(mut self, registry_id: impl Into<String>, index: u32) -> Self {
        self.revocation_registry_id = Some(registry_id.into());
        self.revocation_index = Some(index);
        self
    }
}

/// One side of credential exchanges in one format.
#[derive(Clone)]
pub struct CredentialFormatCoordinator {
    format: CredentialFormat,
    collaborators: Collaborators,
    resolver: Arc<dyn AnonCredsResolver>,
    namespaces: NamespaceResolver,
    config: CoordinatorConfig,
}

impl CredentialFormatCoordinator {
    /// Coordinate exchanges in `format` over `collaborators`.
    pub fn new(
        format: CredentialFormat,
        collaborators: Collaborators,
        config: CoordinatorConfig,
    ) -> Self {
        let resolver: Arc<dyn AnonCredsResolver> = if config.resolver_cache {
            Arc::new(CachingResolver::new(
                Arc::clone(&collaborators.resolver),
                config.resolver_cache_ttl,
            ))
        } else {
            Arc::clone(&collaborators.resolver)
        };
        if collaborators.credentials.record_type() != format.credential_record_type() {
            warn!(
                %format,
                store = %collaborators.credentials.record_type(),
                "credential store does not hold this format's record type"
            );
        }
        Self {
            format,
            collaborators,
            resolver,
            namespaces: NamespaceResolver::new(),
            config,
        }
    }

    /// Format coordinated.
    pub fn format(&self) -> CredentialFormat {
        self.format
    }

    /// Whether `media_type` belongs to this coordinator's format.
    pub fn supports_format(&self, media_type: &str) -> bool {
        self.format.supports_format(media_type)
    }

    /// Configured auto-accept policy.
    pub fn auto_accept(&self) -> AutoAcceptCredential {
        self.config.auto_accept
    }

    /// Namespace cache used to qualify legacy identifiers.
    pub fn namespaces(&self) -> &NamespaceResolver {
        &self.namespaces
    }

    // ─── Record plumbing ─────────────────────────────────────────────

    /// Look up an exchange record.
    pub async fn find_record(&self, id: Uuid) -> Result<CredentialExchangeRecord, FormatError> {
        let record = self
            .collaborators
            .records
            .find_by_id(id)
            .await?
            .ok_or(FormatError::RecordNotFound(id))?;
        if record.format != self.format {
            return Err(FormatError::NotSupported(format!(
                "record {id} runs the {} format, not {}",
                record.format, self.format
            )));
        }
        Ok(record)
    }

    /// Exchange records whose tags match `query`.
    pub async fn find_records(
        &self,
        query: &TagQuery,
    ) -> Result<Vec<CredentialExchangeRecord>, FormatError> {
        Ok(self.collaborators.records.find_by_query(query).await?)
    }

    /// Exchange records that issued or received the credential at
    /// `credential_revocation_id` in `revocation_registry_id`.
    pub async fn find_by_revocation(
        &self,
        revocation_registry_id: &str,
        credential_revocation_id: &str,
    ) -> Result<Vec<CredentialExchangeRecord>, FormatError> {
        let query = TagQuery::And(vec![
            TagQuery::eq(REVOCATION_REGISTRY_ID_TAG, revocation_registry_id),
            TagQuery::eq(CREDENTIAL_REVOCATION_ID_TAG, credential_revocation_id),
        ]);
        self.find_records(&query).await
    }

    fn new_record(
        &self,
        role: ExchangeRole,
        entry: CredentialExchangeState,
    ) -> Result<CredentialExchangeRecord, FormatError> {
        Ok(CredentialExchangeRecord::new(role, self.format, entry)?)
    }

    async fn commit(
        &self,
        mut record: CredentialExchangeRecord,
        is_new: bool,
    ) -> Result<CredentialExchangeRecord, FormatError> {
        record.touch();
        if is_new {
            self.collaborators.records.save(&record).await?;
        } else {
            self.collaborators.records.update(&record).await?;
        }
        info!(
            record_id = %record.id,
            format = %self.format,
            state = %record.state(),
            "credential exchange record committed"
        );
        Ok(record)
    }

    // ─── Proposal ────────────────────────────────────────────────────

    /// Holder: propose a credential matching `filter`.
    pub async fn create_proposal(
        &self,
        filter: CredentialFilter,
        attributes: Option<Vec<CredentialPreviewAttribute>>,
    ) -> Result<StepOutput, FormatError> {
        debug!(format = %self.format, "creating credential proposal");
        filter.validate(self.format)?;
        let output = self.format.encode_proposal(&filter)?;

        let mut record = self.new_record(ExchangeRole::Holder, CredentialExchangeState::Proposed)?;
        record.credential_attributes = attributes;
        record.metadata_mut().merge_credential(filter_metadata(&filter));
        let record = self.commit(record, true).await?;
        Ok(StepOutput { record, output })
    }

    /// Issuer: receive a proposal.
    pub async fn process_proposal(
        &self,
        attachment: &Attachment,
        attributes: Option<Vec<CredentialPreviewAttribute>>,
    ) -> Result<CredentialExchangeRecord, FormatError> {
        debug!(format = %self.format, "processing credential proposal");
        let invalid = |e: &dyn std::fmt::Display| {
            ProblemReport::issuance_abandoned(format!("Invalid credential proposal: {e}"))
        };
        let filter = match self.format.decode_proposal(attachment) {
            Ok(filter) => filter,
            Err(FormatError::NotSupported(reason)) => return Err(FormatError::NotSupported(reason)),
            Err(e) => return Err(invalid(&e).into()),
        };
        filter.validate(self.format).map_err(|e| invalid(&e))?;

        let mut record = self.new_record(ExchangeRole::Issuer, CredentialExchangeState::Proposed)?;
        record.credential_attributes = attributes;
        record.metadata_mut().merge_credential(filter_metadata(&filter));
        self.commit(record, true).await
    }

    /// Issuer: answer a stored proposal with an offer.
    pub async fn accept_proposal(
        &self,
        record_id: Uuid,
        options: OfferOptions,
    ) -> Result<StepOutput, FormatError> {
        let mut record = self.find_record(record_id).await?;
        record.exchange.offer("proposal accepted")?;

        let proposed = record.metadata().credential();
        let cred_def_id = options
            .cred_def_id
            .clone()
            .or_else(|| proposed.and_then(|m| m.credential_definition_id.clone()))
            .ok_or_else(|| {
                FormatError::MissingData(format!(
                    "no credential definition offered or proposed for record {record_id}"
                ))
            })?;
        let attributes = options
            .attributes
            .clone()
            .or_else(|| record.credential_attributes.clone())
            .ok_or_else(|| {
                FormatError::MissingData(format!(
                    "no credential attributes offered or proposed for record {record_id}"
                ))
            })?;

        let output = self
            .build_offer(&mut record, &cred_def_id, attributes, options)
            .await?;
        let record = self.commit(record, false).await?;
        Ok(StepOutput { record, output })
    }

    // ─── Offer ───────────────────────────────────────────────────────

    /// Issuer: offer a credential without a preceding proposal.
    pub async fn create_offer(&self, options: OfferOptions) -> Result<StepOutput, FormatError> {
        let cred_def_id = options
            .cred_def_id
            .clone()
            .ok_or_else(|| FormatError::MissingData("credential definition id".into()))?;
        let attributes = options
            .attributes
            .clone()
            .ok_or_else(|| FormatError::MissingData("credential attributes".into()))?;

        let mut record = self.new_record(ExchangeRole::Issuer, CredentialExchangeState::Offered)?;
        let output = self
            .build_offer(&mut record, &cred_def_id, attributes, options)
            .await?;
        let record = self.commit(record, true).await?;
        Ok(StepOutput { record, output })
    }

    async fn build_offer(
        &self,
        record: &mut CredentialExchangeRecord,
        cred_def_id: &str,
        attributes: Vec<CredentialPreviewAttribute>,
        options: OfferOptions,
    ) -> Result<FormatOutput, FormatError> {
        debug!(record_id = %record.id, cred_def_id, "creating credential offer");
        let slot = RevocationSlot::from_parts(
            options.revocation_registry_id,
            options.revocation_index,
        )?;

        let definition = self.resolver.get_credential_definition(cred_def_id).await?.value;
        CredentialFilter {
            schema_id: Some(definition.schema_id.clone()),
            cred_def_id: Some(cred_def_id.to_string()),
            ..CredentialFilter::default()
        }
        .validate(self.format)?;

        let schema = self.resolver.get_schema(&definition.schema_id).await?.value;
        assert_attributes_match_schema(&schema.attr_names, &attributes)?;

        let offer = self
            .collaborators
            .issuer
            .create_credential_offer(cred_def_id, &definition)?;

        let mut metadata = CredentialMetadata::new(&offer.schema_id, &offer.cred_def_id);
        if definition.supports_revocation() {
            let slot = slot.ok_or_else(|| {
                FormatError::MissingData(format!(
                    "revocation registry id and index for revocable credential definition {cred_def_id}"
                ))
            })?;
            let index = slot.index.to_string();
            record.set_tag(REVOCATION_REGISTRY_ID_TAG, slot.registry_id.as_str());
            record.set_tag(CREDENTIAL_REVOCATION_ID_TAG, index.as_str());
            metadata.revocation = Some(RevocationMetadata {
                revocation_registry_id: slot.registry_id,
                credential_revocation_id: index,
            });
        } else if let Some(slot) = slot {
            warn!(
                cred_def_id,
                registry_id = %slot.registry_id,
                "ignoring revocation slot for non-revocable credential definition"
            );
        }
        record.metadata_mut().merge_credential(metadata);

        let output = self.format.encode_offer(
            options.attach_id,
            &offer,
            &definition.issuer_id,
            &attributes,
        )?;
        record.credential_attributes = Some(attributes);
        Ok(output)
    }

    /// Holder: receive an offer, continuing `record_id` when we proposed.
    pub async fn process_offer(
        &self,
        record_id: Option<Uuid>,
        attachment: &Attachment,
        attributes: Option<Vec<CredentialPreviewAttribute>>,
    ) -> Result<CredentialExchangeRecord, FormatError> {
        debug!(format = %self.format, ?record_id, "processing credential offer");
        let decoded = self.format.decode_offer(attachment)?;
        validate_offer_identifiers(
            self.format,
            &decoded.offer.schema_id,
            &decoded.offer.cred_def_id,
        )?;

        let (mut record, is_new) = match record_id {
            Some(id) => {
                let mut record = self.find_record(id).await?;
                record.exchange.offer("offer received")?;
                (record, false)
            }
            None => (
                self.new_record(ExchangeRole::Holder, CredentialExchangeState::Offered)?,
                true,
            ),
        };
        if let Some(attributes) = decoded.attributes.or(attributes) {
            record.credential_attributes = Some(attributes);
        }
        record.metadata_mut().merge_credential(CredentialMetadata::new(
            &decoded.offer.schema_id,
            &decoded.offer.cred_def_id,
        ));
        self.commit(record, is_new).await
    }

    /// Holder: answer an offer with a request bound to a link secret.
    ///
    /// The link secret is `link_secret_id`, else the configured one, else
    /// the store's default.
    pub async fn accept_offer(
        &self,
        record_id: Uuid,
        offer_attachment: &Attachment,
        link_secret_id: Option<&str>,
    ) -> Result<StepOutput, FormatError> {
        let mut record = self.find_record(record_id).await?;
        record.exchange.request("offer accepted")?;

        let decoded = self.format.decode_offer(offer_attachment)?;
        let offer = &decoded.offer;
        let definition = self
            .resolver
            .get_credential_definition(&offer.cred_def_id)
            .await?
            .value;
        let link_secret = self.link_secret(link_secret_id).await?;
        debug!(
            record_id = %record_id,
            link_secret_id = %link_secret.id,
            "creating credential request"
        );

        let created = self
            .collaborators
            .holder
            .create_credential_request(offer, &definition, &link_secret)?;
        record.metadata_mut().set_credential_request(created.metadata);
        record
            .metadata_mut()
            .merge_credential(CredentialMetadata::new(&offer.schema_id, &offer.cred_def_id));

        let output = self.format.encode_request(created.request, &decoded)?;
        let record = self.commit(record, false).await?;
        Ok(StepOutput { record, output })
    }

    async fn link_secret(
        &self,
        explicit: Option<&str>,
    ) -> Result<AnonCredsLinkSecret, FormatError> {
        let store = &self.collaborators.link_secrets;
        match explicit.or(self.config.link_secret_id.as_deref()) {
            Some(id) => store
                .get(id)
                .await?
                .ok_or_else(|| FormatError::MissingData(format!("link secret {id}"))),
            None => store
                .default_link_secret()
                .await?
                .ok_or_else(|| FormatError::MissingData("default link secret".into())),
        }
    }

    // ─── Request ─────────────────────────────────────────────────────

    /// Exchanges cannot start at the request step.
    pub fn create_request(&self) -> Result<StepOutput, FormatError> {
        Err(FormatError::NotSupported(format!(
            "{} exchanges cannot start with a credential request",
            self.format
        )))
    }

    /// Issuer: receive a request for an offer we sent.
    pub async fn process_request(
        &self,
        record_id: Uuid,
        attachment: &Attachment,
    ) -> Result<CredentialExchangeRecord, FormatError> {
        let mut record = self.find_record(record_id).await?;
        record.exchange.request("request received")?;
        let request = self.format.decode_request(attachment).map_err(|e| {
            ProblemReport::issuance_abandoned(format!("Invalid credential request: {e}"))
        })?;
        debug!(
            record_id = %record_id,
            cred_def_id = %request.cred_def_id,
            "credential request received"
        );
        self.commit(record, false).await
    }

    /// Issuer: sign the credential answering `request_attachment`.
    pub async fn accept_request(
        &self,
        record_id: Uuid,
        offer_attachment: &Attachment,
        request_attachment: &Attachment,
    ) -> Result<StepOutput, FormatError> {
        let mut record = self.find_record(record_id).await?;
        record.exchange.issue("credential issued")?;

        let attributes = record.credential_attributes.clone().ok_or_else(|| {
            ProblemReport::issuance_abandoned(
                "Missing required credential attribute values on credential record",
            )
        })?;
        let offer = self.format.decode_offer(offer_attachment)?.offer;
        let request = self.format.decode_request(request_attachment).map_err(|e| {
            ProblemReport::issuance_abandoned(format!("Invalid credential request: {e}"))
        })?;
        let definition = self
            .resolver
            .get_credential_definition(&offer.cred_def_id)
            .await?
            .value;

        let slot = if definition.supports_revocation() {
            Some(revocation_slot(&record)?)
        } else {
            None
        };
        let status_list = match &slot {
            Some(slot) => {
                self.collaborators.revocation.assert_active(&slot.registry_id)?;
                Some(
                    self.resolver
                        .get_revocation_status_list(&slot.registry_id, None)
                        .await?
                        .value,
                )
            }
            None => None,
        };

        let values = batch_encode(&attributes)?;
        let revocation = slot
            .as_ref()
            .zip(status_list.as_ref())
            .map(|(slot, status_list)| RevocationInput { slot, status_list });
        let issued = self.collaborators.issuer.create_credential(CreateCredentialInput {
            offer: &offer,
            request: &request,
            values: &values,
            revocation,
        })?;

        if let (Some(registry_id), Some(index)) = (
            issued.credential.rev_reg_id.clone(),
            issued.credential_revocation_id.clone(),
        ) {
            record.set_tag(REVOCATION_REGISTRY_ID_TAG, registry_id.as_str());
            record.set_tag(CREDENTIAL_REVOCATION_ID_TAG, index.as_str());
            record.metadata_mut().merge_credential(CredentialMetadata {
                revocation: Some(RevocationMetadata {
                    revocation_registry_id: registry_id,
                    credential_revocation_id: index,
                }),
                ..CredentialMetadata::default()
            });
        }

        let output = self
            .format
            .encode_credential(&issued.credential, &definition.issuer_id)?;
        let record = self.commit(record, false).await?;
        Ok(StepOutput { record, output })
    }

    // ─── Credential ──────────────────────────────────────────────────

    /// Holder: verify and store a received credential.
    pub async fn process_credential(
        &self,
        record_id: Uuid,
        attachment: &Attachment,
    ) -> Result<CredentialExchangeRecord, FormatError> {
        let mut record = self.find_record(record_id).await?;
        record.exchange.issue("credential received")?;

        let request_metadata = record.metadata().credential_request().cloned().ok_or_else(|| {
            ProblemReport::issuance_abandoned(format!(
                "Missing required request metadata for credential exchange record {record_id}"
            ))
        })?;
        let offered = record.credential_attributes.as_deref().ok_or_else(|| {
            FormatError::MissingData(format!(
                "credential attributes on credential exchange record {record_id}"
            ))
        })?;
        let offered = batch_encode(offered)?;
        let credential = self.format.decode_credential(attachment).map_err(|e| {
            ProblemReport::issuance_abandoned(format!("Invalid credential: {e}"))
        })?;
        debug!(
            record_id = %record_id,
            cred_def_id = %credential.cred_def_id,
            "processing credential"
        );
        assert_values_match(&offered, &credential.values)?;

        let definition = self
            .resolver
            .get_credential_definition(&credential.cred_def_id)
            .await?
            .value;
        let schema = self.resolver.get_schema(&credential.schema_id).await?.value;
        let registry = match &credential.rev_reg_id {
            Some(id) => Some(self.resolver.get_revocation_registry_definition(id).await?.value),
            None => None,
        };

        let link_secret = self
            .link_secret(Some(&request_metadata.link_secret_name))
            .await?;
        let processed = self.collaborators.holder.process_credential(
            &credential,
            &request_metadata,
            &link_secret,
            &definition,
            registry.as_ref(),
        )?;
        let credential = processed.credential;

        let record_type = self.format.credential_record_type();
        let namespace = match record_type {
            CredentialRecordType::W3c => {
                let id = AnonCredsIdentifier::parse(&credential.cred_def_id)?;
                Some(self.namespaces.resolve(&id, self.resolver.as_ref()).await?.into_namespace())
            }
            CredentialRecordType::Legacy => None,
        };
        let issuer_id = definition.issuer_id.as_str();
        let stored_form = match &namespace {
            Some(namespace) => {
                let issuer = qualify(issuer_id, namespace)?;
                serde_json::to_value(to_w3c_credential(&credential, &issuer, Utc::now())?)
            }
            None => serde_json::to_value(&credential),
        }
        .map_err(|e| FormatError::Payload(e.to_string()))?;
        let tags = credential_tags(
            record_type.tag_vocabulary(),
            IndexedIds::of(&credential, &schema, issuer_id),
            &credential,
            &schema,
            namespace.as_deref(),
        )?;

        let credential_id = self
            .collaborators
            .credentials
            .store(StoredCredential {
                id: String::new(),
                record_type,
                credential: stored_form,
                schema_id: credential.schema_id.clone(),
                cred_def_id: credential.cred_def_id.clone(),
                rev_reg_id: credential.rev_reg_id.clone(),
                credential_revocation_id: processed.credential_revocation_id,
                link_secret_id: link_secret.id.clone(),
                tags,
                created_at: Utc::now(),
            })
            .await?;
        info!(
            record_id = %record_id,
            credential_id = %credential_id,
            %record_type,
            "credential stored"
        );

        if credential.rev_reg_id.is_some() {
            let stored = self
                .collaborators
                .credentials
                .get(&credential_id)
                .await?
                .ok_or_else(|| {
                    FormatError::MissingData(format!("stored credential {credential_id}"))
                })?;
            if let (Some(registry_id), Some(index)) =
                (stored.rev_reg_id, stored.credential_revocation_id)
            {
                record.set_tag(REVOCATION_REGISTRY_ID_TAG, registry_id.as_str());
                record.set_tag(CREDENTIAL_REVOCATION_ID_TAG, index.as_str());
                record.metadata_mut().merge_credential(CredentialMetadata {
                    revocation: Some(RevocationMetadata {
                        revocation_registry_id: registry_id,
                        credential_revocation_id: index,
                    }),
                    ..CredentialMetadata::default()
                });
            }
        }

        record.credentials.push(CredentialRecordBinding {
            record_type,
            credential_id,
        });
        record.exchange.store("credential stored")?;
        self.commit(record, false).await
    }

    // ─── Closing ─────────────────────────────────────────────────────

    /// Either side: the exchange was acknowledged.
    pub async fn complete(&self, record_id: Uuid) -> Result<CredentialExchangeRecord, FormatError> {
        let mut record = self.find_record(record_id).await?;
        record.exchange.complete("acknowledged")?;
        self.commit(record, false).await
    }

    /// Either side: give up, returning the report to send.
    pub async fn abandon(
        &self,
        record_id: Uuid,
        message: &str,
    ) -> Result<(CredentialExchangeRecord, ProblemReport), FormatError> {
        let mut record = self.find_record(record_id).await?;
        record.exchange.abandon(message)?;
        record.error_message = Some(message.to_string());
        warn!(record_id = %record_id, message, "credential exchange abandoned");
        let record = self.commit(record, false).await?;
        Ok((record, ProblemReport::issuance_abandoned(message)))
    }

    /// Either side: the other party gave up.
    pub async fn process_problem_report(
        &self,
        record_id: Uuid,
        report: &ProblemReport,
    ) -> Result<CredentialExchangeRecord, FormatError> {
        let mut record = self.find_record(record_id).await?;
        record.exchange.abandon("problem report received")?;
        record.error_message = Some(report.to_string());
        warn!(record_id = %record_id, code = %report.reason(), "problem report received");
        self.commit(record, false).await
    }

    /// Holder: delete a stored credential. Returns whether it existed.
    pub async fn delete_credential(&self, credential_id: &str) -> Result<bool, FormatError> {
        Ok(self.collaborators.credentials.delete(credential_id).await?)
    }

    // ─── Auto-respond ────────────────────────────────────────────────

    fn decide(&self, step: &str, approved: bool) -> bool {
        let accept = self.config.auto_accept.should_accept(approved);
        if !accept {
            warn!(step, policy = %self.config.auto_accept, approved, "auto respond declined");
        }
        accept
    }

    /// Issuer: answer `proposal` with `offer` automatically.
    pub fn should_auto_respond_to_proposal(
        &self,
        proposal: &Attachment,
        offer: &Attachment,
    ) -> bool {
        self.decide(
            "proposal",
            should_auto_respond_to_proposal(self.format, proposal, offer),
        )
    }

    /// Holder: accept `offer` following `proposal` automatically.
    pub fn should_auto_respond_to_offer(&self, offer: &Attachment, proposal: &Attachment) -> bool {
        self.decide("offer", should_auto_respond_to_offer(self.format, offer, proposal))
    }

    /// Issuer: issue for `request` automatically.
    pub fn should_auto_respond_to_request(&self, offer: &Attachment, request: &Attachment) -> bool {
        self.decide("request", should_auto_respond_to_request(self.format, offer, request))
    }

    /// Holder: acknowledge `credential` automatically.
    pub fn should_auto_respond_to_credential(
        &self,
        record: &CredentialExchangeRecord,
        request: &Attachment,
        credential: &Attachment,
    ) -> bool {
        self.decide(
            "credential",
            should_auto_respond_to_credential(
                self.format,
                request,
                credential,
                record.credential_attributes.as_deref(),
            ),
        )
    }
}

fn filter_metadata(filter: &CredentialFilter) -> CredentialMetadata {
    CredentialMetadata {
        schema_id: filter.schema_id.clone(),
        credential_definition_id: filter.cred_def_id.clone(),
        revocation: None,
    }
}

fn revocation_slot(record: &CredentialExchangeRecord) -> Result<RevocationSlot, FormatError> {
    let revocation = record
        .metadata()
        .credential()
        .and_then(|m| m.revocation.as_ref())
        .ok_or_else(|| {
            FormatError::MissingData(format!(
                "revocation registry id and index on record {}",
                record.id
            ))
        })?;
    let index = revocation.credential_revocation_id.parse().map_err(|_| {
        FormatError::MissingData(format!(
            "numeric revocation index on record {}, found {:?}",
            record.id, revocation.credential_revocation_id
        ))
    })?;
    Ok(RevocationSlot {
        registry_id: revocation.revocation_registry_id.clone(),
        index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use credex_state::RevocationRegistryTracker;
    use credex_zkp::{
        AnonCredsCredentialDefinition, AnonCredsSchema, CredentialDefinitionValue, MockAnonCreds,
    };
    use serde_json::json;

    use crate::memory::{
        InMemoryAnonCredsResolver, InMemoryCredentialStore, InMemoryExchangeRecordStore,
        InMemoryLinkSecretStore,
    };

    const SCHEMA_ID: &str = "SDqTzbVuCowusqGBNbNDjH:2:person:1.0";
    const CRED_DEF_ID: &str = "SDqTzbVuCowusqGBNbNDjH:3:CL:12:default";

    fn coordinator(format: CredentialFormat) -> CredentialFormatCoordinator {
        let ledger = InMemoryAnonCredsResolver::new();
        ledger.register_schema(
            SCHEMA_ID,
            AnonCredsSchema {
                issuer_id: "SDqTzbVuCowusqGBNbNDjH".into(),
                name: "person".into(),
                version: "1.0".into(),
                attr_names: vec!["name".into(), "age".into()],
            },
            Some("bcovrin:test"),
        );
        ledger.register_credential_definition(
            CRED_DEF_ID,
            AnonCredsCredentialDefinition {
                issuer_id: "SDqTzbVuCowusqGBNbNDjH".into(),
                schema_id: SCHEMA_ID.into(),
                signature_type: "CL".into(),
                tag: "default".into(),
                value: CredentialDefinitionValue {
                    primary: json!({"n": "1"}),
                    revocation: None,
                },
            },
            Some("bcovrin:test"),
        );
        let zkp = Arc::new(MockAnonCreds::new());
        CredentialFormatCoordinator::new(
            format,
            Collaborators {
                resolver: Arc::new(ledger),
                records: Arc::new(InMemoryExchangeRecordStore::new()),
                credentials: Arc::new(InMemoryCredentialStore::new(
                    format.credential_record_type(),
                )),
                link_secrets: Arc::new(InMemoryLinkSecretStore::new()),
                issuer: zkp.clone(),
                holder: zkp,
                revocation: RevocationRegistryTracker::new(),
            },
            CoordinatorConfig::default(),
        )
    }

    fn attributes() -> Vec<CredentialPreviewAttribute> {
        vec![
            CredentialPreviewAttribute::new("name", "Alice"),
            CredentialPreviewAttribute::new("age", "30"),
        ]
    }

    #[tokio::test]
    async fn test_create_request_is_not_supported() {
        let issuer = coordinator(CredentialFormat::AnonCreds);
        assert!(matches!(issuer.create_request(), Err(FormatError::NotSupported(_))));
    }

    #[tokio::test]
    async fn test_create_offer_writes_metadata() {
        let issuer = coordinator(CredentialFormat::AnonCreds);
        let out = issuer
            .create_offer(OfferOptions::new(CRED_DEF_ID, attributes()))
            .await
            .unwrap();
        assert_eq!(out.record.state(), CredentialExchangeState::Offered);
        assert_eq!(out.record.role, ExchangeRole::Issuer);
        let metadata = out.record.metadata().credential().unwrap();
        assert_eq!(metadata.schema_id.as_deref(), Some(SCHEMA_ID));
        assert_eq!(metadata.credential_definition_id.as_deref(), Some(CRED_DEF_ID));
        assert!(metadata.revocation.is_none());
        assert_eq!(out.output.format.format, "anoncreds/credential-offer@v1.0");
        assert_eq!(issuer.find_record(out.record.id).await.unwrap(), out.record);
    }

    #[tokio::test]
    async fn test_offer_attributes_must_match_schema() {
        let issuer = coordinator(CredentialFormat::AnonCreds);
        let err = issuer
            .create_offer(OfferOptions::new(
                CRED_DEF_ID,
                vec![CredentialPreviewAttribute::new("name", "Alice")],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, FormatError::Validation(_)));
    }

    #[tokio::test]
    async fn test_half_revocation_slot_is_rejected() {
        let issuer = coordinator(CredentialFormat::AnonCreds);
        let options = OfferOptions {
            revocation_registry_id: Some(
                "SDqTzbVuCowusqGBNbNDjH:4:SDqTzbVuCowusqGBNbNDjH:3:CL:12:default:CL_ACCUM:tag1"
                    .into(),
            ),
            ..OfferOptions::new(CRED_DEF_ID, attributes())
        };
        let err = issuer.create_offer(options).await.unwrap_err();
        assert!(matches!(err, FormatError::RevocationState(_)));
    }

    #[tokio::test]
    async fn test_proposal_records_filter_metadata() {
        let holder = coordinator(CredentialFormat::AnonCreds);
        let issuer = coordinator(CredentialFormat::AnonCreds);
        let filter = CredentialFilter {
            cred_def_id: Some(CRED_DEF_ID.into()),
            schema_id: Some(SCHEMA_ID.into()),
            ..CredentialFilter::default()
        };
        let proposal = holder.create_proposal(filter, Some(attributes())).await.unwrap();
        assert_eq!(proposal.record.state(), CredentialExchangeState::Proposed);

        let received = issuer
            .process_proposal(&proposal.output.attachment, None)
            .await
            .unwrap();
        assert_eq!(
            received.metadata().credential().and_then(|m| m.credential_definition_id.as_deref()),
            Some(CRED_DEF_ID)
        );

        let offer = issuer
            .accept_proposal(
                received.id,
                OfferOptions {
                    attributes: Some(attributes()),
                    ..OfferOptions::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(offer.record.state(), CredentialExchangeState::Offered);
        assert!(!holder
            .should_auto_respond_to_offer(&offer.output.attachment, &proposal.output.attachment));
        assert!(should_auto_respond_to_offer(
            CredentialFormat::AnonCreds,
            &offer.output.attachment,
            &proposal.output.attachment
        ));
    }

    #[tokio::test]
    async fn test_invalid_proposal_is_problem_report() {
        let issuer = coordinator(CredentialFormat::AnonCreds);
        let attachment = Attachment::from_json("p", &json!({"cred_def_id": "nonsense"})).unwrap();
        let err = issuer.process_proposal(&attachment, None).await.unwrap_err();
        assert!(err.problem_report().is_some());
    }

    #[tokio::test]
    async fn test_unknown_record() {
        let issuer = coordinator(CredentialFormat::AnonCreds);
        let id = Uuid::new_v4();
        assert!(matches!(
            issuer.complete(id).await,
            Err(FormatError::RecordNotFound(found)) if found == id
        ));
    }

    #[tokio::test]
    async fn test_abandon_records_message() {
        let issuer = coordinator(CredentialFormat::AnonCreds);
        let out = issuer
            .create_offer(OfferOptions::new(CRED_DEF_ID, attributes()))
            .await
            .unwrap();
        let (record, report) = issuer.abandon(out.record.id, "changed my mind").await.unwrap();
        assert_eq!(record.state(), CredentialExchangeState::Abandoned);
        assert_eq!(record.error_message.as_deref(), Some("changed my mind"));
        assert_eq!(report.message(), "changed my mind");
        assert!(matches!(
            issuer.abandon(out.record.id, "again").await,
            Err(FormatError::ExchangeState(_))
        ));
    }
}
