//! End-to-end issuance between an issuer and a holder coordinator over the
//! in-memory collaborators and the mock signature library.

use std::sync::Arc;

use credex_core::{CredentialPreviewAttribute, ValidationError};
use credex_format::memory::{
    InMemoryAnonCredsResolver, InMemoryCredentialStore, InMemoryExchangeRecordStore,
    InMemoryLinkSecretStore,
};
use credex_format::record::{CREDENTIAL_REVOCATION_ID_TAG, REVOCATION_REGISTRY_ID_TAG};
use credex_format::{
    Attachment, Collaborators, CoordinatorConfig, CredentialExchangeRecord, CredentialFormat,
    CredentialFormatCoordinator, CredentialRecordType, CredentialStore, FormatError, OfferOptions,
    ProblemReportReason,
};
use credex_state::{
    CredentialExchangeState, RevocationRegistryRecord, RevocationRegistryTracker,
    RevocationStateError,
};
use credex_zkp::{
    AnonCredsCredentialDefinition, AnonCredsCredentialOffer, AnonCredsLinkSecret,
    AnonCredsRevocationRegistryDefinition, AnonCredsRevocationStatusList, AnonCredsSchema,
    CredentialDefinitionValue, MockAnonCreds, RevocationRegistryDefinitionValue,
};
use serde_json::json;

const DID: &str = "SDqTzbVuCowusqGBNbNDjH";
const NAMESPACE: &str = "bcovrin:test";
const SCHEMA_ID: &str = "SDqTzbVuCowusqGBNbNDjH:2:person:1.0";
const CRED_DEF_ID: &str = "SDqTzbVuCowusqGBNbNDjH:3:CL:12:default";
const REVOCABLE_CRED_DEF_ID: &str = "SDqTzbVuCowusqGBNbNDjH:3:CL:12:revocable";
const REV_REG_ID: &str =
    "SDqTzbVuCowusqGBNbNDjH:4:SDqTzbVuCowusqGBNbNDjH:3:CL:12:revocable:CL_ACCUM:tag1";

fn definition(revocable: bool) -> AnonCredsCredentialDefinition {
    AnonCredsCredentialDefinition {
        issuer_id: DID.into(),
        schema_id: SCHEMA_ID.into(),
        signature_type: "CL".into(),
        tag: if revocable { "revocable" } else { "default" }.into(),
        value: CredentialDefinitionValue {
            primary: json!({"n": "101"}),
            revocation: revocable.then(|| json!({"g": "1"})),
        },
    }
}

fn ledger() -> InMemoryAnonCredsResolver {
    let ledger = InMemoryAnonCredsResolver::new();
    ledger.register_schema(
        SCHEMA_ID,
        AnonCredsSchema {
            issuer_id: DID.into(),
            name: "person".into(),
            version: "1.0".into(),
            attr_names: vec!["name".into(), "age".into()],
        },
        Some(NAMESPACE),
    );
    ledger.register_credential_definition(CRED_DEF_ID, definition(false), Some(NAMESPACE));
    ledger.register_credential_definition(REVOCABLE_CRED_DEF_ID, definition(true), Some(NAMESPACE));
    ledger.register_revocation_registry_definition(
        REV_REG_ID,
        AnonCredsRevocationRegistryDefinition {
            issuer_id: DID.into(),
            revoc_def_type: "CL_ACCUM".into(),
            cred_def_id: REVOCABLE_CRED_DEF_ID.into(),
            tag: "tag1".into(),
            value: RevocationRegistryDefinitionValue {
                public_keys: json!({"accumKey": {"z": "1"}}),
                max_cred_num: 8,
                tails_location: "https://tails.invalid/tag1".into(),
                tails_hash: "hash".into(),
            },
        },
        Some(NAMESPACE),
    );
    ledger.register_revocation_status_list(
        AnonCredsRevocationStatusList {
            issuer_id: DID.into(),
            rev_reg_def_id: REV_REG_ID.into(),
            revocation_list: vec![0; 8],
            current_accumulator: "21 1".into(),
            timestamp: Some(1_700_000_000),
        },
        Some(NAMESPACE),
    );
    ledger
}

struct Party {
    coordinator: CredentialFormatCoordinator,
    credentials: Arc<InMemoryCredentialStore>,
    tracker: RevocationRegistryTracker,
}

fn party(format: CredentialFormat, ledger: &InMemoryAnonCredsResolver) -> Party {
    let credentials = Arc::new(InMemoryCredentialStore::new(format.credential_record_type()));
    let link_secrets = InMemoryLinkSecretStore::new();
    link_secrets.insert(
        AnonCredsLinkSecret {
            id: "main".into(),
            value: "1234567890".into(),
        },
        true,
    );
    let tracker = RevocationRegistryTracker::new();
    let zkp = Arc::new(MockAnonCreds::new());
    let coordinator = CredentialFormatCoordinator::new(
        format,
        Collaborators {
            resolver: Arc::new(ledger.clone()),
            records: Arc::new(InMemoryExchangeRecordStore::new()),
            credentials: credentials.clone(),
            link_secrets: Arc::new(link_secrets),
            issuer: zkp.clone(),
            holder: zkp,
            revocation: tracker.clone(),
        },
        CoordinatorConfig::default(),
    );
    Party {
        coordinator,
        credentials,
        tracker,
    }
}

fn attributes() -> Vec<CredentialPreviewAttribute> {
    vec![
        CredentialPreviewAttribute::new("name", "Alice"),
        CredentialPreviewAttribute::new("age", "30"),
    ]
}

#[tokio::test]
async fn test_anoncreds_issuance_ends_done_with_w3c_credential() {
    let ledger = ledger();
    let issuer = party(CredentialFormat::AnonCreds, &ledger);
    let holder = party(CredentialFormat::AnonCreds, &ledger);

    let offer = issuer
        .coordinator
        .create_offer(OfferOptions::new(CRED_DEF_ID, attributes()))
        .await
        .unwrap();
    let offer_att = offer.output.attachment;

    let holder_record = holder
        .coordinator
        .process_offer(None, &offer_att, Some(attributes()))
        .await
        .unwrap();
    assert_eq!(holder_record.state(), CredentialExchangeState::Offered);

    let request = holder
        .coordinator
        .accept_offer(holder_record.id, &offer_att, None)
        .await
        .unwrap();
    assert!(request.record.metadata().credential_request().is_some());
    let request_att = request.output.attachment;

    issuer
        .coordinator
        .process_request(offer.record.id, &request_att)
        .await
        .unwrap();
    assert!(credex_format::auto_respond::should_auto_respond_to_request(
        CredentialFormat::AnonCreds,
        &offer_att,
        &request_att
    ));
    assert!(!issuer
        .coordinator
        .should_auto_respond_to_request(&offer_att, &request_att));
    let credential = issuer
        .coordinator
        .accept_request(offer.record.id, &offer_att, &request_att)
        .await
        .unwrap();
    assert_eq!(credential.record.state(), CredentialExchangeState::Issued);
    let credential_att = credential.output.attachment;

    let stored = holder
        .coordinator
        .process_credential(holder_record.id, &credential_att)
        .await
        .unwrap();
    assert_eq!(stored.state(), CredentialExchangeState::Stored);
    assert_eq!(stored.credentials.len(), 1);
    assert_eq!(stored.credentials[0].record_type, CredentialRecordType::W3c);

    let done = holder.coordinator.complete(holder_record.id).await.unwrap();
    assert_eq!(done.state(), CredentialExchangeState::Done);
    let issuer_done = issuer.coordinator.complete(offer.record.id).await.unwrap();
    assert_eq!(issuer_done.state(), CredentialExchangeState::Done);

    assert_eq!(holder.credentials.len(), 1);
    let w3c = holder
        .credentials
        .get(&stored.credentials[0].credential_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(w3c.credential["issuer"], json!("did:indy:bcovrin:test:SDqTzbVuCowusqGBNbNDjH"));
    assert_eq!(w3c.credential["credentialSubject"]["name"], json!("Alice"));

    let holder_meta = done.metadata().credential().unwrap();
    let issuer_meta = issuer_done.metadata().credential().unwrap();
    assert_eq!(holder_meta.schema_id, issuer_meta.schema_id);
    assert_eq!(holder_meta.credential_definition_id, issuer_meta.credential_definition_id);
    assert!(holder_meta.revocation.is_none());
}

/// Run an AnonCreds exchange up to the issued credential. The issuer signs
/// `attributes()`; the holder records `holder_attributes` from the offer.
async fn issued_to_holder(
    holder_attributes: Option<Vec<CredentialPreviewAttribute>>,
) -> (Party, CredentialExchangeRecord, Attachment) {
    let ledger = ledger();
    let issuer = party(CredentialFormat::AnonCreds, &ledger);
    let holder = party(CredentialFormat::AnonCreds, &ledger);

    let offer = issuer
        .coordinator
        .create_offer(OfferOptions::new(CRED_DEF_ID, attributes()))
        .await
        .unwrap();
    let offer_att = offer.output.attachment;
    let holder_record = holder
        .coordinator
        .process_offer(None, &offer_att, holder_attributes)
        .await
        .unwrap();
    let request_att = holder
        .coordinator
        .accept_offer(holder_record.id, &offer_att, None)
        .await
        .unwrap()
        .output
        .attachment;
    issuer
        .coordinator
        .process_request(offer.record.id, &request_att)
        .await
        .unwrap();
    let credential_att = issuer
        .coordinator
        .accept_request(offer.record.id, &offer_att, &request_att)
        .await
        .unwrap()
        .output
        .attachment;
    (holder, holder_record, credential_att)
}

#[tokio::test]
async fn test_credential_without_recorded_attributes_is_rejected() {
    let (holder, holder_record, credential_att) = issued_to_holder(None).await;
    assert!(holder_record.credential_attributes.is_none());

    let err = holder
        .coordinator
        .process_credential(holder_record.id, &credential_att)
        .await
        .unwrap_err();
    assert!(matches!(err, FormatError::MissingData(_)));

    let record = holder.coordinator.find_record(holder_record.id).await.unwrap();
    assert_eq!(record.state(), CredentialExchangeState::Requested);
    assert!(record.credentials.is_empty());
    assert!(holder.credentials.is_empty());
}

#[tokio::test]
async fn test_credential_with_different_values_is_rejected() {
    let offered = vec![
        CredentialPreviewAttribute::new("name", "Bob"),
        CredentialPreviewAttribute::new("age", "30"),
    ];
    let (holder, holder_record, credential_att) = issued_to_holder(Some(offered)).await;

    let err = holder
        .coordinator
        .process_credential(holder_record.id, &credential_att)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FormatError::Validation(ValidationError::EncodedValueMismatch(ref key)) if key == "name"
    ));

    let record = holder.coordinator.find_record(holder_record.id).await.unwrap();
    assert_eq!(record.state(), CredentialExchangeState::Requested);
    assert!(record.credentials.is_empty());
    assert!(holder.credentials.is_empty());
}

#[tokio::test]
async fn test_revocable_issuance_writes_revocation_identifiers() {
    let ledger = ledger();
    let issuer = party(CredentialFormat::AnonCreds, &ledger);
    let holder = party(CredentialFormat::AnonCreds, &ledger);
    issuer
        .tracker
        .register(RevocationRegistryRecord::new(REV_REG_ID, REVOCABLE_CRED_DEF_ID, 8));
    issuer.tracker.activate(REV_REG_ID).unwrap();

    let offer = issuer
        .coordinator
        .create_offer(
            OfferOptions::new(REVOCABLE_CRED_DEF_ID, attributes()).with_revocation(REV_REG_ID, 0),
        )
        .await
        .unwrap();
    assert_eq!(offer.record.tag(REVOCATION_REGISTRY_ID_TAG), Some(REV_REG_ID));
    assert_eq!(offer.record.tag(CREDENTIAL_REVOCATION_ID_TAG), Some("0"));
    let offer_att = offer.output.attachment;

    let holder_record = holder
        .coordinator
        .process_offer(None, &offer_att, Some(attributes()))
        .await
        .unwrap();
    let request_att = holder
        .coordinator
        .accept_offer(holder_record.id, &offer_att, Some("main"))
        .await
        .unwrap()
        .output
        .attachment;
    issuer
        .coordinator
        .process_request(offer.record.id, &request_att)
        .await
        .unwrap();
    let issued = issuer
        .coordinator
        .accept_request(offer.record.id, &offer_att, &request_att)
        .await
        .unwrap();
    let issuer_revocation = issued
        .record
        .metadata()
        .credential()
        .and_then(|m| m.revocation.clone())
        .unwrap();
    assert_eq!(issuer_revocation.revocation_registry_id, REV_REG_ID);
    assert_eq!(issuer_revocation.credential_revocation_id, "0");

    let stored = holder
        .coordinator
        .process_credential(holder_record.id, &issued.output.attachment)
        .await
        .unwrap();
    assert_eq!(stored.tag(REVOCATION_REGISTRY_ID_TAG), Some(REV_REG_ID));
    assert_eq!(stored.tag(CREDENTIAL_REVOCATION_ID_TAG), Some("0"));
    assert_eq!(
        stored.metadata().credential().and_then(|m| m.revocation.clone()),
        Some(issuer_revocation)
    );

    let found = issuer
        .coordinator
        .find_by_revocation(REV_REG_ID, "0")
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, offer.record.id);
}

#[tokio::test]
async fn test_full_registry_blocks_issuance_and_keeps_record() {
    let ledger = ledger();
    let issuer = party(CredentialFormat::AnonCreds, &ledger);
    let holder = party(CredentialFormat::AnonCreds, &ledger);
    issuer
        .tracker
        .register(RevocationRegistryRecord::new(REV_REG_ID, REVOCABLE_CRED_DEF_ID, 8));
    issuer.tracker.activate(REV_REG_ID).unwrap();

    let offer = issuer
        .coordinator
        .create_offer(
            OfferOptions::new(REVOCABLE_CRED_DEF_ID, attributes()).with_revocation(REV_REG_ID, 3),
        )
        .await
        .unwrap();
    let offer_att = offer.output.attachment;
    let holder_record = holder
        .coordinator
        .process_offer(None, &offer_att, None)
        .await
        .unwrap();
    let request_att = holder
        .coordinator
        .accept_offer(holder_record.id, &offer_att, None)
        .await
        .unwrap()
        .output
        .attachment;
    issuer
        .coordinator
        .process_request(offer.record.id, &request_att)
        .await
        .unwrap();

    issuer.tracker.mark_full(REV_REG_ID).unwrap();
    let err = issuer
        .coordinator
        .accept_request(offer.record.id, &offer_att, &request_att)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FormatError::RevocationState(RevocationStateError::NotActive { .. })
    ));
    let record = issuer.coordinator.find_record(offer.record.id).await.unwrap();
    assert_eq!(record.state(), CredentialExchangeState::Requested);
}

#[tokio::test]
async fn test_registry_id_without_index_is_rejected() {
    let ledger = ledger();
    let issuer = party(CredentialFormat::AnonCreds, &ledger);
    let options = OfferOptions {
        revocation_registry_id: Some(REV_REG_ID.into()),
        ..OfferOptions::new(REVOCABLE_CRED_DEF_ID, attributes())
    };
    let err = issuer.coordinator.create_offer(options).await.unwrap_err();
    assert!(matches!(
        err,
        FormatError::RevocationState(RevocationStateError::IncompleteSlot { .. })
    ));
}

#[tokio::test]
async fn test_legacy_rejects_qualified_offer() {
    let ledger = ledger();
    let holder = party(CredentialFormat::Legacy, &ledger);
    let offer = AnonCredsCredentialOffer {
        schema_id: SCHEMA_ID.into(),
        cred_def_id: "did:indy:bcovrin:test:SDqTzbVuCowusqGBNbNDjH/anoncreds/v0/CLAIM_DEF/12/default"
            .into(),
        nonce: "1".into(),
        key_correctness_proof: json!({}),
    };
    let attachment = CredentialFormat::Legacy
        .encode_offer(None, &offer, DID, &attributes())
        .unwrap()
        .attachment;
    let err = holder
        .coordinator
        .process_offer(None, &attachment, Some(attributes()))
        .await
        .unwrap_err();
    let report = err.problem_report().unwrap();
    assert_eq!(report.reason(), ProblemReportReason::IssuanceAbandoned);
}

#[tokio::test]
async fn test_legacy_issuance_stores_legacy_record() {
    let ledger = ledger();
    let issuer = party(CredentialFormat::Legacy, &ledger);
    let holder = party(CredentialFormat::Legacy, &ledger);

    let offer = issuer
        .coordinator
        .create_offer(OfferOptions::new(CRED_DEF_ID, attributes()))
        .await
        .unwrap();
    assert_eq!(offer.output.format.format, "hlindy/cred-abstract@v2.0");
    let offer_att = offer.output.attachment;
    let holder_record = holder
        .coordinator
        .process_offer(None, &offer_att, Some(attributes()))
        .await
        .unwrap();
    let request_att = holder
        .coordinator
        .accept_offer(holder_record.id, &offer_att, None)
        .await
        .unwrap()
        .output
        .attachment;
    issuer
        .coordinator
        .process_request(offer.record.id, &request_att)
        .await
        .unwrap();
    let credential_att = issuer
        .coordinator
        .accept_request(offer.record.id, &offer_att, &request_att)
        .await
        .unwrap()
        .output
        .attachment;
    let stored = holder
        .coordinator
        .process_credential(holder_record.id, &credential_att)
        .await
        .unwrap();
    assert_eq!(stored.credentials[0].record_type, CredentialRecordType::Legacy);
    let record = holder
        .credentials
        .get(&stored.credentials[0].credential_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.credential["cred_def_id"], json!(CRED_DEF_ID));
    assert!(record.tags.contains_key("attr::name::marker"));
}

#[tokio::test]
async fn test_data_integrity_issuance() {
    let ledger = ledger();
    let issuer = party(CredentialFormat::DataIntegrity, &ledger);
    let holder = party(CredentialFormat::DataIntegrity, &ledger);

    let offer = issuer
        .coordinator
        .create_offer(OfferOptions::new(CRED_DEF_ID, attributes()))
        .await
        .unwrap();
    assert_eq!(offer.output.format.format, "didcomm/w3c-di-vc-offer@v0.1");
    let offer_att = offer.output.attachment;

    let holder_record = holder
        .coordinator
        .process_offer(None, &offer_att, None)
        .await
        .unwrap();
    assert_eq!(holder_record.credential_attributes.as_ref().map(Vec::len), Some(2));

    let request = holder
        .coordinator
        .accept_offer(holder_record.id, &offer_att, None)
        .await
        .unwrap();
    assert_eq!(request.output.format.format, "didcomm/w3c-di-vc-request@v0.1");
    let request_att = request.output.attachment;

    issuer
        .coordinator
        .process_request(offer.record.id, &request_att)
        .await
        .unwrap();
    let credential_att = issuer
        .coordinator
        .accept_request(offer.record.id, &offer_att, &request_att)
        .await
        .unwrap()
        .output
        .attachment;

    let stored = holder
        .coordinator
        .process_credential(holder_record.id, &credential_att)
        .await
        .unwrap();
    assert_eq!(stored.state(), CredentialExchangeState::Stored);
    assert_eq!(holder.credentials.len(), 1);

    let deleted = holder
        .coordinator
        .delete_credential(&stored.credentials[0].credential_id)
        .await
        .unwrap();
    assert!(deleted);
    assert!(holder.credentials.is_empty());
}

#[tokio::test]
async fn test_data_integrity_has_no_proposal() {
    let ledger = ledger();
    let holder = party(CredentialFormat::DataIntegrity, &ledger);
    let err = holder
        .coordinator
        .create_proposal(Default::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, FormatError::NotSupported(_)));
}
