//! # Data Integrity Envelopes
//!
//! The DataIntegrity format carries the same AnonCreds payloads as the
//! AnonCreds format, wrapped in W3C shapes:
//!
//! - the offer is an unsigned W3C credential plus the binding methods the
//!   issuer accepts (`anoncreds_link_secret` carries the AnonCreds offer);
//! - the request carries the AnonCreds request as its
//!   `binding_proof.anoncreds_link_secret`;
//! - the credential is a W3C credential whose `anoncreds-2023` proof value
//!   holds the AnonCreds signature, multibase `u` (base64url, no padding)
//!   over the canonical JSON of the signature bundle.
//!
//! Holders store every W3c-record credential in the same W3C form, so the
//! conversion in both directions lives here.

use std::collections::BTreeMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use credex_core::{CanonicalBytes, CredentialPreviewAttribute, CredentialValue, CredentialValues};
use credex_zkp::{AnonCredsCredential, AnonCredsCredentialOffer, AnonCredsCredentialRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FormatError;
use crate::problem::ProblemReport;

/// JSON-LD context of a v1.1 W3C credential.
pub const W3C_CREDENTIALS_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
/// W3C data model versions a DataIntegrity offer may list.
pub const SUPPORTED_DATA_MODEL_VERSIONS: [&str; 2] = ["1.1", "2.0"];
/// Cryptosuite of the AnonCreds data-integrity proof.
pub const ANONCREDS_CRYPTOSUITE: &str = "anoncreds-2023";

const CREDENTIAL_SCHEMA_TYPE: &str = "AnonCredsDefinition";
const MULTIBASE_BASE64URL: char = 'u';

// ─── W3C Credential ──────────────────────────────────────────────────

/// `credentialSchema` of an AnonCreds-backed W3C credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonCredsCredentialSchema {
    /// Always `AnonCredsDefinition`.
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Credential definition id.
    pub definition: String,
    /// Schema id.
    pub schema: String,
    /// Revocation registry id, for revocable credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation: Option<String>,
}

impl AnonCredsCredentialSchema {
    /// Schema block for the given ids.
    pub fn new(cred_def_id: &str, schema_id: &str, rev_reg_id: Option<&str>) -> Self {
        Self {
            schema_type: CREDENTIAL_SCHEMA_TYPE.to_string(),
            definition: cred_def_id.to_string(),
            schema: schema_id.to_string(),
            revocation: rev_reg_id.map(str::to_string),
        }
    }
}

/// An `anoncreds-2023` data-integrity proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataIntegrityProof {
    /// Always `DataIntegrityProof`.
    #[serde(rename = "type")]
    pub proof_type: String,
    /// Always `anoncreds-2023`.
    pub cryptosuite: String,
    /// Always `assertionMethod`.
    pub proof_purpose: String,
    /// Credential definition id.
    pub verification_method: String,
    /// Multibase-encoded signature bundle.
    pub proof_value: String,
}

/// A W3C verifiable credential with string claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct W3cCredential {
    /// JSON-LD contexts.
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// Credential types.
    #[serde(rename = "type")]
    pub types: Vec<String>,
    /// Issuer DID.
    pub issuer: String,
    /// Issuance time.
    pub issuance_date: DateTime<Utc>,
    /// Raw attribute values by name.
    pub credential_subject: BTreeMap<String, String>,
    /// AnonCreds provenance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_schema: Option<AnonCredsCredentialSchema>,
    /// Present on issued credentials only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<DataIntegrityProof>,
}

impl W3cCredential {
    fn unsigned(
        issuer: &str,
        issuance_date: DateTime<Utc>,
        credential_subject: BTreeMap<String, String>,
        credential_schema: AnonCredsCredentialSchema,
    ) -> Self {
        Self {
            context: vec![W3C_CREDENTIALS_CONTEXT.to_string()],
            types: vec!["VerifiableCredential".to_string()],
            issuer: issuer.to_string(),
            issuance_date,
            credential_subject,
            credential_schema: Some(credential_schema),
            proof: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SignatureBundle {
    signature: Value,
    signature_correctness_proof: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rev_reg: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    witness: Option<Value>,
}

/// Wrap an AnonCreds credential as a W3C credential with an
/// `anoncreds-2023` proof.
pub fn to_w3c_credential(
    credential: &AnonCredsCredential,
    issuer_id: &str,
    issuance_date: DateTime<Utc>,
) -> Result<W3cCredential, FormatError> {
    let bundle = SignatureBundle {
        signature: credential.signature.clone(),
        signature_correctness_proof: credential.signature_correctness_proof.clone(),
        rev_reg: credential.rev_reg.clone(),
        witness: credential.witness.clone(),
    };
    let bytes = CanonicalBytes::new(&bundle)?;
    let proof_value = format!(
        "{MULTIBASE_BASE64URL}{}",
        URL_SAFE_NO_PAD.encode(bytes.as_bytes())
    );

    let subject = credential
        .values
        .iter()
        .map(|(name, value)| (name.clone(), value.raw.clone()))
        .collect();
    let mut w3c = W3cCredential::unsigned(
        issuer_id,
        issuance_date,
        subject,
        AnonCredsCredentialSchema::new(
            &credential.cred_def_id,
            &credential.schema_id,
            credential.rev_reg_id.as_deref(),
        ),
    );
    w3c.proof = Some(DataIntegrityProof {
        proof_type: "DataIntegrityProof".to_string(),
        cryptosuite: ANONCREDS_CRYPTOSUITE.to_string(),
        proof_purpose: "assertionMethod".to_string(),
        verification_method: credential.cred_def_id.clone(),
        proof_value,
    });
    Ok(w3c)
}

/// Recover the AnonCreds credential carried by a W3C credential.
pub fn from_w3c_credential(credential: &W3cCredential) -> Result<AnonCredsCredential, FormatError> {
    let schema = credential
        .credential_schema
        .as_ref()
        .ok_or_else(|| FormatError::MissingData("credentialSchema".into()))?;
    let proof = credential
        .proof
        .as_ref()
        .filter(|p| p.cryptosuite == ANONCREDS_CRYPTOSUITE)
        .ok_or_else(|| FormatError::MissingData("anoncreds-2023 proof".into()))?;
    let encoded = proof
        .proof_value
        .strip_prefix(MULTIBASE_BASE64URL)
        .ok_or_else(|| FormatError::Payload("proofValue is not multibase base64url".into()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| FormatError::Payload(format!("proofValue: {e}")))?;
    let bundle: SignatureBundle = serde_json::from_slice(&bytes)
        .map_err(|e| FormatError::Payload(format!("proofValue: {e}")))?;

    let values: CredentialValues = credential
        .credential_subject
        .iter()
        .map(|(name, raw)| (name.clone(), CredentialValue::from_raw(raw.clone())))
        .collect();
    Ok(AnonCredsCredential {
        schema_id: schema.schema.clone(),
        cred_def_id: schema.definition.clone(),
        rev_reg_id: schema.revocation.clone(),
        values,
        signature: bundle.signature,
        signature_correctness_proof: bundle.signature_correctness_proof,
        rev_reg: bundle.rev_reg,
        witness: bundle.witness,
    })
}

// ─── Offer ───────────────────────────────────────────────────────────

/// Link-secret binding offered by the issuer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonCredsLinkSecretBindingMethod {
    /// Credential definition id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_def_id: Option<String>,
    /// Issuer nonce.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Key correctness proof.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_correctness_proof: Option<Value>,
}

/// Signed-attachment binding offered by the issuer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidCommSignedAttachmentBindingMethod {
    /// JWA algorithms the issuer verifies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algs_supported: Option<Vec<String>>,
    /// DID methods the issuer resolves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did_methods_supported: Option<Vec<String>>,
    /// Nonce the signed attachment must carry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Holder-binding methods the issuer accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingMethod {
    /// AnonCreds link-secret binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anoncreds_link_secret: Option<AnonCredsLinkSecretBindingMethod>,
    /// Signed-attachment binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub didcomm_signed_attachment: Option<DidCommSignedAttachmentBindingMethod>,
}

/// `didcomm/w3c-di-vc-offer@v0.1` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataIntegrityCredentialOffer {
    /// W3C data model versions the issuer can issue.
    #[serde(default)]
    pub data_model_versions_supported: Vec<String>,
    /// Whether the holder must bind the credential.
    #[serde(default)]
    pub binding_required: bool,
    /// Accepted binding methods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_method: Option<BindingMethod>,
    /// The credential to be issued, without proof.
    pub credential: W3cCredential,
}

impl DataIntegrityCredentialOffer {
    /// Wrap an AnonCreds offer for `attributes`.
    pub fn new(
        offer: &AnonCredsCredentialOffer,
        issuer_id: &str,
        attributes: &[CredentialPreviewAttribute],
    ) -> Self {
        let subject = attributes
            .iter()
            .map(|a| (a.name.clone(), a.value.clone()))
            .collect();
        Self {
            data_model_versions_supported: vec!["1.1".to_string()],
            binding_required: true,
            binding_method: Some(BindingMethod {
                anoncreds_link_secret: Some(AnonCredsLinkSecretBindingMethod {
                    cred_def_id: Some(offer.cred_def_id.clone()),
                    nonce: Some(offer.nonce.clone()),
                    key_correctness_proof: Some(offer.key_correctness_proof.clone()),
                }),
                didcomm_signed_attachment: None,
            }),
            credential: W3cCredential::unsigned(
                issuer_id,
                Utc::now(),
                subject,
                AnonCredsCredentialSchema::new(&offer.cred_def_id, &offer.schema_id, None),
            ),
        }
    }

    /// Check the envelope is well formed.
    pub fn validate(&self) -> Result<(), ProblemReport> {
        let invalid = |reason: &str| {
            Err(ProblemReport::issuance_abandoned(format!(
                "Invalid credential offer: {reason}"
            )))
        };
        let methods = self.binding_method.clone().unwrap_or_default();
        if self.binding_required
            && methods.anoncreds_link_secret.is_none()
            && methods.didcomm_signed_attachment.is_none()
        {
            return invalid("binding required but no binding method offered");
        }
        if self.data_model_versions_supported.is_empty()
            || self
                .data_model_versions_supported
                .iter()
                .any(|v| !SUPPORTED_DATA_MODEL_VERSIONS.contains(&v.as_str()))
        {
            return invalid("unsupported data model versions");
        }
        if let Some(link_secret) = &methods.anoncreds_link_secret {
            if link_secret.cred_def_id.is_none()
                || link_secret.nonce.is_none()
                || link_secret.key_correctness_proof.is_none()
            {
                return invalid("incomplete anoncreds_link_secret binding method");
            }
        }
        if let Some(signed) = &methods.didcomm_signed_attachment {
            if signed.algs_supported.is_none()
                || signed.did_methods_supported.is_none()
                || signed.nonce.is_none()
            {
                return invalid("incomplete didcomm_signed_attachment binding method");
            }
        }
        Ok(())
    }

    /// The AnonCreds offer inside the link-secret binding method.
    pub fn anoncreds_offer(&self) -> Result<AnonCredsCredentialOffer, ProblemReport> {
        let missing = || {
            ProblemReport::issuance_abandoned(
                "Invalid credential offer: no anoncreds_link_secret binding method",
            )
        };
        let binding = self
            .binding_method
            .as_ref()
            .and_then(|m| m.anoncreds_link_secret.as_ref())
            .ok_or_else(missing)?;
        let schema = self.credential.credential_schema.as_ref().ok_or_else(|| {
            ProblemReport::issuance_abandoned("Invalid credential offer: no credentialSchema")
        })?;
        match (&binding.cred_def_id, &binding.nonce, &binding.key_correctness_proof) {
            (Some(cred_def_id), Some(nonce), Some(proof)) => Ok(AnonCredsCredentialOffer {
                schema_id: schema.schema.clone(),
                cred_def_id: cred_def_id.clone(),
                nonce: nonce.clone(),
                key_correctness_proof: proof.clone(),
            }),
            _ => Err(missing()),
        }
    }

    /// Preview attributes from the offered credential subject.
    pub fn attributes(&self) -> Vec<CredentialPreviewAttribute> {
        self.credential
            .credential_subject
            .iter()
            .map(|(name, value)| CredentialPreviewAttribute::new(name.clone(), value.clone()))
            .collect()
    }
}

// ─── Request ─────────────────────────────────────────────────────────

/// Holder-binding proofs of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingProof {
    /// AnonCreds request bound to the holder's link secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anoncreds_link_secret: Option<AnonCredsCredentialRequest>,
    /// Reference to a signed binding attachment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub didcomm_signed_attachment: Option<Value>,
}

/// `didcomm/w3c-di-vc-request@v0.1` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataIntegrityCredentialRequest {
    /// Chosen W3C data model version.
    pub data_model_version: String,
    /// Binding proofs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_proof: Option<BindingProof>,
}

impl DataIntegrityCredentialRequest {
    /// Wrap an AnonCreds request.
    pub fn new(request: AnonCredsCredentialRequest, data_model_version: &str) -> Self {
        Self {
            data_model_version: data_model_version.to_string(),
            binding_proof: Some(BindingProof {
                anoncreds_link_secret: Some(request),
                didcomm_signed_attachment: None,
            }),
        }
    }

    /// The AnonCreds request inside the link-secret binding proof.
    pub fn anoncreds_request(&self) -> Result<AnonCredsCredentialRequest, ProblemReport> {
        self.binding_proof
            .as_ref()
            .and_then(|p| p.anoncreds_link_secret.clone())
            .ok_or_else(|| {
                ProblemReport::issuance_abandoned(
                    "Invalid credential request: no anoncreds_link_secret binding proof",
                )
            })
    }
}

// ─── Credential ──────────────────────────────────────────────────────

/// `didcomm/w3c-di-vc@v0.1` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataIntegrityCredential {
    /// The signed credential.
    pub credential: W3cCredential,
}
