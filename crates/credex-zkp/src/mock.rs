//! # Mock Signature Library
//!
//! A deterministic, transparent stand-in for the CL-signature library.
//! "Signatures" are SHA-256 digests of the canonical JSON of what a real
//! signature would cover, so a holder can check that the credential it
//! received answers its own request with the values it was offered.
//!
//! ## Security Notice
//!
//! This implementation provides NO unlinkability and NO unforgeability.
//! It exists so the exchange engine can be exercised end to end.

use std::sync::atomic::{AtomicU64, Ordering};

use credex_core::encoding::encode_str;
use credex_core::{CanonicalBytes, CredentialValues};
use serde::Serialize;
use serde_json::{json, Value};

use crate::model::{
    AnonCredsCredential, AnonCredsCredentialDefinition, AnonCredsCredentialOffer,
    AnonCredsCredentialRequest, AnonCredsCredentialRequestMetadata, AnonCredsLinkSecret,
    AnonCredsRevocationRegistryDefinition,
};
use crate::traits::{
    AnonCredsHolder, AnonCredsIssuer, CreateCredentialInput, CreatedCredentialRequest,
    IssuedCredential, ProcessedCredential, ZkpError,
};

/// Mock issuer and holder in one.
#[derive(Debug, Default)]
pub struct MockAnonCreds {
    counter: AtomicU64,
}

impl MockAnonCreds {
    /// Create a mock whose nonce sequence starts at zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_nonce(&self, label: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        encode_str(&format!("{label}:{n}"))
    }
}

fn digest(value: &impl Serialize) -> Result<String, ZkpError> {
    Ok(CanonicalBytes::new(value)?.sha256_hex())
}

fn blind(link_secret: &AnonCredsLinkSecret, offer_nonce: &str) -> Result<Value, ZkpError> {
    Ok(json!({ "u": digest(&json!([link_secret.value, offer_nonce]))? }))
}

#[derive(Serialize)]
struct SignedContent<'a> {
    schema_id: &'a str,
    cred_def_id: &'a str,
    values: &'a CredentialValues,
    blinded_ms: &'a Value,
    rev_reg_id: Option<&'a str>,
    credential_revocation_id: Option<&'a str>,
}

impl SignedContent<'_> {
    fn digest(&self) -> Result<String, ZkpError> {
        digest(self)
    }
}

impl AnonCredsIssuer for MockAnonCreds {
    fn create_credential_offer(
        &self,
        cred_def_id: &str,
        credential_definition: &AnonCredsCredentialDefinition,
    ) -> Result<AnonCredsCredentialOffer, ZkpError> {
        let proof = digest(&json!([cred_def_id, credential_definition.value.primary]))?;
        Ok(AnonCredsCredentialOffer {
            schema_id: credential_definition.schema_id.clone(),
            cred_def_id: cred_def_id.to_string(),
            nonce: self.next_nonce("offer"),
            key_correctness_proof: json!({ "c": proof }),
        })
    }

    fn create_credential(
        &self,
        input: CreateCredentialInput<'_>,
    ) -> Result<IssuedCredential, ZkpError> {
        let CreateCredentialInput {
            offer,
            request,
            values,
            revocation,
        } = input;
        if request.cred_def_id != offer.cred_def_id {
            return Err(ZkpError::CredentialDefinitionMismatch {
                expected: offer.cred_def_id.clone(),
                actual: request.cred_def_id.clone(),
            });
        }

        let (rev_reg_id, credential_revocation_id, rev_reg, witness) = match revocation {
            Some(revocation) => {
                let slot = revocation.slot;
                if usize::try_from(slot.index)
                    .map_or(true, |i| i >= revocation.status_list.revocation_list.len())
                {
                    return Err(ZkpError::IndexOutOfRange {
                        registry_id: slot.registry_id.clone(),
                        index: slot.index,
                    });
                }
                let index = slot.index.to_string();
                (
                    Some(slot.registry_id.clone()),
                    Some(index.clone()),
                    Some(json!({ "accum": revocation.status_list.current_accumulator })),
                    Some(json!({ "credential_revocation_id": index })),
                )
            }
            None => (None, None, None, None),
        };

        let signature = SignedContent {
            schema_id: &offer.schema_id,
            cred_def_id: &offer.cred_def_id,
            values,
            blinded_ms: &request.blinded_ms,
            rev_reg_id: rev_reg_id.as_deref(),
            credential_revocation_id: credential_revocation_id.as_deref(),
        }
        .digest()?;

        Ok(IssuedCredential {
            credential: AnonCredsCredential {
                schema_id: offer.schema_id.clone(),
                cred_def_id: offer.cred_def_id.clone(),
                rev_reg_id,
                values: values.clone(),
                signature: json!({ "digest": signature }),
                signature_correctness_proof: json!({ "nonce": request.nonce }),
                rev_reg,
                witness,
            },
            credential_revocation_id,
        })
    }
}

impl AnonCredsHolder for MockAnonCreds {
    fn create_credential_request(
        &self,
        offer: &AnonCredsCredentialOffer,
        _credential_definition: &AnonCredsCredentialDefinition,
        link_secret: &AnonCredsLinkSecret,
    ) -> Result<CreatedCredentialRequest, ZkpError> {
        let blinded_ms = blind(link_secret, &offer.nonce)?;
        let nonce = self.next_nonce("request");
        let correctness = digest(&json!([blinded_ms, offer.nonce]))?;
        let request = AnonCredsCredentialRequest {
            entropy: Some(self.next_nonce("entropy")),
            prover_did: None,
            cred_def_id: offer.cred_def_id.clone(),
            blinded_ms_correctness_proof: json!({ "c": correctness }),
            blinded_ms: blinded_ms.clone(),
            nonce: nonce.clone(),
        };
        let metadata = AnonCredsCredentialRequestMetadata {
            link_secret_blinding_data: json!({
                "blinded_ms": blinded_ms,
                "offer_nonce": offer.nonce,
            }),
            link_secret_name: link_secret.id.clone(),
            nonce,
        };
        Ok(CreatedCredentialRequest { request, metadata })
    }

    fn process_credential(
        &self,
        credential: &AnonCredsCredential,
        metadata: &AnonCredsCredentialRequestMetadata,
        link_secret: &AnonCredsLinkSecret,
        credential_definition: &AnonCredsCredentialDefinition,
        revocation_registry: Option<&AnonCredsRevocationRegistryDefinition>,
    ) -> Result<ProcessedCredential, ZkpError> {
        let invalid = |reason: &str| ZkpError::InvalidSignature(reason.to_string());

        if credential.signature_correctness_proof["nonce"] != metadata.nonce.as_str() {
            return Err(invalid("signature correctness proof does not answer this request"));
        }
        let blinded_ms = &metadata.link_secret_blinding_data["blinded_ms"];
        let offer_nonce = metadata.link_secret_blinding_data["offer_nonce"]
            .as_str()
            .ok_or_else(|| invalid("request metadata lacks the offer nonce"))?;
        if *blinded_ms != blind(link_secret, offer_nonce)? {
            return Err(invalid("credential is bound to a different link secret"));
        }

        if let Some(rev_reg_id) = &credential.rev_reg_id {
            if !credential_definition.supports_revocation() {
                return Err(invalid("revocable credential under a non-revocable definition"));
            }
            let registry = revocation_registry
                .ok_or_else(|| ZkpError::MissingRevocationStatus(rev_reg_id.clone()))?;
            if registry.cred_def_id != credential.cred_def_id {
                return Err(ZkpError::CredentialDefinitionMismatch {
                    expected: credential.cred_def_id.clone(),
                    actual: registry.cred_def_id.clone(),
                });
            }
        }

        let credential_revocation_id = credential
            .witness
            .as_ref()
            .and_then(|w| w["credential_revocation_id"].as_str());
        let expected = SignedContent {
            schema_id: &credential.schema_id,
            cred_def_id: &credential.cred_def_id,
            values: &credential.values,
            blinded_ms,
            rev_reg_id: credential.rev_reg_id.as_deref(),
            credential_revocation_id,
        }
        .digest()?;
        if credential.signature["digest"] != expected.as_str() {
            return Err(invalid("signature digest mismatch"));
        }
        Ok(ProcessedCredential {
            credential_revocation_id: credential_revocation_id.map(str::to_string),
            credential: credential.clone(),
        })
    }
}
