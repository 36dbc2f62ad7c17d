//! # AnonCreds Wire Objects
//!
//! Ledger objects (schema, credential definition, revocation registry
//! definition, status list) use camelCase keys. Exchange objects (offer,
//! request, credential) use the snake_case keys the signature library
//! emits. Cryptographic material is carried as opaque JSON.

use credex_core::CredentialValues;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─── Ledger Objects ──────────────────────────────────────────────────

/// A published schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonCredsSchema {
    /// Issuer DID.
    pub issuer_id: String,
    /// Schema name.
    pub name: String,
    /// Schema version.
    pub version: String,
    /// Attribute names a credential of this schema carries.
    pub attr_names: Vec<String>,
}

/// Public key material of a credential definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDefinitionValue {
    /// Primary CL public key.
    pub primary: Value,
    /// Revocation public key; present iff the definition supports revocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation: Option<Value>,
}

/// A published credential definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonCredsCredentialDefinition {
    /// Issuer DID.
    pub issuer_id: String,
    /// Schema the definition is bound to.
    pub schema_id: String,
    /// Signature type, always `CL`.
    #[serde(rename = "type")]
    pub signature_type: String,
    /// Definition tag.
    pub tag: String,
    /// Public key material.
    pub value: CredentialDefinitionValue,
}

impl AnonCredsCredentialDefinition {
    /// Whether credentials issued under this definition are revocable.
    pub fn supports_revocation(&self) -> bool {
        self.value.revocation.is_some()
    }
}

/// Public part of a revocation registry definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDefinitionValue {
    /// Accumulator public keys.
    pub public_keys: Value,
    /// Capacity of the registry.
    pub max_cred_num: u32,
    /// Where the tails file is published.
    pub tails_location: String,
    /// Hash of the tails file.
    pub tails_hash: String,
}

/// A published revocation registry definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonCredsRevocationRegistryDefinition {
    /// Issuer DID.
    pub issuer_id: String,
    /// Always `CL_ACCUM`.
    pub revoc_def_type: String,
    /// Owning credential definition.
    pub cred_def_id: String,
    /// Registry tag.
    pub tag: String,
    /// Public part.
    pub value: RevocationRegistryDefinitionValue,
}

/// Revocation bit list of a registry at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonCredsRevocationStatusList {
    /// Issuer DID.
    pub issuer_id: String,
    /// Registry the list belongs to.
    pub rev_reg_def_id: String,
    /// One entry per index, `1` when revoked.
    pub revocation_list: Vec<u8>,
    /// Current accumulator value.
    pub current_accumulator: String,
    /// Ledger timestamp of this list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

// ─── Exchange Objects ────────────────────────────────────────────────

/// Issuer's credential offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonCredsCredentialOffer {
    /// Schema of the offered credential.
    pub schema_id: String,
    /// Credential definition of the offered credential.
    pub cred_def_id: String,
    /// Issuer nonce the request must echo into its proof.
    pub nonce: String,
    /// Proof that the issuer knows the definition's private key.
    pub key_correctness_proof: Value,
}

/// Holder's credential request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonCredsCredentialRequest {
    /// Holder entropy (did:indy-era requests).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entropy: Option<String>,
    /// Holder DID (legacy requests).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prover_did: Option<String>,
    /// Credential definition being requested.
    pub cred_def_id: String,
    /// Blinded link secret.
    pub blinded_ms: Value,
    /// Proof of correct blinding.
    pub blinded_ms_correctness_proof: Value,
    /// Holder nonce for the issuer's signature correctness proof.
    pub nonce: String,
}

/// A signed credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonCredsCredential {
    /// Schema id.
    pub schema_id: String,
    /// Credential definition id.
    pub cred_def_id: String,
    /// Revocation registry id, for revocable credentials.
    #[serde(default)]
    pub rev_reg_id: Option<String>,
    /// Signed attribute values.
    pub values: CredentialValues,
    /// CL signature.
    pub signature: Value,
    /// Proof the signature is well formed.
    pub signature_correctness_proof: Value,
    /// Registry state at issuance, for revocable credentials.
    #[serde(default)]
    pub rev_reg: Option<Value>,
    /// Non-revocation witness, for revocable credentials.
    #[serde(default)]
    pub witness: Option<Value>,
}

/// Holder-side state produced with a request and required to process the
/// credential that answers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonCredsCredentialRequestMetadata {
    /// Blinding factors of the link secret.
    pub link_secret_blinding_data: Value,
    /// Id of the link secret the request was bound to.
    pub link_secret_name: String,
    /// Holder nonce of the request.
    pub nonce: String,
}

/// A holder's link secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonCredsLinkSecret {
    /// Link secret id.
    pub id: String,
    /// Secret value, decimal.
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credential_definition_revocation_flag() {
        let mut def: AnonCredsCredentialDefinition = serde_json::from_value(json!({
            "issuerId": "did:indy:sovrin:SDqTzbVuCowusqGBNbNDjH",
            "schemaId": "s",
            "type": "CL",
            "tag": "default",
            "value": {"primary": {"n": "1"}}
        }))
        .unwrap();
        assert!(!def.supports_revocation());
        def.value.revocation = Some(json!({"g": "1"}));
        assert!(def.supports_revocation());
        assert_eq!(serde_json::to_value(&def).unwrap()["type"], "CL");
    }

    #[test]
    fn test_offer_uses_snake_case() {
        let offer = AnonCredsCredentialOffer {
            schema_id: "s".into(),
            cred_def_id: "c".into(),
            nonce: "1".into(),
            key_correctness_proof: json!({}),
        };
        let value = serde_json::to_value(&offer).unwrap();
        assert_eq!(value["cred_def_id"], "c");
        assert_eq!(value["schema_id"], "s");
    }
}
