//! Structural checks on a presentation request before it is answered.

use std::collections::BTreeSet;

use credex_core::identifier::is_unqualified_identifier;

use crate::error::QueryError;
use crate::request::PresentationRequest;

/// Restriction keys whose values are identifiers.
const IDENTIFIER_KEYS: [&str; 6] = [
    "cred_def_id",
    "schema_id",
    "issuer_id",
    "issuer_did",
    "schema_issuer_id",
    "schema_issuer_did",
];

/// Reject a request that asks for the same attribute both as a revealed
/// attribute and as a predicate.
pub fn assert_no_duplicate_group_names(request: &PresentationRequest) -> Result<(), QueryError> {
    let revealed: BTreeSet<&str> = request
        .requested_attributes
        .values()
        .flat_map(|group| group.attribute_names())
        .collect();
    match request
        .requested_predicates
        .values()
        .find(|predicate| revealed.contains(predicate.name.as_str()))
    {
        Some(predicate) => Err(QueryError::DuplicateGroupName(predicate.name.clone())),
        None => Ok(()),
    }
}

/// Whether any restriction references a legacy identifier.
pub fn uses_unqualified_identifiers(request: &PresentationRequest) -> bool {
    request.restrictions().any(|restriction| {
        IDENTIFIER_KEYS.iter().any(|key| {
            restriction
                .get(*key)
                .is_some_and(|value| is_unqualified_identifier(value))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> PresentationRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let req = request(json!({
            "name": "p", "version": "1", "nonce": "1",
            "requested_attributes": {"a": {"names": ["name", "age"]}},
            "requested_predicates": {"p": {"name": "age", "p_type": ">=", "p_value": 18}}
        }));
        assert_eq!(
            assert_no_duplicate_group_names(&req),
            Err(QueryError::DuplicateGroupName("age".into()))
        );
    }

    #[test]
    fn test_distinct_names_accepted() {
        let req = request(json!({
            "name": "p", "version": "1", "nonce": "1",
            "requested_attributes": {"a": {"name": "name"}},
            "requested_predicates": {"p": {"name": "age", "p_type": ">=", "p_value": 18}}
        }));
        assert!(assert_no_duplicate_group_names(&req).is_ok());
    }

    #[test]
    fn test_unqualified_detection() {
        let legacy = request(json!({
            "name": "p", "version": "1", "nonce": "1",
            "requested_attributes": {"a": {"name": "n", "restrictions": [
                {"cred_def_id": "SDqTzbVuCowusqGBNbNDjH:3:CL:12:default"}
            ]}}
        }));
        assert!(uses_unqualified_identifiers(&legacy));

        let qualified = request(json!({
            "name": "p", "version": "1", "nonce": "1",
            "requested_predicates": {"p": {"name": "age", "p_type": ">", "p_value": 1, "restrictions": [
                {"cred_def_id": "did:indy:sovrin:SDqTzbVuCowusqGBNbNDjH/anoncreds/v0/CLAIM_DEF/12/default"},
                {"schema_name": "SDqTzbVuCowusqGBNbNDjH"}
            ]}}
        }));
        assert!(!uses_unqualified_identifiers(&qualified));
    }
}
