//! # Attribute Value Codec
//!
//! AnonCreds signatures are computed over integers, so every raw attribute
//! value is mapped into a decimal integer string before signing. The mapping
//! must be identical on the issuer, holder and verifier side.
//!
//! ## Encoding Rules
//!
//! | Raw value | Encoded |
//! |---|---|
//! | `true` / `false` | `"1"` / `"0"` |
//! | number or numeric string in `i32` range | decimal, no leading zeros |
//! | `null` or absent | SHA-256 of the literal `"None"` |
//! | anything else | SHA-256 of the UTF-8 text, big-endian, as decimal |
//! | object or array | rejected |

use std::collections::BTreeMap;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};

use crate::attributes::CredentialPreviewAttribute;
use crate::error::ValidationError;

/// Text hashed in place of a missing value.
const NONE_LITERAL: &str = "None";

/// One signed attribute: the raw text and its integer encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialValue {
    /// Raw attribute value as presented to the holder.
    pub raw: String,
    /// Decimal integer string the signature covers.
    pub encoded: String,
}

impl CredentialValue {
    /// Build a value from raw text, encoding it.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let encoded = encode_str(&raw);
        Self { raw, encoded }
    }
}

/// Attribute name to value. Keys are unique and iterate in sorted order.
pub type CredentialValues = BTreeMap<String, CredentialValue>;

/// Encode a JSON raw value.
///
/// # Errors
///
/// Returns `ValidationError::UnsupportedValueType` for objects and arrays.
pub fn encode(raw: &Value) -> Result<String, ValidationError> {
    match raw {
        Value::Bool(b) => Ok(if *b { "1" } else { "0" }.to_string()),
        Value::Number(n) => Ok(match number_as_i32(n) {
            Some(i) => i.to_string(),
            None => hash_to_decimal(&n.to_string()),
        }),
        Value::String(s) => Ok(encode_str(s)),
        Value::Null => Ok(hash_to_decimal(NONE_LITERAL)),
        Value::Array(_) => Err(ValidationError::UnsupportedValueType("array")),
        Value::Object(_) => Err(ValidationError::UnsupportedValueType("object")),
    }
}

/// Encode a value that may be absent. Absent encodes exactly like `null`.
pub fn encode_optional(raw: Option<&Value>) -> Result<String, ValidationError> {
    raw.map_or_else(|| Ok(hash_to_decimal(NONE_LITERAL)), encode)
}

/// Encode raw text. Infallible: text is never object-typed.
pub fn encode_str(raw: &str) -> String {
    match str_as_i32(raw) {
        Some(i) => i.to_string(),
        None => hash_to_decimal(raw),
    }
}

/// Whether `encoded` is the encoding of `raw`.
pub fn matches(raw: &Value, encoded: &str) -> bool {
    encode(raw).map(|e| e == encoded).unwrap_or(false)
}

/// Encode a list of preview attributes into credential values.
///
/// # Errors
///
/// Returns `ValidationError::DuplicateAttribute` if a name repeats.
pub fn batch_encode(
    attributes: &[CredentialPreviewAttribute],
) -> Result<CredentialValues, ValidationError> {
    let mut values = CredentialValues::new();
    for attribute in attributes {
        let value = CredentialValue::from_raw(attribute.value.clone());
        if values.insert(attribute.name.clone(), value).is_some() {
            return Err(ValidationError::DuplicateAttribute(attribute.name.clone()));
        }
    }
    Ok(values)
}

/// Assert two credential value maps are identical, naming the first
/// offending key.
pub fn assert_values_match(
    first: &CredentialValues,
    second: &CredentialValues,
) -> Result<(), ValidationError> {
    if first.len() != second.len() {
        return Err(ValidationError::ValueCountMismatch {
            first: first.len(),
            second: second.len(),
        });
    }
    for (key, value) in first {
        let other = second
            .get(key)
            .ok_or_else(|| ValidationError::MissingValue(key.clone()))?;
        if value.encoded != other.encoded {
            return Err(ValidationError::EncodedValueMismatch(key.clone()));
        }
        if value.raw != other.raw {
            return Err(ValidationError::RawValueMismatch(key.clone()));
        }
    }
    Ok(())
}

/// Non-failing form of [`assert_values_match`].
pub fn check_values_match(first: &CredentialValues, second: &CredentialValues) -> bool {
    assert_values_match(first, second).is_ok()
}

fn number_as_i32(n: &Number) -> Option<i32> {
    if let Some(i) = n.as_i64() {
        return i32::try_from(i).ok();
    }
    let f = n.as_f64()?;
    let in_range = f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX);
    // Integral floats such as 5.0 are integers for encoding purposes.
    if f.fract() == 0.0 && in_range {
        Some(f as i32)
    } else {
        None
    }
}

fn str_as_i32(s: &str) -> Option<i32> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let significant = digits.trim_start_matches('0');
    if significant.len() > 10 {
        return None;
    }
    let magnitude: i64 = if significant.is_empty() {
        0
    } else {
        significant.parse().ok()?
    };
    i32::try_from(if negative { -magnitude } else { magnitude }).ok()
}

fn hash_to_decimal(text: &str) -> String {
    BigUint::from_bytes_be(&Sha256::digest(text.as_bytes())).to_str_radix(10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(pairs: &[(&str, &str)]) -> CredentialValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), CredentialValue::from_raw(*v)))
            .collect()
    }

    #[test]
    fn test_street_address_hashes_to_known_value() {
        assert_eq!(
            encode(&json!("101 Wilson Lane")).unwrap(),
            "68086943237164982734333428280784300550565381723532936263016368251445461241953"
        );
    }

    #[test]
    fn test_booleans() {
        assert_eq!(encode(&json!(true)).unwrap(), "1");
        assert_eq!(encode(&json!(false)).unwrap(), "0");
    }

    #[test]
    fn test_int32_bounds() {
        assert_eq!(encode(&json!(2147483647)).unwrap(), "2147483647");
        assert_eq!(encode(&json!(-2147483648)).unwrap(), "-2147483648");
        assert_eq!(encode(&json!("2147483647")).unwrap(), "2147483647");
    }

    #[test]
    fn test_outside_int32_hashes() {
        let encoded = encode(&json!(2147483648u64)).unwrap();
        assert_eq!(encoded, hash_to_decimal("2147483648"));
        assert_eq!(encode(&json!("2147483648")).unwrap(), encoded);
        assert_ne!(encode(&json!(-2147483649i64)).unwrap(), "-2147483649");
    }

    #[test]
    fn test_numeric_string_loses_leading_zeros() {
        assert_eq!(encode(&json!("007")).unwrap(), "7");
        assert_eq!(encode(&json!("-0")).unwrap(), "0");
        assert_eq!(encode(&json!("0000000000000000000042")).unwrap(), "42");
    }

    #[test]
    fn test_non_numeric_strings_hash() {
        for s in ["", "-", "1.5", "+5", " 12", "12a"] {
            assert_eq!(encode(&json!(s)).unwrap(), hash_to_decimal(s), "{s:?}");
        }
    }

    #[test]
    fn test_integral_float_is_integer() {
        assert_eq!(encode(&json!(5.0)).unwrap(), "5");
        assert_eq!(encode(&json!(1.5)).unwrap(), hash_to_decimal("1.5"));
    }

    #[test]
    fn test_null_and_absent_encode_alike() {
        let null = encode(&Value::Null).unwrap();
        assert_eq!(null, encode_optional(None).unwrap());
        assert_eq!(null, encode_str("None"));
    }

    #[test]
    fn test_object_and_array_rejected() {
        assert_eq!(
            encode(&json!({"a": 1})).unwrap_err(),
            ValidationError::UnsupportedValueType("object")
        );
        assert!(encode(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_matches() {
        assert!(matches(&json!("Alice"), &encode_str("Alice")));
        assert!(matches(&json!(28), "28"));
        assert!(!matches(&json!(28), "29"));
        assert!(!matches(&json!({}), "0"));
    }

    #[test]
    fn test_batch_encode_rejects_duplicates() {
        let attrs = vec![
            CredentialPreviewAttribute::new("name", "Alice"),
            CredentialPreviewAttribute::new("name", "Bob"),
        ];
        assert_eq!(
            batch_encode(&attrs).unwrap_err(),
            ValidationError::DuplicateAttribute("name".into())
        );
    }

    #[test]
    fn test_batch_encode() {
        let attrs = vec![
            CredentialPreviewAttribute::new("age", "28"),
            CredentialPreviewAttribute::new("name", "Alice"),
        ];
        let encoded = batch_encode(&attrs).unwrap();
        assert_eq!(encoded["age"].encoded, "28");
        assert_eq!(encoded["name"].raw, "Alice");
    }

    #[test]
    fn test_assert_values_match_counts() {
        let err = assert_values_match(&values(&[("a", "1")]), &values(&[("a", "1"), ("b", "2")]))
            .unwrap_err();
        assert_eq!(err, ValidationError::ValueCountMismatch { first: 1, second: 2 });
        let err = assert_values_match(&values(&[("a", "1"), ("b", "2")]), &values(&[("a", "1")]))
            .unwrap_err();
        assert_eq!(err, ValidationError::ValueCountMismatch { first: 2, second: 1 });
    }

    #[test]
    fn test_assert_values_match_missing_key() {
        let err = assert_values_match(&values(&[("a", "1")]), &values(&[("b", "1")])).unwrap_err();
        assert_eq!(err, ValidationError::MissingValue("a".into()));
    }

    #[test]
    fn test_assert_values_match_encoded_then_raw() {
        let mut tampered = values(&[("a", "1")]);
        tampered.get_mut("a").unwrap().encoded = "2".into();
        assert_eq!(
            assert_values_match(&values(&[("a", "1")]), &tampered).unwrap_err(),
            ValidationError::EncodedValueMismatch("a".into())
        );

        // "01" and "1" share an encoding but not a raw value.
        assert_eq!(
            assert_values_match(&values(&[("a", "01")]), &values(&[("a", "1")])).unwrap_err(),
            ValidationError::RawValueMismatch("a".into())
        );
        assert!(!check_values_match(&values(&[("a", "01")]), &values(&[("a", "1")])));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn encode_is_deterministic(s in ".{0,64}") {
                prop_assert_eq!(encode_str(&s), encode_str(&s));
            }

            #[test]
            fn int32_encodes_as_itself(n in any::<i32>()) {
                prop_assert_eq!(encode(&json!(n)).unwrap(), n.to_string());
                prop_assert_eq!(encode_str(&n.to_string()), n.to_string());
            }

            #[test]
            fn outside_int32_hashes(n in prop_oneof![
                (i64::from(i32::MAX) + 1)..i64::MAX,
                i64::MIN..i64::from(i32::MIN),
            ]) {
                prop_assert_eq!(encode(&json!(n)).unwrap(), hash_to_decimal(&n.to_string()));
            }

            #[test]
            fn values_match_themselves(
                pairs in prop::collection::btree_map("[a-z]{1,8}", ".{0,16}", 0..8),
            ) {
                let v: CredentialValues = pairs
                    .into_iter()
                    .map(|(k, raw)| (k, CredentialValue::from_raw(raw)))
                    .collect();
                prop_assert!(assert_values_match(&v, &v).is_ok());
            }
        }
    }
}
