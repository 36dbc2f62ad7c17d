//! # Error Types: Validation Taxonomy
//!
//! Errors raised by the leaf components of the exchange engine. All errors
//! use `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Identifier errors carry the offending input and the grammar it failed.
//! - Attribute mismatch errors name the offending attribute key.
//! - Nothing here is retried; every error surfaces at the point of violation.

use thiserror::Error;

/// Top-level error type for `credex-core`.
#[derive(Error, Debug)]
pub enum CredexError {
    /// Input failed a structural or semantic validation rule.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Canonical serialization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Validation failures for identifiers, attribute values and previews.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifier matches neither the legacy nor the did:indy grammar.
    #[error("invalid {kind} identifier: \"{value}\"")]
    InvalidIdentifier {
        /// Which identifier kind was expected.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// did:indy namespace does not match `[a-z][_a-z0-9-]*(:[a-z][_a-z0-9-]*)?`.
    #[error("invalid did:indy namespace: \"{0}\"")]
    InvalidNamespace(String),

    /// Raw attribute value has a type the codec cannot encode.
    #[error("unsupported raw value type for attribute encoding: {0}")]
    UnsupportedValueType(&'static str),

    /// Two credential value maps have different sizes.
    #[error("number of values in first entry ({first}) does not match number of values in second entry ({second})")]
    ValueCountMismatch {
        /// Key count of the first map.
        first: usize,
        /// Key count of the second map.
        second: usize,
    },

    /// A key present in the first map is absent from the second.
    #[error("second credential values object has no value for key '{0}'")]
    MissingValue(String),

    /// The encoded form differs for a shared key.
    #[error("encoded credential values for key '{0}' do not match")]
    EncodedValueMismatch(String),

    /// The raw form differs for a shared key.
    #[error("raw credential values for key '{0}' do not match")]
    RawValueMismatch(String),

    /// The same preview attribute name occurs twice.
    #[error("duplicate credential attribute '{0}'")]
    DuplicateAttribute(String),

    /// Preview attributes differ from the schema's attribute names.
    #[error("credential preview attributes do not match the schema attributes (missing: {missing:?}, unexpected: {unexpected:?})")]
    SchemaAttributeMismatch {
        /// Schema attributes absent from the preview.
        missing: Vec<String>,
        /// Preview attributes absent from the schema.
        unexpected: Vec<String>,
    },
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
