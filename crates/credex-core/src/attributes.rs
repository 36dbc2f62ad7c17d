//! Credential preview attributes and their check against a schema.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A `{name, value}` pair announced in an offer or proposal preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPreviewAttribute {
    /// Attribute name, as listed in the schema.
    pub name: String,
    /// Optional MIME type of the value.
    #[serde(rename = "mime-type", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Raw value text.
    pub value: String,
}

impl CredentialPreviewAttribute {
    /// Plain-text attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            value: value.into(),
        }
    }
}

/// Assert the preview names exactly the schema's attributes.
pub fn assert_attributes_match_schema(
    schema_attr_names: &[String],
    attributes: &[CredentialPreviewAttribute],
) -> Result<(), ValidationError> {
    let schema: BTreeSet<&str> = schema_attr_names.iter().map(String::as_str).collect();
    let preview: BTreeSet<&str> = attributes.iter().map(|a| a.name.as_str()).collect();
    if schema == preview {
        return Ok(());
    }
    Err(ValidationError::SchemaAttributeMismatch {
        missing: schema.difference(&preview).map(|s| s.to_string()).collect(),
        unexpected: preview.difference(&schema).map(|s| s.to_string()).collect(),
    })
}
