//! # Attachments
//!
//! Protocol messages carry format payloads as base64 JSON attachments. A
//! message lists one [`FormatSpec`] per attachment naming its media type;
//! each coordinator picks out the attachment whose media type it supports.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::FormatError;
use crate::format::CredentialFormat;

/// Media type of every attachment payload.
pub const JSON_MIME_TYPE: &str = "application/json";

/// Attachment body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentData {
    /// Base64 (standard alphabet) of the JSON payload.
    pub base64: String,
}

/// A message attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment id, referenced by the message's format list.
    #[serde(rename = "@id")]
    pub id: String,
    /// Payload MIME type.
    #[serde(rename = "mime-type", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Payload.
    pub data: AttachmentData,
}

impl Attachment {
    /// Encode `payload` as a JSON attachment.
    pub fn from_json(id: impl Into<String>, payload: &impl Serialize) -> Result<Self, FormatError> {
        let bytes =
            serde_json::to_vec(payload).map_err(|e| FormatError::Payload(e.to_string()))?;
        Ok(Self {
            id: id.into(),
            mime_type: Some(JSON_MIME_TYPE.to_string()),
            data: AttachmentData {
                base64: STANDARD.encode(bytes),
            },
        })
    }

    /// Decode the payload as untyped JSON.
    pub fn json_value(&self) -> Result<Value, FormatError> {
        self.json()
    }

    /// Decode the payload.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FormatError> {
        let bytes = STANDARD
            .decode(&self.data.base64)
            .map_err(|e| FormatError::Payload(format!("attachment {}: {e}", self.id)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| FormatError::Payload(format!("attachment {}: {e}", self.id)))
    }
}

/// Media type of one attachment in a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSpec {
    /// Id of the attachment described.
    pub attach_id: String,
    /// Media type, e.g. `anoncreds/credential-offer@v1.0`.
    pub format: String,
}

/// The attachment and format entry a coordinator step produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOutput {
    /// Format entry for the outgoing message.
    pub format: FormatSpec,
    /// Attachment for the outgoing message.
    pub attachment: Attachment,
}

impl FormatOutput {
    pub(crate) fn new(
        attach_id: Option<String>,
        media_type: &str,
        payload: &impl Serialize,
    ) -> Result<Self, FormatError> {
        let attach_id = attach_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        Ok(Self {
            format: FormatSpec {
                attach_id: attach_id.clone(),
                format: media_type.to_string(),
            },
            attachment: Attachment::from_json(attach_id, payload)?,
        })
    }
}

/// The attachment whose format entry `format` supports.
pub fn select_attachment<'a>(
    format: CredentialFormat,
    formats: &[FormatSpec],
    attachments: &'a [Attachment],
) -> Option<&'a Attachment> {
    formats
        .iter()
        .filter(|spec| format.supports_format(&spec.format))
        .find_map(|spec| attachments.iter().find(|a| a.id == spec.attach_id))
}
