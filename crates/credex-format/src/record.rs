//! # Credential Exchange Record
//!
//! The persisted state of one exchange: who we are in it, which format it
//! runs, where its state machine stands, and what the coordinator learned
//! along the way. Metadata and tags have crate-private setters; callers
//! outside the coordinator can read them but never write them.

use chrono::{DateTime, Utc};
use credex_core::CredentialPreviewAttribute;
use credex_query::{TagValue, Tags};
use credex_state::{CredentialExchange, CredentialExchangeState, ExchangeStateError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::format::{CredentialFormat, CredentialRecordType};
use crate::metadata::ExchangeMetadata;

/// Tag holding the exchange state.
pub const STATE_TAG: &str = "state";
/// Tag holding the exchange role.
pub const ROLE_TAG: &str = "role";
/// Tag holding the revocation registry id of the issued credential.
pub const REVOCATION_REGISTRY_ID_TAG: &str = "anonCredsRevocationRegistryId";
/// Tag holding the revocation index of the issued credential.
pub const CREDENTIAL_REVOCATION_ID_TAG: &str = "anonCredsCredentialRevocationId";

/// Our side of the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeRole {
    /// We issue the credential.
    Issuer,
    /// We receive the credential.
    Holder,
}

impl ExchangeRole {
    /// Tag value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Issuer => "issuer",
            Self::Holder => "holder",
        }
    }
}

/// Reference to a credential stored at the end of an exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecordBinding {
    /// Store the credential lives in.
    pub record_type: CredentialRecordType,
    /// Id of the stored credential.
    pub credential_id: String,
}

/// One credential exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialExchangeRecord {
    /// Record id.
    pub id: Uuid,
    /// Our side.
    pub role: ExchangeRole,
    /// Format in use.
    pub format: CredentialFormat,
    /// Lifecycle.
    pub exchange: CredentialExchange,
    /// Preview attributes as last offered or proposed.
    pub credential_attributes: Option<Vec<CredentialPreviewAttribute>>,
    metadata: ExchangeMetadata,
    tags: Tags,
    /// Why the exchange was abandoned.
    pub error_message: Option<String>,
    /// Credentials stored for this exchange.
    pub credentials: Vec<CredentialRecordBinding>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl CredentialExchangeRecord {
    /// A new record beginning at `entry`.
    pub fn new(
        role: ExchangeRole,
        format: CredentialFormat,
        entry: CredentialExchangeState,
    ) -> Result<Self, ExchangeStateError> {
        let now = Utc::now();
        let mut record = Self {
            id: Uuid::new_v4(),
            role,
            format,
            exchange: CredentialExchange::begin(entry)?,
            credential_attributes: None,
            metadata: ExchangeMetadata::default(),
            tags: Tags::new(),
            error_message: None,
            credentials: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        record
            .tags
            .insert(ROLE_TAG.to_string(), TagValue::from(role.as_str()));
        record.refresh_default_tags();
        Ok(record)
    }

    /// Current exchange state.
    pub fn state(&self) -> CredentialExchangeState {
        self.exchange.state()
    }

    /// Metadata side-table.
    pub fn metadata(&self) -> &ExchangeMetadata {
        &self.metadata
    }

    /// Record tags.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// A tag's text value.
    pub fn tag(&self, name: &str) -> Option<&str> {
        match self.tags.get(name) {
            Some(TagValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut ExchangeMetadata {
        &mut self.metadata
    }

    pub(crate) fn set_tag(&mut self, name: &str, value: impl Into<TagValue>) {
        self.tags.insert(name.to_string(), value.into());
    }

    /// Stamp `updated_at` and resync derived tags.
    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.refresh_default_tags();
    }

    fn refresh_default_tags(&mut self) {
        let state = self.state().to_string();
        self.tags.insert(STATE_TAG.to_string(), TagValue::from(state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_tags() {
        let record = CredentialExchangeRecord::new(
            ExchangeRole::Holder,
            CredentialFormat::AnonCreds,
            CredentialExchangeState::Offered,
        )
        .unwrap();
        assert_eq!(record.tag(ROLE_TAG), Some("holder"));
        assert_eq!(
            record.tag(STATE_TAG),
            Some(CredentialExchangeState::Offered.to_string().as_str())
        );
        assert!(record.metadata().credential().is_none());
    }

    #[test]
    fn test_cannot_begin_at_request() {
        let err = CredentialExchangeRecord::new(
            ExchangeRole::Issuer,
            CredentialFormat::AnonCreds,
            CredentialExchangeState::Requested,
        )
        .unwrap_err();
        assert!(matches!(err, ExchangeStateError::InvalidEntryPoint(_)));
    }

    #[test]
    fn test_touch_refreshes_state_tag() {
        let mut record = CredentialExchangeRecord::new(
            ExchangeRole::Issuer,
            CredentialFormat::Legacy,
            CredentialExchangeState::Offered,
        )
        .unwrap();
        record.exchange.request("request received").unwrap();
        record.touch();
        assert_eq!(
            record.tag(STATE_TAG),
            Some(CredentialExchangeState::Requested.to_string().as_str())
        );
        assert!(record.updated_at >= record.created_at);
    }
}
