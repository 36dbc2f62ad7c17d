//! Attachment payload encoding per format.
//!
//! Legacy and AnonCreds attachments carry the AnonCreds objects as plain
//! JSON; DataIntegrity wraps them in the envelopes of
//! [`crate::data_integrity`]. Everything past this module works on the
//! AnonCreds objects only.

use chrono::Utc;
use credex_core::CredentialPreviewAttribute;
use credex_zkp::{AnonCredsCredential, AnonCredsCredentialOffer, AnonCredsCredentialRequest};

use crate::attachment::{Attachment, FormatOutput};
use crate::data_integrity::{
    from_w3c_credential, to_w3c_credential, DataIntegrityCredential,
    DataIntegrityCredentialOffer, DataIntegrityCredentialRequest,
};
use crate::error::FormatError;
use crate::format::{CredentialFilter, CredentialFormat, ProtocolStep};
use crate::problem::ProblemReport;

/// An offer decoded from its attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedOffer {
    /// The AnonCreds offer.
    pub offer: AnonCredsCredentialOffer,
    /// Attributes carried in the payload itself (DataIntegrity only).
    pub attributes: Option<Vec<CredentialPreviewAttribute>>,
    /// First W3C data model version offered (DataIntegrity only).
    pub data_model_version: Option<String>,
}

fn media_type(format: CredentialFormat, step: ProtocolStep) -> Result<&'static str, FormatError> {
    format
        .media_type(step)
        .ok_or_else(|| FormatError::NotSupported(format!("{format} defines no {step:?} document")))
}

impl CredentialFormat {
    /// Encode a proposal filter.
    pub fn encode_proposal(&self, filter: &CredentialFilter) -> Result<FormatOutput, FormatError> {
        let media_type = media_type(*self, ProtocolStep::Proposal)?;
        let document = filter
            .to_document(*self)
            .map_err(|e| FormatError::Payload(e.to_string()))?;
        FormatOutput::new(None, media_type, &document)
    }

    /// Decode a proposal filter.
    pub fn decode_proposal(
        &self,
        attachment: &Attachment,
    ) -> Result<CredentialFilter, FormatError> {
        media_type(*self, ProtocolStep::Proposal)?;
        CredentialFilter::from_document(*self, attachment.json_value()?)
            .map_err(|e| FormatError::Payload(e.to_string()))
    }

    /// Encode an offer.
    pub fn encode_offer(
        &self,
        attach_id: Option<String>,
        offer: &AnonCredsCredentialOffer,
        issuer_id: &str,
        attributes: &[CredentialPreviewAttribute],
    ) -> Result<FormatOutput, FormatError> {
        let media_type = media_type(*self, ProtocolStep::Offer)?;
        match self {
            Self::DataIntegrity => FormatOutput::new(
                attach_id,
                media_type,
                &DataIntegrityCredentialOffer::new(offer, issuer_id, attributes),
            ),
            Self::Legacy | Self::AnonCreds => FormatOutput::new(attach_id, media_type, offer),
        }
    }

    /// Decode an offer. Any defect is the offering party's fault.
    pub fn decode_offer(&self, attachment: &Attachment) -> Result<DecodedOffer, FormatError> {
        let invalid = |e: FormatError| {
            FormatError::from(ProblemReport::issuance_abandoned(format!(
                "Invalid credential offer: {e}"
            )))
        };
        match self {
            Self::DataIntegrity => {
                let envelope: DataIntegrityCredentialOffer = attachment.json().map_err(invalid)?;
                envelope.validate()?;
                Ok(DecodedOffer {
                    offer: envelope.anoncreds_offer()?,
                    attributes: Some(envelope.attributes()),
                    data_model_version: envelope.data_model_versions_supported.first().cloned(),
                })
            }
            Self::Legacy | Self::AnonCreds => Ok(DecodedOffer {
                offer: attachment.json().map_err(invalid)?,
                attributes: None,
                data_model_version: None,
            }),
        }
    }

    /// Encode a request answering `offer`.
    pub fn encode_request(
        &self,
        request: AnonCredsCredentialRequest,
        offer: &DecodedOffer,
    ) -> Result<FormatOutput, FormatError> {
        let media_type = media_type(*self, ProtocolStep::Request)?;
        match self {
            Self::DataIntegrity => {
                let version = offer.data_model_version.as_deref().unwrap_or("1.1");
                FormatOutput::new(
                    None,
                    media_type,
                    &DataIntegrityCredentialRequest::new(request, version),
                )
            }
            Self::Legacy | Self::AnonCreds => FormatOutput::new(None, media_type, &request),
        }
    }

    /// Decode a request.
    pub fn decode_request(
        &self,
        attachment: &Attachment,
    ) -> Result<AnonCredsCredentialRequest, FormatError> {
        match self {
            Self::DataIntegrity => {
                let envelope: DataIntegrityCredentialRequest = attachment.json()?;
                Ok(envelope.anoncreds_request()?)
            }
            Self::Legacy | Self::AnonCreds => attachment.json(),
        }
    }

    /// Encode an issued credential.
    pub fn encode_credential(
        &self,
        credential: &AnonCredsCredential,
        issuer_id: &str,
    ) -> Result<FormatOutput, FormatError> {
        let media_type = media_type(*self, ProtocolStep::Credential)?;
        match self {
            Self::DataIntegrity => FormatOutput::new(
                None,
                media_type,
                &DataIntegrityCredential {
                    credential: to_w3c_credential(credential, issuer_id, Utc::now())?,
                },
            ),
            Self::Legacy | Self::AnonCreds => FormatOutput::new(None, media_type, credential),
        }
    }

    /// Decode an issued credential.
    pub fn decode_credential(
        &self,
        attachment: &Attachment,
    ) -> Result<AnonCredsCredential, FormatError> {
        match self {
            Self::DataIntegrity => {
                let envelope: DataIntegrityCredential = attachment.json()?;
                from_w3c_credential(&envelope.credential)
            }
            Self::Legacy | Self::AnonCreds => attachment.json(),
        }
    }
}
