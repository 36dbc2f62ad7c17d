//! # Auto-Respond Predicates
//!
//! Whether an exchange step can be answered without asking the user. Each
//! predicate compares the credential definition across the attachments
//! involved; the credential step also requires every attribute value to
//! match what was offered. Anything that cannot be positively confirmed,
//! including an undecodable attachment, yields `false`.

use std::fmt;
use std::str::FromStr;

use credex_core::{batch_encode, check_values_match, CredentialPreviewAttribute};
use tracing::debug;

use crate::attachment::Attachment;
use crate::config::ConfigError;
use crate::format::CredentialFormat;

fn offer_cred_def_id(format: CredentialFormat, offer: &Attachment) -> Option<String> {
    format.decode_offer(offer).ok().map(|d| d.offer.cred_def_id)
}

fn proposal_cred_def_id(format: CredentialFormat, proposal: &Attachment) -> Option<String> {
    format.decode_proposal(proposal).ok()?.cred_def_id
}

fn same(left: Option<String>, right: Option<String>) -> bool {
    matches!((left, right), (Some(l), Some(r)) if l == r)
}

/// Issuer: answer a proposal with `offer`.
pub fn should_auto_respond_to_proposal(
    format: CredentialFormat,
    proposal: &Attachment,
    offer: &Attachment,
) -> bool {
    same(
        proposal_cred_def_id(format, proposal),
        offer_cred_def_id(format, offer),
    )
}

/// Holder: answer an offer that follows our `proposal`.
pub fn should_auto_respond_to_offer(
    format: CredentialFormat,
    offer: &Attachment,
    proposal: &Attachment,
) -> bool {
    same(
        proposal_cred_def_id(format, proposal),
        offer_cred_def_id(format, offer),
    )
}

/// Issuer: answer a request for our `offer`.
pub fn should_auto_respond_to_request(
    format: CredentialFormat,
    offer: &Attachment,
    request: &Attachment,
) -> bool {
    let request_cred_def_id = format.decode_request(request).ok().map(|r| r.cred_def_id);
    same(offer_cred_def_id(format, offer), request_cred_def_id)
}

/// Holder: accept a credential answering our `request` whose values equal
/// the offered `attributes`.
pub fn should_auto_respond_to_credential(
    format: CredentialFormat,
    request: &Attachment,
    credential: &Attachment,
    attributes: Option<&[CredentialPreviewAttribute]>,
) -> bool {
    let Ok(credential) = format.decode_credential(credential) else {
        return false;
    };
    let request_cred_def_id = format.decode_request(request).ok().map(|r| r.cred_def_id);
    if !same(Some(credential.cred_def_id.clone()), request_cred_def_id) {
        return false;
    }
    let Some(attributes) = attributes else {
        debug!("no offered attributes recorded, cannot compare credential values");
        return false;
    };
    match batch_encode(attributes) {
        Ok(expected) => check_values_match(&expected, &credential.values),
        Err(_) => false,
    }
}

// ─── Policy ──────────────────────────────────────────────────────────

/// When a coordinator's caller may answer a step automatically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AutoAcceptCredential {
    /// Answer every step.
    Always,
    /// Answer steps the predicates approve.
    ContentApproved,
    /// Never answer automatically.
    #[default]
    Never,
}

impl AutoAcceptCredential {
    /// Combine the policy with a predicate outcome.
    pub fn should_accept(self, content_approved: bool) -> bool {
        match self {
            Self::Always => true,
            Self::ContentApproved => content_approved,
            Self::Never => false,
        }
    }

    /// Configuration spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::ContentApproved => "content-approved",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for AutoAcceptCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutoAcceptCredential {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "content-approved" | "contentapproved" => Ok(Self::ContentApproved),
            "never" => Ok(Self::Never),
            other => Err(ConfigError::InvalidValue {
                var: "auto accept policy".into(),
                value: other.to_string(),
                reason: "expected always, content-approved or never".into(),
            }),
        }
    }
}
