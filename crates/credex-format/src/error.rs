//! # Error Types
//!
//! [`FormatError`] is the umbrella every coordinator operation returns.
//! Remote-party faults travel as [`FormatError::ProblemReport`]; everything
//! else is a local error carrying the offending id, key or state.

use credex_core::{CanonicalizationError, ValidationError};
use credex_query::QueryError;
use credex_state::{ExchangeStateError, RevocationStateError};
use credex_zkp::ZkpError;
use thiserror::Error;
use uuid::Uuid;

use crate::problem::ProblemReport;

/// Errors raised by an [`crate::collaborators::AnonCredsResolver`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// The object does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Object kind.
        kind: &'static str,
        /// Requested id.
        id: String,
    },

    /// The namespace of a legacy identifier could not be determined.
    #[error("no did:indy namespace known for {0}")]
    NamespaceUnknown(String),

    /// The backing registry failed.
    #[error("registry unavailable: {0}")]
    Unavailable(String),

    /// The identifier is malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors raised by record and credential stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record with this id.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A record with this id already exists.
    #[error("record already exists: {0}")]
    Duplicate(String),

    /// The backing storage failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors raised by the credential format coordinator.
#[derive(Error, Debug)]
pub enum FormatError {
    /// A fault of the remote party, to be sent back as a problem report.
    #[error("problem report: {0}")]
    ProblemReport(ProblemReport),

    /// The operation is structurally disallowed for this format.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// A required attachment, metadata entry or attribute is absent.
    #[error("missing data: {0}")]
    MissingData(String),

    /// No exchange record with this id.
    #[error("credential exchange record not found: {0}")]
    RecordNotFound(Uuid),

    /// An attachment payload is not valid base64 JSON.
    #[error("malformed attachment payload: {0}")]
    Payload(String),

    /// Identifier or value validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Revocation registry state forbids the operation.
    #[error(transparent)]
    RevocationState(#[from] RevocationStateError),

    /// The exchange is in the wrong state for the operation.
    #[error(transparent)]
    ExchangeState(#[from] ExchangeStateError),

    /// A presentation request could not be compiled.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The signature library failed.
    #[error("signature library: {0}")]
    Zkp(#[from] ZkpError),

    /// Ledger object resolution failed.
    #[error("resolver: {0}")]
    Resolver(#[from] ResolverError),

    /// A store rejected the operation.
    #[error("store: {0}")]
    Store(#[from] StoreError),

    /// A payload could not be canonicalized.
    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),
}

impl From<ProblemReport> for FormatError {
    fn from(report: ProblemReport) -> Self {
        Self::ProblemReport(report)
    }
}

impl FormatError {
    /// The problem report carried by this error, if it is a remote fault.
    pub fn problem_report(&self) -> Option<&ProblemReport> {
        match self {
            Self::ProblemReport(report) => Some(report),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ProblemReportReason;

    #[test]
    fn test_problem_report_accessor() {
        let err = FormatError::from(ProblemReport::issuance_abandoned("bad offer"));
        assert_eq!(
            err.problem_report().map(ProblemReport::reason),
            Some(ProblemReportReason::IssuanceAbandoned)
        );
        assert!(FormatError::MissingData("x".into()).problem_report().is_none());
    }

    #[test]
    fn test_messages_carry_context() {
        let err = FormatError::from(ResolverError::NotFound {
            kind: "schema",
            id: "S".into(),
        });
        assert_eq!(err.to_string(), "resolver: schema not found: S");
        let err = FormatError::NotSupported("request first".into());
        assert!(err.to_string().contains("request first"));
    }
}
