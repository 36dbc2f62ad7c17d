//! Wire-level problem reports.
//!
//! Faults caused by a remote party's malformed message are returned as a
//! [`ProblemReport`] so they can be sent back on the wire instead of being
//! swallowed as local errors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reason code of a credential problem report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemReportReason {
    /// The issuance cannot continue.
    #[serde(rename = "issuance-abandoned")]
    IssuanceAbandoned,
}

impl ProblemReportReason {
    /// Wire code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IssuanceAbandoned => "issuance-abandoned",
        }
    }
}

impl fmt::Display for ProblemReportReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable text plus reason code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDescription {
    /// English description.
    pub en: String,
    /// Reason code.
    pub code: ProblemReportReason,
}

/// A problem report ready to be sent to the other party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemReport {
    /// What went wrong.
    pub description: ProblemDescription,
}

impl ProblemReport {
    /// An `issuance-abandoned` report.
    pub fn issuance_abandoned(message: impl Into<String>) -> Self {
        Self {
            description: ProblemDescription {
                en: message.into(),
                code: ProblemReportReason::IssuanceAbandoned,
            },
        }
    }

    /// Reason code.
    pub fn reason(&self) -> ProblemReportReason {
        self.description.code
    }

    /// English description.
    pub fn message(&self) -> &str {
        &self.description.en
    }
}

impl fmt::Display for ProblemReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.description.code, self.description.en)
    }
}

impl std::error::Error for ProblemReport {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let report = ProblemReport::issuance_abandoned("Invalid credential offer");
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"description": {"en": "Invalid credential offer", "code": "issuance-abandoned"}})
        );
        assert_eq!(report.to_string(), "issuance-abandoned: Invalid credential offer");
    }

    #[test]
    fn test_parse_incoming() {
        let report: ProblemReport = serde_json::from_value(
            json!({"description": {"en": "declined", "code": "issuance-abandoned"}}),
        )
        .unwrap();
        assert_eq!(report.reason(), ProblemReportReason::IssuanceAbandoned);
        assert_eq!(report.message(), "declined");
    }
}
