//! # Credential Exchange State Machine
//!
//! Lifecycle of one issue-credential exchange, shared by the issuer and the
//! holder side of the protocol.
//!
//! ## States
//!
//! ```text
//! Proposed ──▶ Offered ──▶ Requested ──▶ Issued ──▶ Stored ──▶ Done
//!     │           │            │            │          │
//!     │           │            │            └──────────┴──▶ Done (issuer: ack received)
//!     └───────────┴────────────┴────────────┴──────────┴──▶ Abandoned (terminal)
//! ```
//!
//! An exchange may only begin at `Proposed` (holder proposes) or `Offered`
//! (issuer offers first). Starting from a request is rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Exchange State ──────────────────────────────────────────────────

/// The lifecycle state of a credential exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialExchangeState {
    /// A credential proposal was sent or received.
    Proposed,
    /// A credential offer was sent or received.
    Offered,
    /// A credential request was sent or received.
    Requested,
    /// The credential was issued (issuer) or received (holder).
    Issued,
    /// The holder verified and stored the credential.
    Stored,
    /// The exchange completed (terminal).
    Done,
    /// The exchange was abandoned after a problem report (terminal).
    Abandoned,
}

impl CredentialExchangeState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Abandoned)
    }

    /// Whether an exchange may begin in this state.
    pub fn is_entry_point(&self) -> bool {
        matches!(self, Self::Proposed | Self::Offered)
    }
}

impl std::fmt::Display for CredentialExchangeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Proposed => "PROPOSED",
            Self::Offered => "OFFERED",
            Self::Requested => "REQUESTED",
            Self::Issued => "ISSUED",
            Self::Stored => "STORED",
            Self::Done => "DONE",
            Self::Abandoned => "ABANDONED",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from exchange lifecycle transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeStateError {
    /// Attempted transition is not valid from the current state.
    #[error("invalid credential exchange transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: CredentialExchangeState,
        /// Attempted target state.
        to: CredentialExchangeState,
    },

    /// The exchange is in a terminal state.
    #[error("credential exchange is in terminal state {0}")]
    TerminalState(CredentialExchangeState),

    /// An exchange cannot start in this state.
    #[error("credential exchange cannot start at {0}; only PROPOSED or OFFERED are entry points")]
    InvalidEntryPoint(CredentialExchangeState),
}

// ─── Transition Log ──────────────────────────────────────────────────

/// Record of an exchange state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeTransitionRecord {
    /// State before the transition.
    pub from_state: CredentialExchangeState,
    /// State after the transition.
    pub to_state: CredentialExchangeState,
    /// When the transition occurred.
    pub timestamp: DateTime<Utc>,
    /// Why the transition happened.
    pub reason: String,
}

// ─── Exchange ────────────────────────────────────────────────────────

/// Current state of an exchange plus its ordered transition history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialExchange {
    state: CredentialExchangeState,
    transitions: Vec<ExchangeTransitionRecord>,
}

impl CredentialExchange {
    /// Begin an exchange at `entry`.
    pub fn begin(entry: CredentialExchangeState) -> Result<Self, ExchangeStateError> {
        if !entry.is_entry_point() {
            return Err(ExchangeStateError::InvalidEntryPoint(entry));
        }
        Ok(Self {
            state: entry,
            transitions: Vec::new(),
        })
    }

    /// Current state.
    pub fn state(&self) -> CredentialExchangeState {
        self.state
    }

    /// Ordered transition history.
    pub fn transitions(&self) -> &[ExchangeTransitionRecord] {
        &self.transitions
    }

    /// PROPOSED → OFFERED.
    pub fn offer(&mut self, reason: &str) -> Result<(), ExchangeStateError> {
        self.advance(
            &[CredentialExchangeState::Proposed],
            CredentialExchangeState::Offered,
            reason,
        )
    }

    /// OFFERED → REQUESTED.
    pub fn request(&mut self, reason: &str) -> Result<(), ExchangeStateError> {
        self.advance(
            &[CredentialExchangeState::Offered],
            CredentialExchangeState::Requested,
            reason,
        )
    }

    /// REQUESTED → ISSUED.
    pub fn issue(&mut self, reason: &str) -> Result<(), ExchangeStateError> {
        self.advance(
            &[CredentialExchangeState::Requested],
            CredentialExchangeState::Issued,
            reason,
        )
    }

    /// ISSUED → STORED.
    pub fn store(&mut self, reason: &str) -> Result<(), ExchangeStateError> {
        self.advance(
            &[CredentialExchangeState::Issued],
            CredentialExchangeState::Stored,
            reason,
        )
    }

    /// ISSUED or STORED → DONE.
    pub fn complete(&mut self, reason: &str) -> Result<(), ExchangeStateError> {
        self.advance(
            &[CredentialExchangeState::Issued, CredentialExchangeState::Stored],
            CredentialExchangeState::Done,
            reason,
        )
    }

    /// Any non-terminal state → ABANDONED.
    pub fn abandon(&mut self, reason: &str) -> Result<(), ExchangeStateError> {
        if self.state.is_terminal() {
            return Err(ExchangeStateError::TerminalState(self.state));
        }
        self.do_transition(CredentialExchangeState::Abandoned, reason);
        Ok(())
    }

    /// Whether the exchange is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    fn advance(
        &mut self,
        allowed_from: &[CredentialExchangeState],
        to: CredentialExchangeState,
        reason: &str,
    ) -> Result<(), ExchangeStateError> {
        if self.state.is_terminal() {
            return Err(ExchangeStateError::TerminalState(self.state));
        }
        if !allowed_from.contains(&self.state) {
            return Err(ExchangeStateError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.do_transition(to, reason);
        Ok(())
    }

    fn do_transition(&mut self, to: CredentialExchangeState, reason: &str) {
        self.transitions.push(ExchangeTransitionRecord {
            from_state: self.state,
            to_state: to,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.state = to;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use CredentialExchangeState::*;

    fn offered() -> CredentialExchange {
        CredentialExchange::begin(Offered).unwrap()
    }

    #[test]
    fn test_holder_lifecycle() {
        let mut ex = CredentialExchange::begin(Proposed).unwrap();
        ex.offer("offer received").unwrap();
        ex.request("request sent").unwrap();
        ex.issue("credential received").unwrap();
        ex.store("credential stored").unwrap();
        ex.complete("ack sent").unwrap();
        assert_eq!(ex.state(), Done);
        assert!(ex.is_terminal());
        assert_eq!(ex.transitions().len(), 5);
        assert_eq!(ex.transitions()[0].from_state, Proposed);
        assert_eq!(ex.transitions()[4].to_state, Done);
    }

    #[test]
    fn test_issuer_completes_from_issued() {
        let mut ex = offered();
        ex.request("request received").unwrap();
        ex.issue("credential sent").unwrap();
        ex.complete("ack received").unwrap();
        assert_eq!(ex.state(), Done);
    }

    #[test]
    fn test_cannot_begin_at_request() {
        for state in [Requested, Issued, Stored, Done, Abandoned] {
            assert_eq!(
                CredentialExchange::begin(state).unwrap_err(),
                ExchangeStateError::InvalidEntryPoint(state)
            );
        }
    }

    #[test]
    fn test_skipping_a_step_is_rejected() {
        let mut ex = offered();
        assert_eq!(
            ex.issue("too early").unwrap_err(),
            ExchangeStateError::InvalidTransition {
                from: Offered,
                to: Issued
            }
        );
        assert_eq!(ex.state(), Offered);
        assert!(ex.transitions().is_empty());
    }

    #[test]
    fn test_no_going_back() {
        let mut ex = offered();
        ex.request("sent").unwrap();
        assert!(ex.offer("again").is_err());
    }

    #[test]
    fn test_abandon_from_any_non_terminal() {
        for setup in [
            vec![],
            vec!["request"],
            vec!["request", "issue"],
            vec!["request", "issue", "store"],
        ] {
            let mut ex = offered();
            for step in setup {
                match step {
                    "request" => ex.request(step).unwrap(),
                    "issue" => ex.issue(step).unwrap(),
                    _ => ex.store(step).unwrap(),
                }
            }
            ex.abandon("problem report").unwrap();
            assert_eq!(ex.state(), Abandoned);
        }
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let mut ex = offered();
        ex.abandon("gone").unwrap();
        assert_eq!(
            ex.abandon("again").unwrap_err(),
            ExchangeStateError::TerminalState(Abandoned)
        );
        assert_eq!(
            ex.request("late").unwrap_err(),
            ExchangeStateError::TerminalState(Abandoned)
        );
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Proposed.to_string(), "PROPOSED");
        assert_eq!(Abandoned.to_string(), "ABANDONED");
    }

    #[test]
    fn test_serde_round_trip() {
        let mut ex = offered();
        ex.request("sent").unwrap();
        let json = serde_json::to_string(&ex).unwrap();
        let back: CredentialExchange = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ex);
    }
}
