//! # Revocation Registry Lifecycle
//!
//! A revocation registry accepts new credentials only while it is `Active`.
//! The registry collaborator owns index allocation and drives the
//! transitions below; this module records them and gates issuance on them.
//!
//! ```text
//! Pending ──▶ Active ──▶ Full (terminal)
//! ```
//!
//! No state is re-enterable.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Registry State ──────────────────────────────────────────────────

/// Lifecycle state of a revocation registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevocationRegistryState {
    /// Created, not yet published or initialised.
    Pending,
    /// Published and accepting new credentials.
    Active,
    /// Every index is allocated (terminal).
    Full,
}

impl RevocationRegistryState {
    /// Whether new credentials may be issued against the registry.
    pub fn permits_issuance(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Full)
    }
}

impl std::fmt::Display for RevocationRegistryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Full => "FULL",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Revocation state violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RevocationStateError {
    /// The registry exists but does not accept issuance.
    #[error("revocation registry {registry_id} is {state}, expected ACTIVE")]
    NotActive {
        /// Registry identifier.
        registry_id: String,
        /// Current state.
        state: RevocationRegistryState,
    },

    /// No registry with this id is tracked.
    #[error("unknown revocation registry {0}")]
    UnknownRegistry(String),

    /// Exactly one of registry id and revocation index was supplied.
    #[error("revocation registry id and revocation index must be supplied together (registry id: {registry_id:?}, index: {index:?})")]
    IncompleteSlot {
        /// Registry id, if supplied.
        registry_id: Option<String>,
        /// Revocation index, if supplied.
        index: Option<u32>,
    },

    /// Attempted transition is not valid from the current state.
    #[error("invalid revocation registry transition for {registry_id}: {from} -> {to}")]
    InvalidTransition {
        /// Registry identifier.
        registry_id: String,
        /// Current state.
        from: RevocationRegistryState,
        /// Attempted target state.
        to: RevocationRegistryState,
    },
}

// ─── Revocation Slot ─────────────────────────────────────────────────

/// A registry id paired with the credential's index in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevocationSlot {
    /// Revocation registry definition id.
    pub registry_id: String,
    /// Index of the credential within the registry.
    pub index: u32,
}

impl RevocationSlot {
    /// Pair an optional registry id with an optional index.
    ///
    /// Both present yields a slot, both absent yields `None`, anything else
    /// is an error. Index `0` is a valid index.
    pub fn from_parts(
        registry_id: Option<String>,
        index: Option<u32>,
    ) -> Result<Option<Self>, RevocationStateError> {
        match (registry_id, index) {
            (Some(registry_id), Some(index)) => Ok(Some(Self { registry_id, index })),
            (None, None) => Ok(None),
            (registry_id, index) => {
                Err(RevocationStateError::IncompleteSlot { registry_id, index })
            }
        }
    }
}

// ─── Registry Record ─────────────────────────────────────────────────

/// Record of a registry state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryTransitionRecord {
    /// State before the transition.
    pub from_state: RevocationRegistryState,
    /// State after the transition.
    pub to_state: RevocationRegistryState,
    /// When the transition occurred.
    pub timestamp: DateTime<Utc>,
}

/// A revocation registry as seen by the issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationRegistryRecord {
    /// Revocation registry definition id.
    pub registry_id: String,
    /// Credential definition the registry belongs to.
    pub credential_definition_id: String,
    /// Number of credentials the registry can hold.
    pub max_credential_count: u32,
    state: RevocationRegistryState,
    transitions: Vec<RegistryTransitionRecord>,
}

impl RevocationRegistryRecord {
    /// A new registry in `Pending`.
    pub fn new(
        registry_id: impl Into<String>,
        credential_definition_id: impl Into<String>,
        max_credential_count: u32,
    ) -> Self {
        Self {
            registry_id: registry_id.into(),
            credential_definition_id: credential_definition_id.into(),
            max_credential_count,
            state: RevocationRegistryState::Pending,
            transitions: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> RevocationRegistryState {
        self.state
    }

    /// Ordered transition history.
    pub fn transitions(&self) -> &[RegistryTransitionRecord] {
        &self.transitions
    }

    /// PENDING → ACTIVE.
    pub fn activate(&mut self) -> Result<(), RevocationStateError> {
        self.advance(RevocationRegistryState::Pending, RevocationRegistryState::Active)
    }

    /// ACTIVE → FULL.
    pub fn mark_full(&mut self) -> Result<(), RevocationStateError> {
        self.advance(RevocationRegistryState::Active, RevocationRegistryState::Full)
    }

    /// Fail unless the registry is `Active`.
    pub fn assert_active(&self) -> Result<(), RevocationStateError> {
        if self.state.permits_issuance() {
            Ok(())
        } else {
            Err(RevocationStateError::NotActive {
                registry_id: self.registry_id.clone(),
                state: self.state,
            })
        }
    }

    fn advance(
        &mut self,
        from: RevocationRegistryState,
        to: RevocationRegistryState,
    ) -> Result<(), RevocationStateError> {
        if self.state != from {
            return Err(RevocationStateError::InvalidTransition {
                registry_id: self.registry_id.clone(),
                from: self.state,
                to,
            });
        }
        self.transitions.push(RegistryTransitionRecord {
            from_state: self.state,
            to_state: to,
            timestamp: Utc::now(),
        });
        self.state = to;
        Ok(())
    }
}

// ─── Tracker ─────────────────────────────────────────────────────────

/// Shared view of the issuer's revocation registries.
///
/// Cloning shares the underlying map. The lock is `parking_lot` and is never
/// held across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct RevocationRegistryTracker {
    registries: Arc<RwLock<HashMap<String, RevocationRegistryRecord>>>,
}

impl RevocationRegistryTracker {
    /// An empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a registry, replacing any previous record with the same id.
    pub fn register(&self, record: RevocationRegistryRecord) -> Option<RevocationRegistryRecord> {
        self.registries
            .write()
            .insert(record.registry_id.clone(), record)
    }

    /// Snapshot of a tracked registry.
    pub fn get(&self, registry_id: &str) -> Option<RevocationRegistryRecord> {
        self.registries.read().get(registry_id).cloned()
    }

    /// Current state of a tracked registry.
    pub fn state(&self, registry_id: &str) -> Option<RevocationRegistryState> {
        self.registries.read().get(registry_id).map(|r| r.state())
    }

    /// PENDING → ACTIVE for a tracked registry.
    pub fn activate(&self, registry_id: &str) -> Result<(), RevocationStateError> {
        self.with_registry(registry_id, RevocationRegistryRecord::activate)
    }

    /// ACTIVE → FULL for a tracked registry.
    pub fn mark_full(&self, registry_id: &str) -> Result<(), RevocationStateError> {
        self.with_registry(registry_id, RevocationRegistryRecord::mark_full)
    }

    /// Fail with the current state unless the registry is `Active`.
    pub fn assert_active(&self, registry_id: &str) -> Result<(), RevocationStateError> {
        self.registries
            .read()
            .get(registry_id)
            .ok_or_else(|| RevocationStateError::UnknownRegistry(registry_id.to_string()))?
            .assert_active()
    }

    fn with_registry(
        &self,
        registry_id: &str,
        f: impl FnOnce(&mut RevocationRegistryRecord) -> Result<(), RevocationStateError>,
    ) -> Result<(), RevocationStateError> {
        let mut guard = self.registries.write();
        let record = guard
            .get_mut(registry_id)
            .ok_or_else(|| RevocationStateError::UnknownRegistry(registry_id.to_string()))?;
        f(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REG: &str =
        "SDqTzbVuCowusqGBNbNDjH:4:SDqTzbVuCowusqGBNbNDjH:3:CL:12:default:CL_ACCUM:tag1";
    const CRED_DEF: &str = "SDqTzbVuCowusqGBNbNDjH:3:CL:12:default";

    fn tracker_with(state: RevocationRegistryState) -> RevocationRegistryTracker {
        let tracker = RevocationRegistryTracker::new();
        tracker.register(RevocationRegistryRecord::new(REG, CRED_DEF, 100));
        if state != RevocationRegistryState::Pending {
            tracker.activate(REG).unwrap();
        }
        if state == RevocationRegistryState::Full {
            tracker.mark_full(REG).unwrap();
        }
        tracker
    }

    #[test]
    fn test_lifecycle() {
        let mut record = RevocationRegistryRecord::new(REG, CRED_DEF, 10);
        assert_eq!(record.state(), RevocationRegistryState::Pending);
        record.activate().unwrap();
        record.mark_full().unwrap();
        assert!(record.state().is_terminal());
        assert_eq!(record.transitions().len(), 2);
    }

    #[test]
    fn test_states_are_not_reenterable() {
        let mut record = RevocationRegistryRecord::new(REG, CRED_DEF, 10);
        assert!(record.mark_full().is_err());
        record.activate().unwrap();
        assert_eq!(
            record.activate().unwrap_err(),
            RevocationStateError::InvalidTransition {
                registry_id: REG.into(),
                from: RevocationRegistryState::Active,
                to: RevocationRegistryState::Active,
            }
        );
        record.mark_full().unwrap();
        assert!(record.activate().is_err());
    }

    #[test]
    fn test_assert_active_carries_state() {
        assert!(tracker_with(RevocationRegistryState::Active).assert_active(REG).is_ok());
        for state in [RevocationRegistryState::Pending, RevocationRegistryState::Full] {
            assert_eq!(
                tracker_with(state).assert_active(REG).unwrap_err(),
                RevocationStateError::NotActive {
                    registry_id: REG.into(),
                    state,
                }
            );
        }
    }

    #[test]
    fn test_unknown_registry() {
        let tracker = RevocationRegistryTracker::new();
        assert_eq!(
            tracker.assert_active("nope").unwrap_err(),
            RevocationStateError::UnknownRegistry("nope".into())
        );
        assert!(tracker.activate("nope").is_err());
    }

    #[test]
    fn test_clones_share_state() {
        let tracker = tracker_with(RevocationRegistryState::Pending);
        let other = tracker.clone();
        other.activate(REG).unwrap();
        assert_eq!(tracker.state(REG), Some(RevocationRegistryState::Active));
    }

    #[test]
    fn test_slot_requires_both_parts() {
        assert_eq!(RevocationSlot::from_parts(None, None).unwrap(), None);
        assert_eq!(
            RevocationSlot::from_parts(Some(REG.into()), Some(0)).unwrap(),
            Some(RevocationSlot {
                registry_id: REG.into(),
                index: 0
            })
        );
        assert_eq!(
            RevocationSlot::from_parts(Some(REG.into()), None).unwrap_err(),
            RevocationStateError::IncompleteSlot {
                registry_id: Some(REG.into()),
                index: None
            }
        );
        assert!(RevocationSlot::from_parts(None, Some(3)).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn assert_active_iff_active(steps in prop::collection::vec(any::<bool>(), 0..6)) {
                let mut record = RevocationRegistryRecord::new(REG, CRED_DEF, 10);
                for activate in steps {
                    let _ = if activate { record.activate() } else { record.mark_full() };
                }
                prop_assert_eq!(
                    record.assert_active().is_ok(),
                    record.state() == RevocationRegistryState::Active
                );
            }
        }
    }
}
