//! # credex-state: Exchange and Registry State Machines
//!
//! Runtime-checked state machines in the record-plus-transition-log style:
//! each machine exposes one method per legal transition, rejects everything
//! else with a structured error, and keeps an ordered history of what
//! happened and why.
//!
//! ## State Machines
//!
//! - **Credential exchange** (`exchange.rs`):
//!   `Proposed → Offered → Requested → Issued → Stored → Done`, with
//!   `Abandoned` reachable from every non-terminal state.
//!
//! - **Revocation registry** (`revocation.rs`): `Pending → Active → Full`.
//!   `RevocationRegistryTracker::assert_active` gates issuance of revocable
//!   credentials.

pub mod exchange;
pub mod revocation;

pub use exchange::{
    CredentialExchange, CredentialExchangeState, ExchangeStateError, ExchangeTransitionRecord,
};
pub use revocation::{
    RegistryTransitionRecord, RevocationRegistryRecord, RevocationRegistryState,
    RevocationRegistryTracker, RevocationSlot, RevocationStateError,
};
