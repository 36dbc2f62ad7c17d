//! # credex-query: Presentation Requests and Credential Selection Queries
//!
//! - **Request model** (`request.rs`): wire shape of an AnonCreds
//!   presentation request.
//! - **Tag queries** (`tag_query.rs`): AND/OR trees over record tags,
//!   evaluated in memory or handed to a record-query executor.
//! - **Compiler** (`compiler.rs`): one request group into a tag query that
//!   selects candidate credentials.
//! - **Equivalence** (`equivalence.rs`): semantic identity of two requests,
//!   used for auto-accept and de-duplication.
//! - **Validation** (`validation.rs`): structural pre-checks.
//!
//! ## Crate Policy
//!
//! - Depends only on `credex-core`.
//! - No I/O; every function is pure.
//! - Unknown restriction keys are ignored, never rejected.

pub mod compiler;
pub mod equivalence;
pub mod error;
pub mod request;
pub mod tag_query;
pub mod validation;

pub use compiler::{QueryCompiler, TagVocabulary};
pub use equivalence::are_equivalent;
pub use error::QueryError;
pub use request::{
    AttributeGroup, NonRevokedInterval, PredicateGroup, PredicateType, PresentationRequest,
    RequestedGroup, Restriction,
};
pub use tag_query::{TagQuery, TagValue, Tags};
pub use validation::{assert_no_duplicate_group_names, uses_unqualified_identifiers};
