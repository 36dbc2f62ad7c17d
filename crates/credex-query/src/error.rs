use thiserror::Error;

/// Errors raised while compiling or validating a presentation request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The referent names neither an attribute group nor a predicate group.
    #[error("referent not found in presentation request: {0}")]
    ReferentNotFound(String),

    /// An attribute is requested both as a revealed attribute and as a predicate.
    #[error("attribute '{0}' is requested by both an attribute group and a predicate group")]
    DuplicateGroupName(String),
}
