//! Error types shared across the Strata workspace.
//!
//! Uses `thiserror` for ergonomic error definition.

use thiserror::Error;

use crate::entity::EntityId;
use crate::ident::{ComponentId, Ident};

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Strata operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    /// Creates an empty-query error.
    #[must_use]
    pub fn empty_query() -> Self {
        Self::new(ErrorKind::EmptyQuery)
    }

    /// Creates a duplicate-term error.
    #[must_use]
    pub fn duplicate_term(id: Ident) -> Self {
        Self::new(ErrorKind::DuplicateTerm(id))
    }

    /// Creates a conflicting-term error.
    #[must_use]
    pub fn conflicting_term(id: Ident) -> Self {
        Self::new(ErrorKind::ConflictingTerm(id))
    }

    /// Creates a term-count error.
    #[must_use]
    pub fn too_many_terms(count: usize, limit: usize) -> Self {
        Self::new(ErrorKind::TooManyTerms { count, limit })
    }

    /// Creates an unknown-id error.
    #[must_use]
    pub fn id_not_found(id: Ident) -> Self {
        Self::new(ErrorKind::IdNotFound(id))
    }

    /// Creates a not-a-relation error.
    #[must_use]
    pub fn not_a_relation(id: ComponentId) -> Self {
        Self::new(ErrorKind::NotARelation(id))
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(id: EntityId) -> Self {
        Self::new(ErrorKind::EntityNotFound(id))
    }

    /// Creates a stale entity reference error.
    #[must_use]
    pub fn stale_entity(id: EntityId) -> Self {
        Self::new(ErrorKind::StaleEntity(id))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A query was built from an empty term list.
    #[error("invalid query: empty term list")]
    EmptyQuery,

    /// The same id appeared twice within one term kind.
    #[error("invalid query: duplicate term {0:?}")]
    DuplicateTerm(Ident),

    /// An id appeared in conflicting term kinds (e.g. both All and Not).
    #[error("invalid query: conflicting term {0:?}")]
    ConflictingTerm(Ident),

    /// The query exceeded the configured term maximum.
    #[error("invalid query: {count} terms exceeds the limit of {limit}")]
    TooManyTerms {
        /// Number of terms supplied.
        count: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// A term referenced an id unknown to the component registry.
    #[error("id not found: {0:?}")]
    IdNotFound(Ident),

    /// A pair term named a component that is not registered as a relation.
    #[error("not a relation: {0:?}")]
    NotARelation(ComponentId),

    /// Entity was not found in storage.
    #[error("entity not found: {0:?}")]
    EntityNotFound(EntityId),

    /// Entity reference is stale (generation mismatch).
    #[error("stale entity reference: {0:?}")]
    StaleEntity(EntityId),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}
