//! Query terms: the user-facing clauses a query is built from.

use strata_foundation::Ident;

/// Maximum number of terms in one query.
pub const MAX_QUERY_TERMS: usize = 8;

/// Operation kind of a term.
///
/// The derived order (All < Any < Not) is the canonical group order used
/// when sorting a term list for hashing and plan lowering.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TermOp {
    /// The id must be present.
    All,
    /// At least one id of the Any group must be present.
    Any,
    /// The id must be absent.
    Not,
}

/// Access mode requested for a term's column.
///
/// Access is part of a query's identity: the same term list with different
/// access modes is a different cached query.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Access {
    /// No column access; the term only filters.
    None,
    /// Read-only column access.
    #[default]
    Read,
    /// Read-write column access.
    Write,
}

/// How the matching VM will evaluate a term's id.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TermClass {
    /// Plain id: a presence test against the shape.
    Simple,
    /// Concrete pair: a presence test against the pair id in the shape.
    Complex,
    /// Pair with a wildcard slot: resolved per entity.
    Wildcard,
}

/// One query clause.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Term {
    /// The id being queried: plain, pair, or wildcard pair.
    pub id: Ident,
    /// Operation kind.
    pub op: TermOp,
    /// Requested access mode.
    pub access: Access,
}

impl Term {
    /// Creates an All term with read access.
    #[must_use]
    pub fn all(id: impl Into<Ident>) -> Self {
        Self {
            id: id.into(),
            op: TermOp::All,
            access: Access::Read,
        }
    }

    /// Creates an Any term with read access.
    #[must_use]
    pub fn any(id: impl Into<Ident>) -> Self {
        Self {
            id: id.into(),
            op: TermOp::Any,
            access: Access::Read,
        }
    }

    /// Creates a Not term. Not terms carry no access.
    #[must_use]
    pub fn not(id: impl Into<Ident>) -> Self {
        Self {
            id: id.into(),
            op: TermOp::Not,
            access: Access::None,
        }
    }

    /// Sets the access mode.
    #[must_use]
    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Returns the VM evaluation class of this term's id.
    #[must_use]
    pub fn class(&self) -> TermClass {
        if !self.id.is_pair() {
            TermClass::Simple
        } else if self.id.is_wildcard() {
            TermClass::Wildcard
        } else {
            TermClass::Complex
        }
    }
}
