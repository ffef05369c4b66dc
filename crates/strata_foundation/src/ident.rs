//! Packed identifiers for components and relationship pairs.
//!
//! An [`Ident`] is the unit of an archetype's shape: either a plain component
//! id, or a relationship pair `(relation, target)` packed into one 64-bit
//! value. Either slot of a pair may hold the wildcard marker, producing terms
//! such as `(ChildOf, *)` that queries resolve per entity.

// Slot extraction narrows u64 to u32 by construction.
#![allow(clippy::cast_possible_truncation)]

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Interned component (or relation) identifier.
///
/// Components are small dense integers allocated by the
/// [`ComponentRegistry`](crate::ComponentRegistry).
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComponentId(u32);

impl ComponentId {
    /// Creates a component id from a raw index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index of this component.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

/// Pair flag occupies the top bit of the packed value.
const PAIR_BIT: u64 = 1 << 63;
/// The relation slot of a pair is 31 bits wide; this value marks a wildcard.
const RELATION_ANY: u32 = 0x7FFF_FFFF;

/// A shape identifier: a plain component id or a relationship pair.
///
/// # Layout
/// - plain component: bits 0..32 hold the component index, the rest is zero
/// - pair: bit 63 set, bits 32..63 hold the relation, bits 0..32 the target
///   entity index
///
/// The total order over packed values is the canonical order of a shape:
/// plain components sort before pairs, and ids ascend within each class.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ident(u64);

impl Ident {
    /// Wildcard marker accepted in either slot of a pair.
    pub const ANY: u32 = u32::MAX;

    /// Creates an ident for a plain component.
    #[must_use]
    pub const fn component(id: ComponentId) -> Self {
        Self(id.0 as u64)
    }

    /// Creates an ident for a concrete relationship pair.
    ///
    /// Only the target's index is packed; generations play no part in
    /// matching.
    #[must_use]
    pub fn pair(relation: ComponentId, target: EntityId) -> Self {
        Self::pair_raw(relation.0, target.index)
    }

    /// Creates a pair ident from raw slot values.
    ///
    /// Pass [`Ident::ANY`] in either slot for a wildcard.
    #[must_use]
    pub fn pair_raw(relation: u32, target: u32) -> Self {
        let rel = if relation == Self::ANY {
            RELATION_ANY
        } else {
            debug_assert!(relation < RELATION_ANY, "relation id out of range");
            relation
        };
        Self(PAIR_BIT | (u64::from(rel) << 32) | u64::from(target))
    }

    /// Creates the wildcard-target pair `(relation, *)`.
    #[must_use]
    pub fn any_target(relation: ComponentId) -> Self {
        Self::pair_raw(relation.0, Self::ANY)
    }

    /// Creates the wildcard-relation pair `(*, target)`.
    #[must_use]
    pub fn any_relation(target: EntityId) -> Self {
        Self::pair_raw(Self::ANY, target.index)
    }

    /// Creates the fully wildcard pair `(*, *)`.
    #[must_use]
    pub fn any_pair() -> Self {
        Self::pair_raw(Self::ANY, Self::ANY)
    }

    /// Returns true if this ident is a relationship pair.
    #[must_use]
    pub const fn is_pair(self) -> bool {
        self.0 & PAIR_BIT != 0
    }

    /// Returns true if this ident is a pair with a wildcard in either slot.
    #[must_use]
    pub fn is_wildcard(self) -> bool {
        self.is_pair() && (self.relation().is_none() || self.target().is_none())
    }

    /// Returns the component id of a plain ident, or `None` for pairs.
    #[must_use]
    pub fn component_id(self) -> Option<ComponentId> {
        if self.is_pair() {
            None
        } else {
            Some(ComponentId(self.0 as u32))
        }
    }

    /// Returns the relation of a pair, or `None` for plain idents and
    /// wildcard-relation pairs.
    #[must_use]
    pub fn relation(self) -> Option<ComponentId> {
        if !self.is_pair() {
            return None;
        }
        let raw = ((self.0 & !PAIR_BIT) >> 32) as u32;
        if raw == RELATION_ANY {
            None
        } else {
            Some(ComponentId(raw))
        }
    }

    /// Returns the target entity index of a pair, or `None` for plain idents
    /// and wildcard-target pairs.
    #[must_use]
    pub fn target(self) -> Option<u32> {
        if !self.is_pair() {
            return None;
        }
        let raw = self.0 as u32;
        if raw == Self::ANY { None } else { Some(raw) }
    }

    /// Returns the packed 64-bit value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl From<ComponentId> for Ident {
    fn from(id: ComponentId) -> Self {
        Self::component(id)
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pair() {
            match (self.relation(), self.target()) {
                (Some(r), Some(t)) => write!(f, "Ident({},{t})", r.index()),
                (Some(r), None) => write!(f, "Ident({},*)", r.index()),
                (None, Some(t)) => write!(f, "Ident(*,{t})"),
                (None, None) => write!(f, "Ident(*,*)"),
            }
        } else {
            write!(f, "Ident({})", self.0)
        }
    }
}
