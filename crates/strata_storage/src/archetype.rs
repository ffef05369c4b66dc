//! Archetypes: one table per distinct shape.
//!
//! An archetype owns the entity membership for one sorted id-set and the
//! memoized transition edges leading to its neighbors in the archetype graph.
//! Column data lives in external chunk storage; the archetype only answers
//! id-to-column-index lookups and hands out logical chunk views over its rows.

use std::collections::HashMap;
use std::fmt;

use strata_foundation::{EntityId, Ident, shape_hash};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::Transition;

/// Number of entity rows per logical chunk.
pub const CHUNK_CAPACITY: usize = 512;

/// Handle to an archetype in the graph's arena.
///
/// Handles are dense and never reused after pruning.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArchetypeId(u32);

impl ArchetypeId {
    /// Creates a handle from a raw arena index.
    #[must_use]
    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw arena index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ArchetypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArchetypeId({})", self.0)
    }
}

/// A table of entities sharing one shape.
#[derive(Clone, Debug)]
pub struct Archetype {
    /// Arena handle.
    id: ArchetypeId,
    /// The shape: unique idents, sorted by packed value.
    ids: Vec<Ident>,
    /// Canonical hash of the sorted id-set.
    hash: u64,
    /// Entity rows, in row order.
    entities: Vec<EntityId>,
    /// Memoized add-edges: ident -> neighbor gained by adding it.
    edges_add: HashMap<Ident, ArchetypeId>,
    /// Memoized remove-edges: ident -> neighbor gained by removing it.
    edges_remove: HashMap<Ident, ArchetypeId>,
}

impl Archetype {
    /// Creates an archetype for a sorted, deduplicated id-set.
    pub(crate) fn new(id: ArchetypeId, ids: Vec<Ident>) -> Self {
        debug_assert!(ids.is_sorted(), "archetype shape must be sorted");
        debug_assert!(
            ids.windows(2).all(|w| w[0] != w[1]),
            "archetype shape must not contain duplicates"
        );
        let hash = shape_hash(&ids);
        Self {
            id,
            ids,
            hash,
            entities: Vec::new(),
            edges_add: HashMap::new(),
            edges_remove: HashMap::new(),
        }
    }

    /// Returns the arena handle of this archetype.
    #[must_use]
    pub fn id(&self) -> ArchetypeId {
        self.id
    }

    /// Returns the shape as a sorted id slice.
    #[must_use]
    pub fn ids(&self) -> &[Ident] {
        &self.ids
    }

    /// Returns the canonical hash of the shape.
    #[must_use]
    pub fn shape_hash(&self) -> u64 {
        self.hash
    }

    /// Returns true if the shape contains the ident.
    #[must_use]
    pub fn contains(&self, ident: Ident) -> bool {
        self.ids.binary_search(&ident).is_ok()
    }

    /// Returns the storage column index of an ident within this archetype.
    ///
    /// This is the lookup chunk storage consumes to address column data.
    #[must_use]
    pub fn column_index(&self, ident: Ident) -> Option<usize> {
        self.ids.binary_search(&ident).ok()
    }

    /// Returns the number of entity rows.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the archetype holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns all entity rows in row order.
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Appends an entity, returning its row.
    pub(crate) fn push_entity(&mut self, entity: EntityId) -> usize {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    /// Removes the entity at `row` by swapping in the last row.
    ///
    /// Returns the entity that moved into the vacated row, if any; the caller
    /// must update that entity's recorded location.
    pub(crate) fn swap_remove_entity(&mut self, row: usize) -> Option<EntityId> {
        self.entities.swap_remove(row);
        self.entities.get(row).copied()
    }

    /// Returns the number of logical chunks covering the rows.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.entities.len().div_ceil(CHUNK_CAPACITY)
    }

    /// Returns the chunk at `index`, if in range.
    #[must_use]
    pub fn chunk(&self, index: usize) -> Option<Chunk<'_>> {
        let start = index.checked_mul(CHUNK_CAPACITY)?;
        if start >= self.entities.len() {
            return None;
        }
        let end = (start + CHUNK_CAPACITY).min(self.entities.len());
        Some(Chunk {
            archetype: self.id,
            index,
            entities: &self.entities[start..end],
        })
    }

    /// Iterates all chunks in row order.
    pub fn chunks(&self) -> impl Iterator<Item = Chunk<'_>> {
        (0..self.chunk_count()).filter_map(|i| self.chunk(i))
    }

    /// Looks up a memoized transition edge.
    #[must_use]
    pub fn edge(&self, ident: Ident, transition: Transition) -> Option<ArchetypeId> {
        match transition {
            Transition::Add => self.edges_add.get(&ident).copied(),
            Transition::Remove => self.edges_remove.get(&ident).copied(),
        }
    }

    /// Memoizes a transition edge.
    pub(crate) fn set_edge(&mut self, ident: Ident, transition: Transition, to: ArchetypeId) {
        match transition {
            Transition::Add => self.edges_add.insert(ident, to),
            Transition::Remove => self.edges_remove.insert(ident, to),
        };
    }

    /// Returns the shape produced by applying a transition to this one.
    pub(crate) fn shape_with(&self, ident: Ident, transition: Transition) -> Vec<Ident> {
        let mut ids = self.ids.clone();
        match transition {
            Transition::Add => {
                if let Err(pos) = ids.binary_search(&ident) {
                    ids.insert(pos, ident);
                }
            }
            Transition::Remove => {
                if let Ok(pos) = ids.binary_search(&ident) {
                    ids.remove(pos);
                }
            }
        }
        ids
    }
}

/// A fixed-capacity view over a contiguous run of entity rows.
///
/// Row iteration within a chunk, and any parallel fan-out across chunks, is
/// the caller's responsibility.
#[derive(Copy, Clone, Debug)]
pub struct Chunk<'a> {
    /// Owning archetype.
    archetype: ArchetypeId,
    /// Chunk index within the archetype.
    index: usize,
    /// The rows covered by this chunk.
    entities: &'a [EntityId],
}

impl<'a> Chunk<'a> {
    /// Returns the owning archetype's handle.
    #[must_use]
    pub fn archetype(&self) -> ArchetypeId {
        self.archetype
    }

    /// Returns the chunk index within the archetype.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the rows covered by this chunk.
    #[must_use]
    pub fn entities(&self) -> &'a [EntityId] {
        self.entities
    }

    /// Returns the number of rows in this chunk.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the chunk holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
