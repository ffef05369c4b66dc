//! The archetype graph: every shape ever observed, plus memoized transitions.
//!
//! Archetypes live in an arena indexed by dense handles. The graph is a
//! reference structure reachable from many directions, so archetypes never
//! hold owning pointers to each other; edges are handle-to-handle maps.
//! Shapes are deduplicated by canonical hash, with exact id-set comparison
//! inside a bucket.

use std::collections::HashMap;

use strata_foundation::{Error, Ident, Result, shape_hash};

use crate::archetype::{Archetype, ArchetypeId};

/// Direction of a one-id structural edit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The entity gains an id.
    Add,
    /// The entity loses an id.
    Remove,
}

/// Registry of every distinct shape observed in a world.
///
/// The default policy is keep-alive: an archetype, once created, persists for
/// the world's lifetime unless explicitly pruned. Pruning tombstones the
/// arena slot (handles are never reused) and bumps an epoch that observers
/// use to drop stale references.
#[derive(Clone, Debug, Default)]
pub struct ArchetypeGraph {
    /// Arena of archetypes; `None` marks a pruned slot.
    archetypes: Vec<Option<Archetype>>,
    /// Shape hash -> handles with that hash.
    by_hash: HashMap<u64, Vec<ArchetypeId>>,
    /// Bumped on every prune.
    epoch: u64,
}

impl ArchetypeGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the unique archetype for an id-set, creating it if absent.
    ///
    /// The input need not be sorted; it is canonicalized here. Repeated calls
    /// with equal id-sets return the same handle.
    pub fn get_or_create(&mut self, ids: &[Ident]) -> ArchetypeId {
        let mut sorted = ids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let hash = shape_hash(&sorted);
        if let Some(bucket) = self.by_hash.get(&hash) {
            for &id in bucket {
                if let Some(existing) = self.archetype(id) {
                    if existing.ids() == sorted.as_slice() {
                        return id;
                    }
                }
            }
        }

        self.create(hash, sorted)
    }

    fn create(&mut self, hash: u64, sorted: Vec<Ident>) -> ArchetypeId {
        let index = u32::try_from(self.archetypes.len()).expect("too many archetypes");
        let id = ArchetypeId::new(index);
        self.archetypes.push(Some(Archetype::new(id, sorted)));
        self.by_hash.entry(hash).or_default().push(id);
        id
    }

    /// Returns the neighbor reached by adding or removing one id.
    ///
    /// The edge is memoized in both directions, so repeated edits of the same
    /// kind cost one map lookup after first use. Adding a present id or
    /// removing an absent one returns `from` unchanged; replay of buffered
    /// commands relies on this being idempotent rather than an error.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` refers to a pruned archetype.
    pub fn transition(
        &mut self,
        from: ArchetypeId,
        ident: Ident,
        transition: Transition,
    ) -> Result<ArchetypeId> {
        let source = self
            .archetype(from)
            .ok_or_else(|| Error::internal(format!("transition from pruned archetype {from:?}")))?;

        // Idempotent edits stay put.
        let present = source.contains(ident);
        match transition {
            Transition::Add if present => return Ok(from),
            Transition::Remove if !present => return Ok(from),
            _ => {}
        }

        // A memoized edge is only trusted while its target is alive.
        if let Some(to) = source.edge(ident, transition) {
            if self.archetype(to).is_some() {
                return Ok(to);
            }
        }

        let target_shape = source.shape_with(ident, transition);
        let to = self.get_or_create(&target_shape);

        let reverse = match transition {
            Transition::Add => Transition::Remove,
            Transition::Remove => Transition::Add,
        };
        self.archetype_slot(from).set_edge(ident, transition, to);
        self.archetype_slot(to).set_edge(ident, reverse, from);
        Ok(to)
    }

    /// Returns the archetype behind a handle, or `None` if pruned.
    #[must_use]
    pub fn archetype(&self, id: ArchetypeId) -> Option<&Archetype> {
        self.archetypes.get(id.index() as usize)?.as_ref()
    }

    /// Mutable access to a live archetype.
    pub(crate) fn archetype_mut(&mut self, id: ArchetypeId) -> Option<&mut Archetype> {
        self.archetypes.get_mut(id.index() as usize)?.as_mut()
    }

    fn archetype_slot(&mut self, id: ArchetypeId) -> &mut Archetype {
        self.archetypes[id.index() as usize]
            .as_mut()
            .expect("archetype pruned mid-transition")
    }

    /// Removes an archetype from the graph.
    ///
    /// The slot is tombstoned; the handle is never reused. Edges pointing at
    /// the pruned archetype are left in place and invalidated lazily by
    /// [`ArchetypeGraph::transition`].
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is already pruned or out of range.
    pub fn prune(&mut self, id: ArchetypeId) -> Result<()> {
        let slot = self
            .archetypes
            .get_mut(id.index() as usize)
            .ok_or_else(|| Error::internal(format!("prune of unknown archetype {id:?}")))?;
        let Some(archetype) = slot.take() else {
            return Err(Error::internal(format!(
                "prune of already pruned archetype {id:?}"
            )));
        };

        if let Some(bucket) = self.by_hash.get_mut(&archetype.shape_hash()) {
            bucket.retain(|&candidate| candidate != id);
            if bucket.is_empty() {
                self.by_hash.remove(&archetype.shape_hash());
            }
        }
        self.epoch += 1;
        Ok(())
    }

    /// Returns the number of live archetypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archetypes.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns true if the graph holds no live archetypes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exclusive upper bound on allocated handles.
    ///
    /// Handles are dense, so observers can discover newly created archetypes
    /// by scanning from a remembered watermark up to this bound.
    #[must_use]
    pub fn handle_bound(&self) -> u32 {
        u32::try_from(self.archetypes.len()).expect("too many archetypes")
    }

    /// Returns the prune epoch; it advances on every prune.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Iterates all live archetypes in handle order.
    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.iter().filter_map(Option::as_ref)
    }

    /// Iterates live archetypes whose handles were allocated at or after the
    /// given watermark, in handle order.
    pub fn created_since(&self, watermark: u32) -> impl Iterator<Item = &Archetype> {
        self.archetypes
            .iter()
            .skip(watermark as usize)
            .filter_map(Option::as_ref)
    }
}
