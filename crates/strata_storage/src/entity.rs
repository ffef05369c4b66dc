//! Entity lifecycle management with generational indices.
//!
//! The `EntityStore` allocates entity slots, reuses indices through a free
//! list, and bumps generations on reuse so stale handles are detectable.

// Slot counts fit in u32; we target 64-bit systems.
#![allow(clippy::cast_possible_truncation)]

use strata_foundation::{EntityId, Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// State of one entity slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub(crate) struct Slot {
    /// Current generation of the slot.
    pub generation: u32,
    /// Whether the slot currently holds a live entity.
    pub alive: bool,
}

/// Manages entity lifecycle and generation tracking.
///
/// Entities are allocated from a free list when available, otherwise new
/// indices are appended. Despawning marks the slot dead; the generation is
/// bumped when the index is next reused.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityStore {
    /// Slot state per entity index.
    slots: Vec<Slot>,
    /// Indices available for reuse.
    free_list: Vec<u32>,
    /// Count of live entities.
    live_count: usize,
}

impl EntityStore {
    /// Creates a new empty entity store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a new entity, returning its id.
    ///
    /// Reuses indices from the free list when available, bumping the slot's
    /// generation so handles to the previous occupant go stale.
    pub fn spawn(&mut self) -> EntityId {
        self.live_count += 1;

        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.alive = true;
            EntityId::new(index, slot.generation)
        } else {
            let index = u32::try_from(self.slots.len()).expect("too many entities");
            self.slots.push(Slot {
                generation: 1,
                alive: true,
            });
            EntityId::new(index, 1)
        }
    }

    /// Despawns an entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is stale or was never spawned.
    pub fn despawn(&mut self, id: EntityId) -> Result<()> {
        self.validate(id)?;

        self.slots[id.index as usize].alive = false;
        self.free_list.push(id.index);
        self.live_count -= 1;
        Ok(())
    }

    /// Checks if an entity handle refers to a live entity.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|slot| slot.alive && slot.generation == id.generation)
    }

    /// Validates that an entity handle is live.
    ///
    /// # Errors
    ///
    /// Returns a stale-entity error on a generation mismatch, and an
    /// entity-not-found error for dead or never-spawned slots.
    pub fn validate(&self, id: EntityId) -> Result<()> {
        let Some(slot) = self.slots.get(id.index as usize) else {
            return Err(Error::entity_not_found(id));
        };
        if slot.generation != id.generation {
            return Err(Error::stale_entity(id));
        }
        if !slot.alive {
            return Err(Error::entity_not_found(id));
        }
        Ok(())
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// Returns true if there are no live entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Iterates all live entity ids.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(|(index, slot)| EntityId::new(index as u32, slot.generation))
    }

    /// Returns the current generation for an index, if the slot exists.
    #[must_use]
    pub fn generation(&self, index: u32) -> Option<u32> {
        self.slots.get(index as usize).map(|slot| slot.generation)
    }

    /// Returns slot states as `(generation, alive)` pairs in index order.
    #[must_use]
    pub fn slot_states(&self) -> Vec<(u32, bool)> {
        self.slots
            .iter()
            .map(|slot| (slot.generation, slot.alive))
            .collect()
    }

    /// Rebuilds a store from slot states, recomputing the free list.
    #[must_use]
    pub fn from_slot_states(states: &[(u32, bool)]) -> Self {
        let slots: Vec<Slot> = states
            .iter()
            .map(|&(generation, alive)| Slot { generation, alive })
            .collect();
        let free_list = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.alive)
            .map(|(index, _)| index as u32)
            .collect();
        let live_count = slots.iter().filter(|slot| slot.alive).count();
        Self {
            slots,
            free_list,
            live_count,
        }
    }
}
