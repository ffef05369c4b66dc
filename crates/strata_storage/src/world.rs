//! World state: the unified mutable façade over all storage subsystems.
//!
//! A `World` owns the component registry, entity store, archetype graph,
//! relationship index, and the entity-to-row location table. Every structural
//! change (spawn, despawn, add, remove, link, unlink) funnels through the
//! graph's memoized transitions here.
//!
//! Structural mutation requires `&mut World`, while query passes borrow
//! `&World`, so the borrow checker serializes mutation against in-flight
//! enumeration for single-owner use. The debug-mode iteration counter exists
//! to catch violations routed around the borrow checker, e.g. through a
//! future scheduler integration; release builds compile it away.

#[cfg(not(debug_assertions))]
use std::marker::PhantomData;
#[cfg(debug_assertions)]
use std::sync::atomic::{AtomicU32, Ordering};

use strata_foundation::{ComponentId, EntityId, Error, Ident, Result};

use crate::archetype::{Archetype, ArchetypeId};
use crate::entity::EntityStore;
use crate::graph::{ArchetypeGraph, Transition};
use crate::relation::RelationIndex;

/// Where an entity's row currently lives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct EntityLocation {
    /// The archetype holding the entity.
    pub archetype: ArchetypeId,
    /// The entity's row within that archetype.
    pub row: u32,
}

/// Mutable simulation state.
#[derive(Debug)]
pub struct World {
    /// Component and relation names.
    registry: strata_foundation::ComponentRegistry,
    /// Entity lifecycle.
    entities: EntityStore,
    /// The universe of shapes.
    graph: ArchetypeGraph,
    /// Relationship edges.
    relations: RelationIndex,
    /// Entity index -> current location.
    locations: Vec<EntityLocation>,
    /// The empty shape every entity spawns into.
    root: ArchetypeId,
    /// Number of passes currently enumerating this world.
    #[cfg(debug_assertions)]
    passes: AtomicU32,
}

impl World {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = ArchetypeGraph::new();
        let root = graph.get_or_create(&[]);
        Self {
            registry: strata_foundation::ComponentRegistry::new(),
            entities: EntityStore::new(),
            graph,
            relations: RelationIndex::new(),
            locations: Vec::new(),
            root,
            #[cfg(debug_assertions)]
            passes: AtomicU32::new(0),
        }
    }

    // --- Registration ---

    /// Registers a component name, returning its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already registered as a relation.
    pub fn register_component(&mut self, name: &str) -> Result<ComponentId> {
        self.registry.register_component(name)
    }

    /// Registers a relation name, returning its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already registered as a component.
    pub fn register_relation(&mut self, name: &str) -> Result<ComponentId> {
        self.registry.register_relation(name)
    }

    /// Returns the component registry.
    #[must_use]
    pub fn registry(&self) -> &strata_foundation::ComponentRegistry {
        &self.registry
    }

    // --- Entity lifecycle ---

    /// Spawns a new entity in the empty root archetype.
    pub fn spawn(&mut self) -> EntityId {
        self.assert_no_pass();
        let entity = self.entities.spawn();
        let row = self
            .graph
            .archetype_mut(self.root)
            .expect("root archetype pruned")
            .push_entity(entity);
        let location = EntityLocation {
            archetype: self.root,
            #[allow(clippy::cast_possible_truncation)]
            row: row as u32,
        };
        let index = entity.index as usize;
        if index == self.locations.len() {
            self.locations.push(location);
        } else {
            self.locations[index] = location;
        }
        entity
    }

    /// Despawns an entity, severing every relationship edge touching it.
    ///
    /// Sources of incoming edges lose the corresponding pair id from their
    /// shape, which is a structural change for each of them.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity handle is stale or dead.
    pub fn despawn(&mut self, entity: EntityId) -> Result<()> {
        self.assert_no_pass();
        self.entities.validate(entity)?;

        for (source, relation) in self.relations.incoming(entity) {
            if source != entity {
                let pair = Ident::pair(relation, entity);
                self.apply_transition(source, pair, Transition::Remove)?;
            }
        }
        self.relations.remove_entity(entity);

        self.detach_row(entity);
        self.entities.despawn(entity)
    }

    /// Checks if an entity handle refers to a live entity.
    #[must_use]
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.is_alive(entity)
    }

    /// Validates that an entity handle is live.
    ///
    /// # Errors
    ///
    /// Returns a stale-entity or entity-not-found error.
    pub fn validate(&self, entity: EntityId) -> Result<()> {
        self.entities.validate(entity)
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterates all live entity ids.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter()
    }

    // --- Components ---

    /// Adds a component to an entity. Adding a present component is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is dead or the component unregistered.
    pub fn add(&mut self, entity: EntityId, component: ComponentId) -> Result<()> {
        self.assert_no_pass();
        self.entities.validate(entity)?;
        if !self.registry.contains(component) {
            return Err(Error::id_not_found(Ident::component(component)));
        }
        self.apply_transition(entity, Ident::component(component), Transition::Add)
    }

    /// Removes a component from an entity. Removing an absent component is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is dead or the component unregistered.
    pub fn remove(&mut self, entity: EntityId, component: ComponentId) -> Result<()> {
        self.assert_no_pass();
        self.entities.validate(entity)?;
        if !self.registry.contains(component) {
            return Err(Error::id_not_found(Ident::component(component)));
        }
        self.apply_transition(entity, Ident::component(component), Transition::Remove)
    }

    /// Returns true if a live entity has the component.
    #[must_use]
    pub fn has(&self, entity: EntityId, component: ComponentId) -> bool {
        self.has_ident(entity, Ident::component(component))
    }

    /// Returns true if a live entity's shape contains the ident.
    #[must_use]
    pub fn has_ident(&self, entity: EntityId, ident: Ident) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }
        self.archetype_for(entity)
            .is_some_and(|archetype| archetype.contains(ident))
    }

    // --- Relationships ---

    /// Creates a relationship edge from source to target.
    ///
    /// The pair id joins the source's shape (a structural change) and the
    /// edge is recorded in the relationship index. Linking an existing edge
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if either entity is dead, or the relation id is not
    /// registered as a relation.
    pub fn link(
        &mut self,
        source: EntityId,
        relation: ComponentId,
        target: EntityId,
    ) -> Result<()> {
        self.assert_no_pass();
        self.entities.validate(source)?;
        self.entities.validate(target)?;
        if !self.registry.contains(relation) {
            return Err(Error::id_not_found(Ident::component(relation)));
        }
        if !self.registry.is_relation(relation) {
            return Err(Error::not_a_relation(relation));
        }

        if self.relations.link(source, relation, target) {
            self.apply_transition(source, Ident::pair(relation, target), Transition::Add)?;
        }
        Ok(())
    }

    /// Removes a relationship edge. Unlinking an absent edge is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if either entity is dead.
    pub fn unlink(
        &mut self,
        source: EntityId,
        relation: ComponentId,
        target: EntityId,
    ) -> Result<()> {
        self.assert_no_pass();
        self.entities.validate(source)?;
        self.entities.validate(target)?;

        if self.relations.unlink(source, relation, target) {
            self.apply_transition(source, Ident::pair(relation, target), Transition::Remove)?;
        }
        Ok(())
    }

    /// Returns the targets of a relation from a source, in link order.
    #[must_use]
    pub fn targets(&self, source: EntityId, relation: ComponentId) -> &[EntityId] {
        self.relations.targets(source, relation)
    }

    /// Returns the relationship index.
    #[must_use]
    pub fn relations(&self) -> &RelationIndex {
        &self.relations
    }

    // --- Shapes and archetypes ---

    /// Returns the entity's shape as a sorted id slice.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is dead.
    pub fn shape(&self, entity: EntityId) -> Result<&[Ident]> {
        self.entities.validate(entity)?;
        self.archetype_for(entity)
            .map(Archetype::ids)
            .ok_or_else(|| Error::internal(format!("entity {entity:?} has no archetype")))
    }

    /// Returns the handle of the archetype holding the entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is dead.
    pub fn archetype_of(&self, entity: EntityId) -> Result<ArchetypeId> {
        self.entities.validate(entity)?;
        Ok(self.locations[entity.index as usize].archetype)
    }

    /// Returns the archetype graph.
    #[must_use]
    pub fn graph(&self) -> &ArchetypeGraph {
        &self.graph
    }

    /// Removes archetypes with no entity rows, keeping the root.
    ///
    /// Returns the number of archetypes pruned. The default policy is
    /// keep-alive; nothing is pruned unless this is called.
    pub fn prune_empty_archetypes(&mut self) -> usize {
        self.assert_no_pass();
        let doomed: Vec<ArchetypeId> = self
            .graph
            .iter()
            .filter(|archetype| archetype.is_empty() && archetype.id() != self.root)
            .map(Archetype::id)
            .collect();
        for id in &doomed {
            self.graph
                .prune(*id)
                .expect("pruning a live empty archetype");
        }
        doomed.len()
    }

    // --- Pass accounting ---

    /// Marks the start of an enumeration over this world.
    ///
    /// The guard decrements the counter when dropped. Structural mutators
    /// assert the counter is zero in debug builds.
    #[must_use]
    pub fn iteration_guard(&self) -> IterationGuard<'_> {
        #[cfg(debug_assertions)]
        {
            self.passes.fetch_add(1, Ordering::Relaxed);
            IterationGuard {
                passes: &self.passes,
            }
        }
        #[cfg(not(debug_assertions))]
        {
            IterationGuard {
                _world: PhantomData,
            }
        }
    }

    #[inline]
    fn assert_no_pass(&self) {
        #[cfg(debug_assertions)]
        debug_assert_eq!(
            self.passes.load(Ordering::Relaxed),
            0,
            "structural mutation during an in-flight pass"
        );
    }

    // --- Internal plumbing ---

    fn archetype_for(&self, entity: EntityId) -> Option<&Archetype> {
        let location = self.locations.get(entity.index as usize)?;
        self.graph.archetype(location.archetype)
    }

    /// Moves an entity along one graph transition, fixing up row locations.
    fn apply_transition(
        &mut self,
        entity: EntityId,
        ident: Ident,
        transition: Transition,
    ) -> Result<()> {
        let from = self.locations[entity.index as usize].archetype;
        let to = self.graph.transition(from, ident, transition)?;
        if to == from {
            return Ok(());
        }

        self.detach_row(entity);
        let row = self
            .graph
            .archetype_mut(to)
            .expect("transition target pruned")
            .push_entity(entity);
        self.locations[entity.index as usize] = EntityLocation {
            archetype: to,
            #[allow(clippy::cast_possible_truncation)]
            row: row as u32,
        };
        Ok(())
    }

    /// Removes an entity's row, updating the location of the row swapped in.
    fn detach_row(&mut self, entity: EntityId) {
        let location = self.locations[entity.index as usize];
        let archetype = self
            .graph
            .archetype_mut(location.archetype)
            .expect("entity located in pruned archetype");
        if let Some(moved) = archetype.swap_remove_entity(location.row as usize) {
            self.locations[moved.index as usize].row = location.row;
        }
    }

    /// Restores internal state from snapshot parts.
    pub(crate) fn from_parts(
        registry: strata_foundation::ComponentRegistry,
        entities: EntityStore,
        graph: ArchetypeGraph,
        relations: RelationIndex,
        locations: Vec<EntityLocation>,
        root: ArchetypeId,
    ) -> Self {
        Self {
            registry,
            entities,
            graph,
            relations,
            locations,
            root,
            #[cfg(debug_assertions)]
            passes: AtomicU32::new(0),
        }
    }

    pub(crate) fn entity_store(&self) -> &EntityStore {
        &self.entities
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII marker for an enumeration in progress.
#[derive(Debug)]
pub struct IterationGuard<'a> {
    #[cfg(debug_assertions)]
    passes: &'a AtomicU32,
    #[cfg(not(debug_assertions))]
    _world: PhantomData<&'a World>,
}

#[cfg(debug_assertions)]
impl Drop for IterationGuard<'_> {
    fn drop(&mut self) {
        self.passes.fetch_sub(1, Ordering::Relaxed);
    }
}
