//! Relationship edges with bidirectional indices.
//!
//! The forward index (source -> relation -> targets) is what the query
//! matcher consults to resolve wildcard pair terms per entity. The reverse
//! index exists so despawning an entity can sever the edges pointing at it.

use std::collections::HashMap;

use strata_foundation::{ComponentId, EntityId};

/// Bidirectional store of relationship edges.
#[derive(Clone, Debug, Default)]
pub struct RelationIndex {
    /// Forward index: source -> relation -> targets, in link order.
    forward: HashMap<EntityId, HashMap<ComponentId, Vec<EntityId>>>,
    /// Reverse index: target -> relation -> sources, in link order.
    reverse: HashMap<EntityId, HashMap<ComponentId, Vec<EntityId>>>,
}

impl RelationIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an edge. Returns false if it already existed.
    pub fn link(&mut self, source: EntityId, relation: ComponentId, target: EntityId) -> bool {
        let targets = self
            .forward
            .entry(source)
            .or_default()
            .entry(relation)
            .or_default();
        if targets.contains(&target) {
            return false;
        }
        targets.push(target);

        self.reverse
            .entry(target)
            .or_default()
            .entry(relation)
            .or_default()
            .push(source);
        true
    }

    /// Removes an edge. Returns false if it did not exist.
    pub fn unlink(&mut self, source: EntityId, relation: ComponentId, target: EntityId) -> bool {
        let Some(targets) = self
            .forward
            .get_mut(&source)
            .and_then(|m| m.get_mut(&relation))
        else {
            return false;
        };
        let Some(pos) = targets.iter().position(|&t| t == target) else {
            return false;
        };
        targets.remove(pos);

        if let Some(sources) = self
            .reverse
            .get_mut(&target)
            .and_then(|m| m.get_mut(&relation))
        {
            if let Some(pos) = sources.iter().position(|&s| s == source) {
                sources.remove(pos);
            }
        }
        true
    }

    /// Returns the targets of a relation from a source, in link order.
    #[must_use]
    pub fn targets(&self, source: EntityId, relation: ComponentId) -> &[EntityId] {
        self.forward
            .get(&source)
            .and_then(|m| m.get(&relation))
            .map_or(&[], Vec::as_slice)
    }

    /// Returns the sources of a relation pointing at a target, in link order.
    #[must_use]
    pub fn sources(&self, target: EntityId, relation: ComponentId) -> &[EntityId] {
        self.reverse
            .get(&target)
            .and_then(|m| m.get(&relation))
            .map_or(&[], Vec::as_slice)
    }

    /// Returns true if the source has at least one target for the relation.
    #[must_use]
    pub fn has_any_target(&self, source: EntityId, relation: ComponentId) -> bool {
        !self.targets(source, relation).is_empty()
    }

    /// Returns true if the source has any relationship at all.
    #[must_use]
    pub fn has_any_relation(&self, source: EntityId) -> bool {
        self.forward
            .get(&source)
            .is_some_and(|m| m.values().any(|targets| !targets.is_empty()))
    }

    /// Iterates the source's relations as `(relation, targets)`.
    pub fn relations(
        &self,
        source: EntityId,
    ) -> impl Iterator<Item = (ComponentId, &[EntityId])> {
        self.forward
            .get(&source)
            .into_iter()
            .flat_map(|m| m.iter().map(|(&rel, targets)| (rel, targets.as_slice())))
            .filter(|(_, targets)| !targets.is_empty())
    }

    /// Returns the edges pointing at `target` as `(source, relation)` pairs.
    #[must_use]
    pub fn incoming(&self, target: EntityId) -> Vec<(EntityId, ComponentId)> {
        let mut edges = Vec::new();
        if let Some(by_relation) = self.reverse.get(&target) {
            for (&relation, sources) in by_relation {
                for &source in sources {
                    edges.push((source, relation));
                }
            }
        }
        edges
    }

    /// Returns every edge as `(source, relation, target)` triples.
    #[must_use]
    pub fn edges(&self) -> Vec<(EntityId, ComponentId, EntityId)> {
        let mut edges = Vec::new();
        for (&source, by_relation) in &self.forward {
            for (&relation, targets) in by_relation {
                for &target in targets {
                    edges.push((source, relation, target));
                }
            }
        }
        edges
    }

    /// Drops every edge touching the entity, in either direction.
    pub fn remove_entity(&mut self, entity: EntityId) {
        if let Some(by_relation) = self.forward.remove(&entity) {
            for (relation, targets) in by_relation {
                for target in targets {
                    if let Some(sources) = self
                        .reverse
                        .get_mut(&target)
                        .and_then(|m| m.get_mut(&relation))
                    {
                        sources.retain(|&s| s != entity);
                    }
                }
            }
        }
        if let Some(by_relation) = self.reverse.remove(&entity) {
            for (relation, sources) in by_relation {
                for source in sources {
                    if let Some(targets) = self
                        .forward
                        .get_mut(&source)
                        .and_then(|m| m.get_mut(&relation))
                    {
                        targets.retain(|&t| t != entity);
                    }
                }
            }
        }
    }

    /// Drops all edges.
    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }
}
