//! Plain-data capture and restore of world state.
//!
//! A [`WorldSnapshot`] carries everything an external serializer needs to
//! reconstruct a world: component definitions in id order, entity slot
//! states, per-archetype id-sets with rows in row order, and relationship
//! edges. The wire format is the serializer's concern; with the `serde`
//! feature the snapshot types derive `Serialize`/`Deserialize`.

use strata_foundation::{ComponentId, EntityId, Error, Ident, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::entity::EntityStore;
use crate::graph::ArchetypeGraph;
use crate::relation::RelationIndex;
use crate::world::{EntityLocation, World};

/// One registered component or relation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComponentDef {
    /// Registered name.
    pub name: String,
    /// True if the id is a relation usable in pairs.
    pub is_relation: bool,
}

/// One archetype's shape and row assignment.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArchetypeRows {
    /// The sorted id-set.
    pub ids: Vec<Ident>,
    /// Entities in row order.
    pub rows: Vec<EntityId>,
}

/// Complete world state in plain data.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldSnapshot {
    /// Component definitions, indexed by `ComponentId`.
    pub components: Vec<ComponentDef>,
    /// Entity slot states as `(generation, alive)`, indexed by entity index.
    pub slots: Vec<(u32, bool)>,
    /// Every live archetype, including empty ones (keep-alive policy).
    pub archetypes: Vec<ArchetypeRows>,
    /// Relationship edges as `(source, relation, target)`.
    pub edges: Vec<(EntityId, ComponentId, EntityId)>,
}

impl World {
    /// Captures the world's structural state.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        let components = self
            .registry()
            .iter()
            .map(|(_, name, is_relation)| ComponentDef {
                name: name.to_owned(),
                is_relation,
            })
            .collect();

        let archetypes = self
            .graph()
            .iter()
            .map(|archetype| ArchetypeRows {
                ids: archetype.ids().to_vec(),
                rows: archetype.entities().to_vec(),
            })
            .collect();

        let mut edges = self.relations().edges();
        edges.sort();

        WorldSnapshot {
            components,
            slots: self.entity_store().slot_states(),
            archetypes,
            edges,
        }
    }

    /// Rebuilds a world from a snapshot.
    ///
    /// Archetype id-sets, entity-to-row mappings, and relationship edges come
    /// out identical to the captured world. Memoized transition edges are not
    /// captured; they rebuild lazily on the first edit of each kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is internally inconsistent (rows
    /// naming dead entities, entities placed twice or not at all).
    pub fn restore(snapshot: &WorldSnapshot) -> Result<World> {
        let mut registry = strata_foundation::ComponentRegistry::new();
        for (index, def) in snapshot.components.iter().enumerate() {
            let id = if def.is_relation {
                registry.register_relation(&def.name)?
            } else {
                registry.register_component(&def.name)?
            };
            if id.index() as usize != index {
                return Err(Error::internal(format!(
                    "snapshot component {:?} restored out of order",
                    def.name
                )));
            }
        }

        let entities = EntityStore::from_slot_states(&snapshot.slots);

        let mut graph = ArchetypeGraph::new();
        let root = graph.get_or_create(&[]);
        let placeholder = EntityLocation {
            archetype: root,
            row: 0,
        };
        let mut locations = vec![placeholder; snapshot.slots.len()];
        let mut placed = vec![false; snapshot.slots.len()];

        for rows in &snapshot.archetypes {
            let id = graph.get_or_create(&rows.ids);
            for &entity in &rows.rows {
                entities.validate(entity).map_err(|_| {
                    Error::internal(format!("snapshot row names dead entity {entity:?}"))
                })?;
                if placed[entity.index as usize] {
                    return Err(Error::internal(format!(
                        "snapshot places entity {entity:?} twice"
                    )));
                }
                placed[entity.index as usize] = true;
                let row = graph
                    .archetype_mut(id)
                    .expect("freshly created archetype")
                    .push_entity(entity);
                locations[entity.index as usize] = EntityLocation {
                    archetype: id,
                    #[allow(clippy::cast_possible_truncation)]
                    row: row as u32,
                };
            }
        }

        for entity in entities.iter() {
            if !placed[entity.index as usize] {
                return Err(Error::internal(format!(
                    "snapshot never places live entity {entity:?}"
                )));
            }
        }

        let mut relations = RelationIndex::new();
        for &(source, relation, target) in &snapshot.edges {
            relations.link(source, relation, target);
        }

        Ok(World::from_parts(
            registry, entities, graph, relations, locations, root,
        ))
    }
}
