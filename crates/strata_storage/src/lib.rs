//! Archetype graph, entity storage, relationships, and world state for Strata.
//!
//! This crate provides:
//! - [`EntityStore`] - Generational entity allocation
//! - [`Archetype`] / [`ArchetypeGraph`] - The universe of observed shapes and
//!   memoized structural transitions between them
//! - [`RelationIndex`] - Bidirectional relationship edges
//! - [`World`] - The unified mutable façade over all of the above
//! - [`WorldSnapshot`] - Plain-data capture/restore of world state

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod archetype;
mod entity;
mod graph;
mod relation;
mod snapshot;
mod world;

pub use archetype::{Archetype, ArchetypeId, CHUNK_CAPACITY, Chunk};
pub use entity::EntityStore;
pub use graph::{ArchetypeGraph, Transition};
pub use relation::RelationIndex;
pub use snapshot::{ArchetypeRows, ComponentDef, WorldSnapshot};
pub use world::{IterationGuard, World};
