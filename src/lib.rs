//! Strata - Archetype-indexed entity storage with compiled, cached queries
//!
//! This crate re-exports all layers of the Strata system for convenient
//! access. For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: strata_query      — Term compiler, matching VM, query cache,
//!                              batch enumeration
//! Layer 1: strata_storage    — Archetype graph, entity store, relationships,
//!                              world state, snapshots
//! Layer 0: strata_foundation — Core types (EntityId, Ident, Error)
//! ```

pub use strata_foundation as foundation;
pub use strata_query as query;
pub use strata_storage as storage;
