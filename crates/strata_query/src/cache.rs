//! The query cache: compiled plans plus incrementally maintained match lists.
//!
//! Entries are keyed by canonical lookup hash, with exact canonical-term
//! comparison inside a bucket. A freshly compiled query scans every existing
//! archetype once; afterwards [`QueryCache::sync`] evaluates only archetypes
//! created since the last sync, so iteration cost stays proportional to
//! matching archetypes rather than to all archetypes ever created.

use std::collections::HashMap;

use strata_foundation::Result;
use strata_storage::{Archetype, ArchetypeId, World};

use crate::compile::{CompiledQuery, canonicalize};
use crate::term::{Term, TermOp};

/// Handle to a cached query.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryId(u32);

impl QueryId {
    /// Returns the raw cache index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// One cached query: compiled form, match list, and column remaps.
#[derive(Clone, Debug)]
pub struct QueryInfo {
    /// The compiled query.
    query: CompiledQuery,
    /// Matching archetypes in append order. `im::Vector` so a pass can
    /// snapshot the list in O(1).
    matched: im::Vector<ArchetypeId>,
    /// Per-archetype column remap: canonical term position -> storage column
    /// index. `None` for Not terms, wildcard terms, and absent Any terms.
    remaps: HashMap<ArchetypeId, Vec<Option<u32>>>,
}

impl QueryInfo {
    fn new(query: CompiledQuery) -> Self {
        Self {
            query,
            matched: im::Vector::new(),
            remaps: HashMap::new(),
        }
    }

    /// Returns the compiled query.
    #[must_use]
    pub fn query(&self) -> &CompiledQuery {
        &self.query
    }

    /// Returns matching archetypes in append order.
    #[must_use]
    pub fn matched(&self) -> &im::Vector<ArchetypeId> {
        &self.matched
    }

    /// Returns the memoized column remap for a matched archetype.
    #[must_use]
    pub fn remap(&self, archetype: ArchetypeId) -> Option<&[Option<u32>]> {
        self.remaps.get(&archetype).map(Vec::as_slice)
    }

    /// Evaluates one archetype and records it on match.
    fn consider(&mut self, archetype: &Archetype) {
        if !self.query.plan().matches(archetype.ids()) {
            return;
        }
        let remap = self
            .query
            .terms()
            .iter()
            .map(|term| {
                if term.op == TermOp::Not || term.id.is_wildcard() {
                    None
                } else {
                    archetype.column_index(term.id).map(|column| {
                        u32::try_from(column).expect("column index out of range")
                    })
                }
            })
            .collect();
        self.remaps.insert(archetype.id(), remap);
        self.matched.push_back(archetype.id());
    }

    /// Drops archetypes the graph no longer knows.
    ///
    /// Stale references are recovered here, locally; unrelated match-list
    /// entries keep their positions and append order.
    fn drop_stale(&mut self, world: &World) {
        let graph = world.graph();
        if self
            .matched
            .iter()
            .all(|&id| graph.archetype(id).is_some())
        {
            return;
        }
        self.matched = self
            .matched
            .iter()
            .copied()
            .filter(|&id| graph.archetype(id).is_some())
            .collect();
        self.remaps.retain(|id, _| graph.archetype(*id).is_some());
    }
}

/// World-scoped cache of compiled queries.
///
/// A cache belongs to one world; its lifecycle is tied to that world's
/// construction and teardown so multiple worlds stay independent.
#[derive(Clone, Debug, Default)]
pub struct QueryCache {
    /// Cached entries, indexed by `QueryId`.
    entries: Vec<QueryInfo>,
    /// Lookup hash -> entries with that hash.
    by_hash: HashMap<u64, Vec<QueryId>>,
    /// Archetype handles below this bound have been evaluated.
    watermark: u32,
    /// Last observed graph prune epoch.
    epoch: u64,
    /// Number of plan compilations (cache misses).
    compiles: u64,
}

impl QueryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached entry for a term list, compiling on first sight.
    ///
    /// Semantically equal term lists, regardless of user order, share one
    /// entry; the compile counter does not advance on a hit.
    ///
    /// # Errors
    ///
    /// Returns an error if the term list is invalid; nothing is cached then.
    pub fn get_or_compile(&mut self, terms: &[Term], world: &World) -> Result<QueryId> {
        let canonical = canonicalize(terms, world.registry())?;

        // Keep the cache current before the new entry's full scan so both
        // observe the same graph state.
        self.sync(world);

        if let Some(bucket) = self.by_hash.get(&canonical.hash) {
            for &id in bucket {
                // Hash collisions are resolved by exact canonical comparison.
                if self.entries[id.index() as usize].query.canonical() == &canonical {
                    return Ok(id);
                }
            }
        }

        let hash = canonical.hash;
        let mut info = QueryInfo::new(CompiledQuery::from_canonical(canonical));
        self.compiles += 1;

        for archetype in world.graph().iter() {
            info.consider(archetype);
        }

        let id = QueryId(u32::try_from(self.entries.len()).expect("too many cached queries"));
        self.entries.push(info);
        self.by_hash.entry(hash).or_default().push(id);
        Ok(id)
    }

    /// Catches the cache up with the world's archetype graph.
    ///
    /// Archetypes created since the last sync are evaluated against every
    /// live entry and appended to match lists on match. If the graph's prune
    /// epoch advanced, stale references are dropped from match lists first.
    pub fn sync(&mut self, world: &World) {
        let graph = world.graph();

        if graph.epoch() != self.epoch {
            for info in &mut self.entries {
                info.drop_stale(world);
            }
            self.epoch = graph.epoch();
        }

        if self.watermark < graph.handle_bound() {
            for archetype in graph.created_since(self.watermark) {
                for info in &mut self.entries {
                    info.consider(archetype);
                }
            }
            self.watermark = graph.handle_bound();
        }
    }

    /// Returns a cached entry.
    #[must_use]
    pub fn info(&self, id: QueryId) -> Option<&QueryInfo> {
        self.entries.get(id.index() as usize)
    }

    /// Returns the number of plan compilations performed so far.
    #[must_use]
    pub fn compile_count(&self) -> u64 {
        self.compiles
    }

    /// Returns the number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no queries are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry. Existing [`QueryId`]s become invalid.
    ///
    /// This is the explicit invalidation hook for world reset or teardown.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
        self.by_hash.clear();
        self.watermark = 0;
        self.epoch = 0;
    }
}
