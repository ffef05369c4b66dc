//! The world-scoped query front object.

use strata_foundation::{Error, Result};
use strata_storage::World;

use crate::cache::{QueryCache, QueryId};
use crate::iter::Pass;
use crate::term::Term;

/// Query state for one world.
///
/// `Queries` bundles the query cache and the enumeration entry points. It is
/// constructed per world, never shared between worlds, so worlds stay
/// independent and testable in isolation. Keep it alongside the `World` it
/// serves and drop the two together.
#[derive(Clone, Debug, Default)]
pub struct Queries {
    cache: QueryCache,
}

impl Queries {
    /// Creates an empty query front for one world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle for a term list, compiling it on first sight.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid term lists; nothing is cached then.
    pub fn query(&mut self, world: &World, terms: &[Term]) -> Result<QueryId> {
        self.cache.get_or_compile(terms, world)
    }

    /// Starts a pass over a cached query's matches.
    ///
    /// Syncs the cache with the world's archetype graph first, so the pass
    /// observes every archetype created or pruned since the last pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle does not name a cached query (e.g.
    /// after [`Queries::invalidate_all`]).
    pub fn pass<'a>(&'a mut self, world: &'a World, query: QueryId) -> Result<Pass<'a>> {
        self.cache.sync(world);
        let info = self
            .cache
            .info(query)
            .ok_or_else(|| Error::internal(format!("unknown query handle {query:?}")))?;
        Ok(Pass::new(world, info))
    }

    /// Returns the number of plan compilations performed so far.
    #[must_use]
    pub fn compile_count(&self) -> u64 {
        self.cache.compile_count()
    }

    /// Returns the underlying cache.
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Drops every cached query. Existing handles become invalid.
    ///
    /// Call on world reset or teardown.
    pub fn invalidate_all(&mut self) {
        self.cache.invalidate_all();
    }
}
