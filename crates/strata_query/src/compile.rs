//! Term canonicalization and query compilation.
//!
//! Canonicalization is the mechanism behind cache-hit sharing: equivalent
//! term lists, in whatever order the user supplied them, sort to one
//! canonical form and therefore one lookup hash.

use strata_foundation::{
    ComponentRegistry, Error, Ident, Result, hash_combine, mix_hash,
};

use crate::term::{Access, MAX_QUERY_TERMS, Term, TermOp};
use crate::vm::Plan;

/// A term list in canonical form, plus its lookup hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CanonicalTerms {
    /// Terms sorted All < Any < Not, ids ascending within each group.
    pub terms: Vec<Term>,
    /// User term position -> canonical position.
    pub remap: Vec<u8>,
    /// Canonical 64-bit lookup hash.
    pub hash: u64,
}

/// Validates and canonicalizes a user term list.
pub(crate) fn canonicalize(
    terms: &[Term],
    registry: &ComponentRegistry,
) -> Result<CanonicalTerms> {
    if terms.is_empty() {
        return Err(Error::empty_query());
    }
    if terms.len() > MAX_QUERY_TERMS {
        return Err(Error::too_many_terms(terms.len(), MAX_QUERY_TERMS));
    }

    for term in terms {
        validate_id(term.id, registry)?;
    }

    // Stable canonical order: op group, then id, original position breaking
    // ties so sorting is deterministic.
    let mut order: Vec<usize> = (0..terms.len()).collect();
    order.sort_by_key(|&i| (terms[i].op, terms[i].id, i));

    let canonical: Vec<Term> = order.iter().map(|&i| terms[i]).collect();
    let mut remap = vec![0u8; terms.len()];
    for (position, &user_index) in order.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        {
            remap[user_index] = position as u8;
        }
    }

    // Duplicates are adjacent after sorting.
    for window in canonical.windows(2) {
        if window[0].op == window[1].op && window[0].id == window[1].id {
            return Err(Error::duplicate_term(window[0].id));
        }
    }

    // An id may not be both required (All/Any) and forbidden (Not).
    for not_term in canonical.iter().filter(|t| t.op == TermOp::Not) {
        if canonical
            .iter()
            .any(|t| t.op != TermOp::Not && t.id == not_term.id)
        {
            return Err(Error::conflicting_term(not_term.id));
        }
    }

    let hash = lookup_hash(&canonical);
    Ok(CanonicalTerms {
        terms: canonical,
        remap,
        hash,
    })
}

fn validate_id(id: Ident, registry: &ComponentRegistry) -> Result<()> {
    if let Some(component) = id.component_id() {
        if !registry.contains(component) {
            return Err(Error::id_not_found(id));
        }
        return Ok(());
    }
    // Pair: a concrete relation slot must name a registered relation. Pair
    // targets are entity ids and are not existence-checked here.
    if let Some(relation) = id.relation() {
        if !registry.contains(relation) {
            return Err(Error::id_not_found(id));
        }
        if !registry.is_relation(relation) {
            return Err(Error::not_a_relation(relation));
        }
    }
    Ok(())
}

fn lookup_hash(canonical: &[Term]) -> u64 {
    let mut hash = 0u64;
    for term in canonical {
        hash = hash_combine(hash, term.op as u64);
        hash = hash_combine(hash, term.id.value());
    }
    hash = hash_combine(hash, canonical.len() as u64);

    let mut write_mask = 0u64;
    for (position, term) in canonical.iter().enumerate() {
        if term.access == Access::Write {
            write_mask |= 1 << position;
        }
    }
    mix_hash(hash_combine(hash, write_mask))
}

/// A compiled query: canonical terms plus the executable matching plan.
#[derive(Clone, Debug)]
pub struct CompiledQuery {
    canonical: CanonicalTerms,
    plan: Plan,
}

impl CompiledQuery {
    pub(crate) fn from_canonical(canonical: CanonicalTerms) -> Self {
        let plan = Plan::lower(&canonical.terms);
        Self { canonical, plan }
    }

    /// Returns the terms in canonical order.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.canonical.terms
    }

    /// Maps a user term position to its canonical position.
    #[must_use]
    pub fn canonical_position(&self, user_index: usize) -> Option<usize> {
        self.canonical.remap.get(user_index).map(|&p| p as usize)
    }

    /// Returns the canonical lookup hash.
    #[must_use]
    pub fn lookup_hash(&self) -> u64 {
        self.canonical.hash
    }

    /// Returns the executable matching plan.
    #[must_use]
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub(crate) fn canonical(&self) -> &CanonicalTerms {
        &self.canonical
    }
}

/// Compiles a term list against a registry.
///
/// # Errors
///
/// Rejects empty term lists, term counts over [`MAX_QUERY_TERMS`], duplicate
/// terms within one kind, ids in conflicting kinds, and ids unknown to the
/// registry. Nothing is cached on error.
pub fn compile(terms: &[Term], registry: &ComponentRegistry) -> Result<CompiledQuery> {
    Ok(CompiledQuery::from_canonical(canonicalize(terms, registry)?))
}
