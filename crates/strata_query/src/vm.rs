//! The matching VM: compiled plans evaluated against archetype shapes.
//!
//! A plan is an ordered list of tagged ops with a single dispatch point.
//! Simple and complex ops are presence tests against a sorted shape; wildcard
//! ops cannot be decided from the shape alone and are resolved per entity by
//! enumerating the entity's relationship targets. Queries without wildcard
//! terms never pay the per-entity cost.

use strata_foundation::{EntityId, Ident};
use strata_storage::RelationIndex;

use crate::term::{Term, TermClass, TermOp};

/// One compiled matching operation.
///
/// Ops are evaluated in plan order: All groups first (cheapest rejection),
/// then Not (typically decisive after one hit), then Any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchOp {
    /// Every plain id must be present in the shape.
    AllSimple(Vec<Ident>),
    /// Every concrete pair id must be present in the shape.
    AllComplex(Vec<Ident>),
    /// Every wildcard pair must resolve for the entity.
    AllWildcard(Vec<Ident>),
    /// No plain id may be present in the shape.
    NotSimple(Vec<Ident>),
    /// No concrete pair id may be present in the shape.
    NotComplex(Vec<Ident>),
    /// No wildcard pair may resolve for the entity.
    NotWildcard(Vec<Ident>),
    /// At least one disjunct must hold; no overlap with the All group.
    AnyNoAll(Vec<Ident>),
    /// The Any group shares an id with the All group: every shape that
    /// survived the All ops already satisfies the disjunction, so this op
    /// skips re-testing.
    AnyWithAll(Vec<Ident>),
}

/// An executable matching plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    /// Ops in evaluation order.
    ops: Vec<MatchOp>,
    /// True if any op requires per-entity resolution.
    has_entity_ops: bool,
}

impl Plan {
    /// Lowers a canonical term list into an executable plan.
    ///
    /// The input must already be canonicalized (All terms first, then Any,
    /// then Not, ids ascending within each group).
    #[must_use]
    pub(crate) fn lower(terms: &[Term]) -> Self {
        let mut all_simple = Vec::new();
        let mut all_complex = Vec::new();
        let mut all_wildcard = Vec::new();
        let mut not_simple = Vec::new();
        let mut not_complex = Vec::new();
        let mut not_wildcard = Vec::new();
        let mut any_ids = Vec::new();

        for term in terms {
            match (term.op, term.class()) {
                (TermOp::All, TermClass::Simple) => all_simple.push(term.id),
                (TermOp::All, TermClass::Complex) => all_complex.push(term.id),
                (TermOp::All, TermClass::Wildcard) => all_wildcard.push(term.id),
                (TermOp::Not, TermClass::Simple) => not_simple.push(term.id),
                (TermOp::Not, TermClass::Complex) => not_complex.push(term.id),
                (TermOp::Not, TermClass::Wildcard) => not_wildcard.push(term.id),
                (TermOp::Any, _) => any_ids.push(term.id),
            }
        }

        let any_overlaps_all = any_ids.iter().any(|id| {
            all_simple.contains(id) || all_complex.contains(id) || all_wildcard.contains(id)
        });

        let mut has_entity_ops = !all_wildcard.is_empty() || !not_wildcard.is_empty();

        let mut ops = Vec::new();
        if !all_simple.is_empty() {
            ops.push(MatchOp::AllSimple(all_simple));
        }
        if !all_complex.is_empty() {
            ops.push(MatchOp::AllComplex(all_complex));
        }
        if !all_wildcard.is_empty() {
            ops.push(MatchOp::AllWildcard(all_wildcard));
        }
        if !not_simple.is_empty() {
            ops.push(MatchOp::NotSimple(not_simple));
        }
        if !not_complex.is_empty() {
            ops.push(MatchOp::NotComplex(not_complex));
        }
        if !not_wildcard.is_empty() {
            ops.push(MatchOp::NotWildcard(not_wildcard));
        }
        if !any_ids.is_empty() {
            if any_overlaps_all {
                ops.push(MatchOp::AnyWithAll(any_ids));
            } else {
                has_entity_ops |= any_ids.iter().any(|id| id.is_wildcard());
                ops.push(MatchOp::AnyNoAll(any_ids));
            }
        }

        Self {
            ops,
            has_entity_ops,
        }
    }

    /// Returns the ops in evaluation order.
    #[must_use]
    pub fn ops(&self) -> &[MatchOp] {
        &self.ops
    }

    /// Returns true if any op requires per-entity resolution.
    #[must_use]
    pub fn has_entity_ops(&self) -> bool {
        self.has_entity_ops
    }

    /// Evaluates the shape-decidable portion of the plan.
    ///
    /// Wildcard ops cannot fail here; an archetype passing this test is a
    /// candidate whose entities are filtered by [`Plan::matches_entity`] when
    /// [`Plan::needs_entity_eval`] says so.
    #[must_use]
    pub fn matches(&self, shape: &[Ident]) -> bool {
        for op in &self.ops {
            let ok = match op {
                MatchOp::AllSimple(ids) | MatchOp::AllComplex(ids) => {
                    ids.iter().all(|id| contains(shape, *id))
                }
                MatchOp::NotSimple(ids) | MatchOp::NotComplex(ids) => {
                    !ids.iter().any(|id| contains(shape, *id))
                }
                MatchOp::AnyNoAll(ids) => {
                    ids.iter()
                        .any(|id| !id.is_wildcard() && contains(shape, *id))
                        || ids.iter().any(|id| id.is_wildcard())
                }
                MatchOp::AllWildcard(_) | MatchOp::NotWildcard(_) | MatchOp::AnyWithAll(_) => true,
            };
            if !ok {
                return false;
            }
        }
        true
    }

    /// Returns true if entities of a shape need individual evaluation.
    ///
    /// An Any group whose shape-decidable disjunct already holds for the
    /// whole archetype does not force per-entity work on its own.
    #[must_use]
    pub fn needs_entity_eval(&self, shape: &[Ident]) -> bool {
        self.ops.iter().any(|op| match op {
            MatchOp::AllWildcard(_) | MatchOp::NotWildcard(_) => true,
            MatchOp::AnyNoAll(ids) => {
                ids.iter().any(|id| id.is_wildcard())
                    && !ids
                        .iter()
                        .any(|id| !id.is_wildcard() && contains(shape, *id))
            }
            _ => false,
        })
    }

    /// Evaluates the per-entity portion of the plan.
    ///
    /// Only meaningful for entities of an archetype that already passed
    /// [`Plan::matches`]; shape-decidable ops are not re-evaluated.
    #[must_use]
    pub fn matches_entity(
        &self,
        shape: &[Ident],
        relations: &RelationIndex,
        entity: EntityId,
    ) -> bool {
        for op in &self.ops {
            let ok = match op {
                MatchOp::AllWildcard(ids) => {
                    ids.iter().all(|id| resolve(*id, relations, entity))
                }
                MatchOp::NotWildcard(ids) => {
                    !ids.iter().any(|id| resolve(*id, relations, entity))
                }
                MatchOp::AnyNoAll(ids) => {
                    ids.iter()
                        .any(|id| !id.is_wildcard() && contains(shape, *id))
                        || ids
                            .iter()
                            .any(|id| id.is_wildcard() && resolve(*id, relations, entity))
                }
                _ => true,
            };
            if !ok {
                return false;
            }
        }
        true
    }
}

/// Presence test against a sorted shape.
fn contains(shape: &[Ident], id: Ident) -> bool {
    shape.binary_search(&id).is_ok()
}

/// Resolves a wildcard pair against an entity's relationship targets.
fn resolve(pair: Ident, relations: &RelationIndex, entity: EntityId) -> bool {
    match (pair.relation(), pair.target()) {
        // (rel, *): any target for the relation.
        (Some(rel), None) => relations.has_any_target(entity, rel),
        // (*, target): any relation pointing at the target.
        (None, Some(target)) => relations
            .relations(entity)
            .any(|(_, targets)| targets.iter().any(|t| t.index == target)),
        // (*, *): any relationship at all.
        (None, None) => relations.has_any_relation(entity),
        // Concrete pairs are shape-decidable and never reach wildcard ops.
        (Some(rel), Some(target)) => relations
            .targets(entity, rel)
            .iter()
            .any(|t| t.index == target),
    }
}
