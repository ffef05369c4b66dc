//! Query compilation, matching, and caching over Strata archetypes.
//!
//! This crate provides:
//! - [`Term`] - One query clause (All/Any/Not over an id, pair, or wildcard)
//! - [`CompiledQuery`] / [`compile`] - Canonicalization and plan lowering
//! - [`Plan`] - The matching VM evaluated against archetype shapes
//! - [`QueryCache`] - Cached compiled queries with incremental match lists
//! - [`Queries`] / [`Pass`] - The world-scoped front end yielding chunk
//!   batches

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod cache;
mod compile;
mod iter;
mod queries;
mod term;
mod vm;

pub use cache::{QueryCache, QueryId, QueryInfo};
pub use compile::{CompiledQuery, compile};
pub use iter::{Batch, Batches, Pass};
pub use queries::Queries;
pub use term::{Access, MAX_QUERY_TERMS, Term, TermClass, TermOp};
pub use vm::{MatchOp, Plan};
