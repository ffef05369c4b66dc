//! Cross-layer integration tests for Strata
//!
//! Tests that verify correct interaction between the storage and query
//! crates, and snapshot round-trips through an external serializer.
