//! Domain model for hospital-sim content integration.
//!
//! # Responsibility
//! - Define the canonical entity records shared by every pipeline stage.
//! - Keep one graph shape so stages stay composable and independently testable.
//!
//! # Invariants
//! - Every entity is identified by a curator-chosen stable `EntityId`.
//! - Entities are only created by loading, merged by resolution, and removed
//!   by reassignment or pruning; no other pass mutates the graph.

pub mod entity;
pub mod graph;
pub mod package;
