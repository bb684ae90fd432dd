//! Domain model for the polymorphic item system and the gamification engine.
//!
//! # Responsibility
//! - Define the generic `Item` envelope and the six specialized records.
//! - Define the payload sum types consumed by the dispatch surface.
//! - Define the level ledger, level curve, and achievement model.
//!
//! # Invariants
//! - Every user-visible object is one `Item` plus exactly one specialized
//!   record of the matching type.
//! - Deletion is represented by soft-delete tombstones, not hard delete.

pub mod gamification;
pub mod item;
pub mod payload;
pub mod record;
