//! Board domain model.
//!
//! # Responsibility
//! - Define the persisted records shared by ordering, lifecycle and
//!   enrichment logic.
//! - Define the canonical board snapshot built from those records.
//!
//! # Invariants
//! - Every note and category is identified by a stable UUID.
//! - Ephemeral interaction state (delete confirmation, drag, in-flight
//!   fetches) never lives on these records.

pub mod board;
pub mod category;
pub mod note;
