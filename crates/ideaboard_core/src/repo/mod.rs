//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the board storage contract consumed by the controller.
//! - Isolate SQLite query details from board orchestration.
//!
//! # Invariants
//! - Repositories store whole snapshots; partial boards are never written.
//! - Persisted lane order equals the in-memory lane order.

pub mod board_repo;
