//! Persistence gateway abstractions and SQLite implementation.
//!
//! # Responsibility
//! - Define the data-access contract consumed by the service layer.
//! - Isolate SQL and transaction details from business orchestration.
//!
//! # Invariants
//! - Every write operation runs inside exactly one transaction that is
//!   committed on success and rolled back on any failure.
//! - Gateway errors carry a fixed description of the failed operation;
//!   the low-level cause stays attached for diagnostics only.

pub mod user_repo;
