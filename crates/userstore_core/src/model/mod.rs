//! Domain model for the user store.
//!
//! # Responsibility
//! - Define the canonical `User` record shared by every layer.
//!
//! # Invariants
//! - `id` is store-assigned and never reused for another user.
//! - A `User` handed to the persistence gateway has already passed
//!   service-layer validation.

pub mod user;
