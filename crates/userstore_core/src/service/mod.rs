//! Core use-case services.
//!
//! # Responsibility
//! - Validate caller input before anything touches storage.
//! - Orchestrate gateway calls and re-wrap lower-layer failures.

pub mod user_service;
