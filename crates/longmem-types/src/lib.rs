//! Shared domain types for the long-term memory store.
//!
//! This crate contains the data model persisted per user (Memory,
//! MemoryCollection), the caller-facing projection (MemoryData), the
//! configuration types, and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod memory;
