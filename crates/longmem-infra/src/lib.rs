//! Infrastructure layer for longmem.
//!
//! Implements the ports defined in `longmem-core`: object stores backed by the
//! DIAL file API, the local filesystem, or process memory, and a local
//! fastembed text embedder. Also loads `config.toml` from the data directory.

pub mod config;
pub mod storage;
pub mod vector;
