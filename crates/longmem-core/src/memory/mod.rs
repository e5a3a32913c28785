//! Long-term memory: embedding port, cache, persistence, similarity search,
//! deduplication, and the service facade that ties them together.

pub mod cache;
pub mod dedup;
pub mod embedder;
pub mod index;
pub mod repository;
pub mod service;
pub mod tools;
