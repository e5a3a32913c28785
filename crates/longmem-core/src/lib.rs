//! Memory store engine for the long-term memory service.
//!
//! This crate defines the "ports" (embedder and object store traits) that the
//! infrastructure layer implements, plus everything that runs on top of them:
//! the collection cache, the snapshot persistence layer, the exact similarity
//! index, the deduplication engine, and the `MemoryService` facade. It depends
//! only on `longmem-types` -- never on `longmem-infra` or any network/IO crate.

pub mod memory;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;
