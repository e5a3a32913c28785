//! Object store implementations for memory snapshots.
//!
//! - [`dial::DialObjectStore`]: the DIAL file API, the production backend.
//! - [`filesystem::FilesystemObjectStore`]: a directory tree on local disk.
//! - [`memory::InMemoryObjectStore`]: a process-local map for tests and demos.

pub mod dial;
pub mod filesystem;
pub mod memory;
