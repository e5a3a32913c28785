//! Durable storage abstractions.
//!
//! Defines the path-keyed object store trait and its type-erased wrapper.
//! Implementations live in longmem-infra.

pub mod box_object_store;
pub mod object_store;
