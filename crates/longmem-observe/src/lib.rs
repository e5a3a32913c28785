//! Observability setup for longmem: structured logging plus optional
//! OpenTelemetry span export.

pub mod tracing_setup;
