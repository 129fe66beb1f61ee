//! Infrastructure adapters and process plumbing.

pub mod error;
pub mod memory;
pub mod telemetry;
