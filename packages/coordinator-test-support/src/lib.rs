//! Coordinator test support utilities
//!
//! Shared helpers for the coordinator's integration tests. Currently this is
//! the unified logging initializer, so every test binary filters and captures
//! tracing output the same way.

pub mod logging;
