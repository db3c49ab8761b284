//! cocorestore CLI library.
//!
//! The binary in `main.rs` is a thin argument-parsing shell; the actual
//! restore pipeline lives here so integration tests can drive it with a
//! deterministic fetcher.

pub mod output;
pub mod restore;
