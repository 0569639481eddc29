//! Harbormaster Migration Library
//!
//! Handlers and templates behind the `harbormaster-migrate` binary. The
//! binary (main.rs) only parses arguments, resolves the configuration and
//! dispatches here.

pub mod commands;
pub mod template;
