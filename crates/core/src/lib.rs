//! Hook registry, configuration loading, and execution engine for Hookwork.
//!
//! This crate contains the host-independent logic consumed by the CLI and by
//! editor integrations: hooks are configured in settings or a workspace file,
//! registered per lifecycle event, and executed as external processes with
//! ordered, abort-on-failure semantics.

pub mod config;
pub mod env;
pub mod hooks;

pub use config::Settings;
