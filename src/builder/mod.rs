//! Builder API for ergonomic host construction.
//!
//! This module provides a fluent builder for configuring hosts and macros
//! for declaring state sets and event vocabularies.

pub mod host;
pub mod macros;

pub use host::HostBuilder;
