//! # Heapscope
//!
//! Command-line front end of the native object view.
//!
//! The library target exposes the CLI, configuration and rendering so the
//! binary stays a thin entry point and integration tests can drive commands
//! directly.

pub mod cli;
pub mod config;
pub mod render;
