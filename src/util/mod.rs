//! Shared utilities

pub mod config;
pub mod diagnostic;

pub use config::{Config, ToolchainSettings};
pub use diagnostic::Diagnostic;
