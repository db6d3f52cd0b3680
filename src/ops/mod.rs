//! High-level operations.

pub mod link;

pub use link::{link, link_script, LinkOptions};
