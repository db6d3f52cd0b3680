//! Unify - declarative multi-target build models linked to an imperative engine
//!
//! This crate provides a typed, declarative model for application and
//! library builds spanning JVM, script-engine and native targets, and the
//! linker that binds that model to a build-configuration engine and a
//! multiplatform toolchain within a single configuration pass.

pub mod core;
pub mod engine;
pub mod host;
pub mod link;
pub mod ops;
pub mod toolchain;
pub mod util;

pub use crate::core::{
    dependency::Dependency, error::LinkError, error::LinkResult, model::DeclarativeModel,
    model::ModelKind, script::BuildScript, target::Target, target::TargetKind,
};

pub use host::{BoundConfiguration, CompositionHost, ConfigurationPass};
pub use util::config::Config;
