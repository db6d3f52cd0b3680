//! Core data structures.
//!
//! This module contains the declarative model and its building blocks:
//! - Lazy properties and the pass phase guard
//! - The named variant collection holding targets
//! - Dependencies and dependency scopes
//! - Build scripts that populate a model

pub mod collection;
pub mod dependency;
pub mod error;
pub mod model;
pub mod phase;
pub mod property;
pub mod script;
pub mod target;

pub use collection::{Variant, VariantCollection};
pub use dependency::{Dependency, DependencyCollector, DependencyScopes, ScopeName};
pub use error::{LinkError, LinkResult};
pub use model::{DeclarativeModel, ModelKind, SoftwareType};
pub use phase::{PassPhase, PhaseGuard};
pub use property::LazyProperty;
pub use script::BuildScript;
pub use target::{ScriptEnvironment, Target, TargetKind, TargetSettings};
