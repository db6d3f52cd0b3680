//! Link error types and diagnostics.
//!
//! Every failure in a configuration pass is fail-fast: the pass is
//! deterministic and re-run from scratch, so nothing here is retryable.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::phase::PassPhase;
use crate::util::diagnostic::Diagnostic;

/// Result alias used throughout the model, engine and linker.
pub type LinkResult<T> = Result<T, LinkError>;

/// Error raised while building or linking a declarative model.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum LinkError {
    #[error("cannot add {requested} target `{name}`: a {existing} target with that name already exists")]
    #[diagnostic(code(unify::model::naming_collision))]
    NamingCollision {
        name: String,
        existing: String,
        requested: String,
    },

    #[error("invalid target name `{name}`: {reason}")]
    #[diagnostic(code(unify::model::invalid_name))]
    InvalidTargetName { name: String, reason: String },

    #[error("{owner} cannot be used after a binding on it failed")]
    #[diagnostic(code(unify::model::poisoned))]
    Poisoned { owner: String },

    #[error("property `{property}` of {owner} is required but was never set")]
    #[diagnostic(code(unify::link::missing_property))]
    MissingRequiredProperty { property: String, owner: String },

    #[error("{owner} has no property `{property}`")]
    #[diagnostic(code(unify::model::unsupported_property))]
    UnsupportedProperty { property: String, owner: String },

    #[error("scope `{scope}` cannot be wired into {owner}: {reason}")]
    #[diagnostic(code(unify::link::invalid_scope))]
    InvalidScopeWiring {
        scope: String,
        owner: String,
        reason: String,
    },

    #[error("{operation} is not allowed while the pass is {phase}")]
    #[diagnostic(code(unify::link::ordering_violation))]
    OrderingViolation { operation: String, phase: PassPhase },

    #[error("extension `{0}` is already registered")]
    #[diagnostic(code(unify::engine::duplicate_extension))]
    DuplicateExtension(String),

    #[error("no extension named `{0}`")]
    #[diagnostic(code(unify::engine::unknown_extension))]
    UnknownExtension(String),

    #[error("no dependency bucket named `{0}`")]
    #[diagnostic(code(unify::engine::unknown_bucket))]
    UnknownBucket(String),

    #[error("no compile target named `{0}`")]
    #[diagnostic(code(unify::toolchain::unknown_target))]
    UnknownCompileTarget(String),

    #[error("software type `{0}` is not registered")]
    #[diagnostic(code(unify::host::unknown_software_type))]
    UnknownSoftwareType(String),

    #[error("build unit `{unit}` already has a `{existing}` model")]
    #[diagnostic(code(unify::host::duplicate_build_unit))]
    DuplicateBuildUnit { unit: String, existing: String },

    #[error("invalid dependency notation `{0}`")]
    #[diagnostic(
        code(unify::model::invalid_notation),
        help("use `group:name[:version]` or a project path such as `:core`")
    )]
    InvalidNotation(String),
}

impl LinkError {
    /// Build an ordering violation for `operation` attempted in `phase`.
    pub fn ordering(operation: impl Into<String>, phase: PassPhase) -> Self {
        LinkError::OrderingViolation {
            operation: operation.into(),
            phase,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            LinkError::NamingCollision {
                name,
                existing,
                requested,
            } => Diagnostic::error(format!("target `{}` is declared twice", name))
                .with_context(format!("first declared as a {} target", existing))
                .with_context(format!("then requested as a {} target", requested))
                .with_suggestion(format!("Rename one of the `{}` targets", name)),

            LinkError::MissingRequiredProperty { property, owner } => {
                Diagnostic::error(format!("`{}` was never set", property))
                    .with_context(format!("required by {}", owner))
                    .with_suggestion(format!("Set `{}` in the build script", property))
            }

            LinkError::InvalidScopeWiring {
                scope,
                owner,
                reason,
            } => Diagnostic::error(format!("cannot use the `{}` scope here", scope))
                .with_context(format!("{}: {}", owner, reason))
                .with_suggestion("Declare the dependency as `implementation` instead"),

            LinkError::InvalidTargetName { name, reason } => {
                Diagnostic::error(format!("target name `{}` cannot be used", name))
                    .with_context(reason.clone())
                    .with_suggestion("Pick a non-empty name that no source set already uses")
            }

            LinkError::OrderingViolation { operation, phase } => {
                Diagnostic::error(format!("{} happened too late", operation))
                    .with_context(format!("the configuration pass is already {}", phase))
            }

            other => Diagnostic::error(other.to_string()),
        }
    }
}
