//! Toolchain plugins.
//!
//! A toolchain plugin owns the compile targets the linker wires the model
//! into. The linker only relies on two call shapes: "declare a compile target
//! named N on platform P" and "give me the default buckets of target N".

pub mod multiplatform;

use crate::core::error::LinkResult;
use crate::engine::Project;

pub use multiplatform::{
    CompileTarget, LanguageSettings, MultiplatformExtension, MultiplatformPlugin, Platform,
    SourceSet,
};

/// A plugin that can be applied to a [`Project`].
pub trait ToolchainPlugin {
    /// Stable identifier, e.g. `org.jetbrains.kotlin.multiplatform`.
    fn id(&self) -> &'static str;

    /// Register the plugin's extensions and conventions on `project`.
    fn apply(&self, project: &Project) -> LinkResult<()>;
}
